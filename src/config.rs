use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::constants::generator::{
    DEFAULT_IDENTIFIER_FIELD, DEFAULT_MAX_RECORD_MODIFICATIONS, DEFAULT_MAX_STALLED_ROUNDS,
    DEFAULT_SELECTION_RETRY_LIMIT, DEFAULT_UNIQUENESS_ATTEMPTS,
};
use crate::domain::CharRange;
use crate::errors::GeneratorError;
use crate::types::FieldName;

/// Kind of character-level error an operator injects.
///
/// Only insertion is modeled today; sibling kinds slot in here and in
/// [`crate::operators::OperatorSet`] without touching selection or budgeting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModificationKind {
    /// Add one character at a chosen position.
    Insert,
}

/// Per-field configuration consumed by the generator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    /// Character category used when drawing inserted characters.
    pub char_range: CharRange,
    /// Relative probability of choosing this field for modification.
    pub select_prob: f64,
    /// Maximum successful modifications on this field within one duplicate.
    pub max_num_field_modifi: usize,
    /// Weighted list of supported modification kinds.
    pub prob_list: Vec<(ModificationKind, f64)>,
}

impl FieldSpec {
    /// Convenience constructor for a field that only supports insertion.
    pub fn insert_only(
        char_range: CharRange,
        select_prob: f64,
        max_num_field_modifi: usize,
    ) -> Self {
        Self {
            char_range,
            select_prob,
            max_num_field_modifi,
            prob_list: vec![(ModificationKind::Insert, 1.0)],
        }
    }
}

/// Ordered field probability table (`field name -> FieldSpec`).
///
/// Order is significant: weighted draws walk fields in table order, so the
/// same table and seed always reproduce the same choices.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldTable {
    fields: IndexMap<FieldName, FieldSpec>,
}

impl FieldTable {
    /// Empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add (or replace) a field with an already-typed spec.
    pub fn with_field(mut self, name: impl Into<FieldName>, spec: FieldSpec) -> Self {
        self.fields.insert(name.into(), spec);
        self
    }

    /// Add a field whose character category is still an untyped label.
    ///
    /// Unknown labels fail with [`GeneratorError::UnknownDomain`] rather than
    /// falling back to some default alphabet.
    pub fn insert_declared(
        &mut self,
        name: impl Into<FieldName>,
        category: &str,
        select_prob: f64,
        max_num_field_modifi: usize,
        prob_list: Vec<(ModificationKind, f64)>,
    ) -> Result<(), GeneratorError> {
        let name = name.into();
        let char_range = CharRange::resolve(&name, category)?;
        self.fields.insert(
            name,
            FieldSpec {
                char_range,
                select_prob,
                max_num_field_modifi,
                prob_list,
            },
        );
        Ok(())
    }

    /// Spec for `name`, if configured.
    pub fn get(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.get(name)
    }

    /// Fields in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&FieldName, &FieldSpec)> {
        self.fields.iter()
    }

    /// Number of configured fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when no field is configured.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Sum of per-field caps over fields that can actually be selected.
    pub fn selectable_capacity(&self) -> usize {
        self.fields
            .values()
            .filter(|spec| spec.select_prob > 0.0)
            .map(|spec| spec.max_num_field_modifi)
            .sum()
    }

    /// Check the consumption contract against a record-level budget.
    pub fn validate(
        &self,
        max_num_record_modifi: usize,
        selection: SelectionStrategy,
    ) -> Result<(), GeneratorError> {
        if self.fields.is_empty() {
            return Err(GeneratorError::Configuration(
                "field table is empty".to_string(),
            ));
        }
        for (name, spec) in &self.fields {
            if !spec.select_prob.is_finite() || spec.select_prob < 0.0 {
                return Err(GeneratorError::Configuration(format!(
                    "field '{name}' has invalid selection probability {}",
                    spec.select_prob
                )));
            }
            if spec.max_num_field_modifi == 0 {
                return Err(GeneratorError::Configuration(format!(
                    "field '{name}' allows zero modifications"
                )));
            }
            if spec.prob_list.is_empty() {
                return Err(GeneratorError::Configuration(format!(
                    "field '{name}' lists no modification kinds"
                )));
            }
            if spec
                .prob_list
                .iter()
                .any(|(_, prob)| !prob.is_finite() || *prob < 0.0)
                || spec.prob_list.iter().map(|(_, prob)| prob).sum::<f64>() <= 0.0
            {
                return Err(GeneratorError::Configuration(format!(
                    "field '{name}' has invalid modification probabilities"
                )));
            }
        }
        if self.fields.values().all(|spec| spec.select_prob <= 0.0) {
            return Err(GeneratorError::Configuration(
                "no field has a positive selection probability".to_string(),
            ));
        }
        let capacity = self.selectable_capacity();
        if capacity < max_num_record_modifi {
            match selection {
                SelectionStrategy::RetryUntilEligible { .. } => {
                    return Err(GeneratorError::Configuration(format!(
                        "field caps sum to {capacity}, below the record budget of {max_num_record_modifi}"
                    )));
                }
                SelectionStrategy::EligibleOnly => {
                    warn!(
                        capacity,
                        max_num_record_modifi,
                        "field caps cannot fill the record budget; generation will exhaust"
                    );
                }
            }
        }
        Ok(())
    }
}

/// How the field selector handles fields already at their cap.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SelectionStrategy {
    /// Draw from the full table and redraw on exhausted fields, at most `max_retries` draws.
    RetryUntilEligible {
        /// Draw ceiling before failing with `SelectionExhausted`.
        max_retries: usize,
    },
    /// Draw directly from the renormalized distribution over non-exhausted fields.
    EligibleOnly,
}

impl Default for SelectionStrategy {
    fn default() -> Self {
        SelectionStrategy::RetryUntilEligible {
            max_retries: DEFAULT_SELECTION_RETRY_LIMIT,
        }
    }
}

/// Whether the planned per-field count is clamped to the remaining record budget.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum BudgetClamp {
    /// Plan `1..=max_num_field_modifi` regardless of the record budget.
    #[default]
    Unclamped,
    /// Cap the planned count at `max_num_record_modifi - num_modif_in_record`.
    ClampToRemaining,
}

/// Top-level generator configuration.
#[derive(Clone, Debug)]
pub struct GeneratorConfig {
    /// RNG seed that controls deterministic generation.
    pub seed: u64,
    /// Successful modifications required in every duplicate.
    pub max_num_record_modifi: usize,
    /// Field selection strategy.
    pub selection: SelectionStrategy,
    /// Planner clamp policy.
    pub budget_clamp: BudgetClamp,
    /// Fresh passes attempted per original before giving up on uniqueness.
    pub max_uniqueness_attempts: usize,
    /// Consecutive rounds without progress tolerated within one pass.
    pub max_stalled_rounds: usize,
    /// Field excluded from canonical forms (the record identifier), if present in the field map.
    pub identifier_field: Option<FieldName>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            max_num_record_modifi: DEFAULT_MAX_RECORD_MODIFICATIONS,
            selection: SelectionStrategy::default(),
            budget_clamp: BudgetClamp::default(),
            max_uniqueness_attempts: DEFAULT_UNIQUENESS_ATTEMPTS,
            max_stalled_rounds: DEFAULT_MAX_STALLED_ROUNDS,
            identifier_field: Some(DEFAULT_IDENTIFIER_FIELD.to_string()),
        }
    }
}

impl GeneratorConfig {
    /// Reject zero budgets and retry limits.
    pub fn validate(&self) -> Result<(), GeneratorError> {
        if self.max_num_record_modifi == 0 {
            return Err(GeneratorError::Configuration(
                "max_num_record_modifi must be at least 1".to_string(),
            ));
        }
        if self.max_uniqueness_attempts == 0 {
            return Err(GeneratorError::Configuration(
                "max_uniqueness_attempts must be at least 1".to_string(),
            ));
        }
        if self.max_stalled_rounds == 0 {
            return Err(GeneratorError::Configuration(
                "max_stalled_rounds must be at least 1".to_string(),
            ));
        }
        if let SelectionStrategy::RetryUntilEligible { max_retries: 0 } = self.selection {
            return Err(GeneratorError::Configuration(
                "selection retry limit must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
