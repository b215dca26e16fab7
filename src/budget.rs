//! Per-duplicate modification counters and the acceptance rules that drive them.

use indexmap::IndexMap;
use tracing::debug;

use crate::data::OriginalRecord;
use crate::types::{FieldName, FieldValue};

/// How a single applied operation was classified.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Acceptance {
    /// The field changed for the first time this duplicate.
    FirstModification,
    /// The field changed again after an earlier successful modification.
    SubsequentModification,
    /// The operation left the value as it was; nothing is charged.
    Unchanged,
}

impl Acceptance {
    /// Whether the operation was charged against the budgets.
    pub fn is_success(self) -> bool {
        !matches!(self, Acceptance::Unchanged)
    }
}

/// Counters scoped to one duplicate-generation pass.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModificationBudget {
    max_num_record_modifi: usize,
    num_modif_in_record: usize,
    field_mod_count_dict: IndexMap<FieldName, usize>,
}

impl ModificationBudget {
    /// Empty counters for a record budget of `max_num_record_modifi`.
    pub fn new(max_num_record_modifi: usize) -> Self {
        Self {
            max_num_record_modifi,
            num_modif_in_record: 0,
            field_mod_count_dict: IndexMap::new(),
        }
    }

    /// Successful modifications so far.
    pub fn num_modif_in_record(&self) -> usize {
        self.num_modif_in_record
    }

    /// Record-level budget.
    pub fn max_num_record_modifi(&self) -> usize {
        self.max_num_record_modifi
    }

    /// Successful modifications on `field` so far.
    pub fn field_count(&self, field: &str) -> usize {
        self.field_mod_count_dict.get(field).copied().unwrap_or(0)
    }

    /// Per-field counters, in first-modified order.
    pub fn field_counts(&self) -> &IndexMap<FieldName, usize> {
        &self.field_mod_count_dict
    }

    /// Budget left before the record is complete.
    pub fn remaining(&self) -> usize {
        self.max_num_record_modifi
            .saturating_sub(self.num_modif_in_record)
    }

    /// True once the record budget is spent.
    pub fn is_exhausted(&self) -> bool {
        self.remaining() == 0
    }

    /// Classify one operation on `field` and update counters accordingly.
    ///
    /// `original` is the field's value in the source record.
    pub fn track(&mut self, field: &str, before: &str, after: &str, original: &str) -> Acceptance {
        if after == before {
            return Acceptance::Unchanged;
        }
        self.num_modif_in_record += 1;
        if before == original {
            self.field_mod_count_dict.insert(field.to_string(), 1);
            Acceptance::FirstModification
        } else {
            *self
                .field_mod_count_dict
                .entry(field.to_string())
                .or_insert(0) += 1;
            Acceptance::SubsequentModification
        }
    }

    pub(crate) fn into_counts(self) -> (usize, IndexMap<FieldName, usize>) {
        (self.num_modif_in_record, self.field_mod_count_dict)
    }
}

/// Mutable duplicate under construction, seeded from an original record.
#[derive(Clone, Debug)]
pub struct DuplicateInProgress<'a> {
    original: &'a OriginalRecord,
    fields: IndexMap<FieldName, FieldValue>,
    budget: ModificationBudget,
}

impl<'a> DuplicateInProgress<'a> {
    /// Copy `original`'s fields into a fresh candidate.
    pub fn new(original: &'a OriginalRecord, max_num_record_modifi: usize) -> Self {
        Self {
            original,
            fields: original.fields.clone(),
            budget: ModificationBudget::new(max_num_record_modifi),
        }
    }

    /// Source record.
    pub fn original(&self) -> &'a OriginalRecord {
        self.original
    }

    /// Current value of `field`.
    pub fn value(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    /// Current field values.
    pub fn fields(&self) -> &IndexMap<FieldName, FieldValue> {
        &self.fields
    }

    /// Counters for this candidate.
    pub fn budget(&self) -> &ModificationBudget {
        &self.budget
    }

    /// Submit an operator result for `field`; commits it only when the value changed.
    pub fn submit(&mut self, field: &str, after: FieldValue) -> Acceptance {
        let original = self.original.value(field).unwrap_or_default();
        let before = self
            .fields
            .get(field)
            .map(String::as_str)
            .unwrap_or_default();
        let acceptance = self.budget.track(field, before, &after, original);
        if acceptance.is_success() {
            debug!(
                record_id = %self.original.id,
                field,
                value = %after,
                "committed modification"
            );
            self.fields.insert(field.to_string(), after);
        }
        acceptance
    }

    /// Split into the field values and the counters.
    pub fn into_parts(self) -> (IndexMap<FieldName, FieldValue>, ModificationBudget) {
        (self.fields, self.budget)
    }
}
