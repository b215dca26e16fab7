//! Per-record modification loop and the drivers built on it.

use rand::RngCore;
use rayon::prelude::*;
use std::collections::HashSet;
use tracing::{debug, warn};

use crate::budget::DuplicateInProgress;
use crate::config::{FieldTable, GeneratorConfig};
use crate::data::{DuplicateRecord, OriginalRecord};
use crate::errors::GeneratorError;
use crate::gate::{GateDecision, UniquenessGate};
use crate::operators::OperatorSet;
use crate::planner::plan_field_modifications;
use crate::rng::DeterministicRng;
use crate::selector::FieldSelector;
use crate::types::{CanonicalForm, RecordId};

/// Result of one generation pass for an original record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Generated {
    /// The candidate was new and is registered with the gate.
    Accepted(DuplicateRecord),
    /// The finished candidate collided with an earlier duplicate.
    Rejected {
        /// Canonical form that was already present.
        canonical: CanonicalForm,
    },
}

/// Everything produced for one original during a batch run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OriginalOutcome {
    /// Original the duplicates were derived from.
    pub original_id: RecordId,
    /// Duplicates accepted by the gate, in generation order.
    pub duplicates: Vec<DuplicateRecord>,
    /// Error that stopped generation for this original, if any.
    pub error: Option<GeneratorError>,
}

/// Per-original results of [`DuplicateGenerator::generate_batch`].
///
/// Failed originals keep the duplicates accepted before the failure, so the
/// returned set always matches what the gate registered.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BatchOutcome {
    /// One entry per original, in input order.
    pub originals: Vec<OriginalOutcome>,
}

impl BatchOutcome {
    /// True when every original produced its full quota.
    pub fn is_complete(&self) -> bool {
        self.originals.iter().all(|outcome| outcome.error.is_none())
    }

    /// All accepted duplicates, in input order.
    pub fn duplicates(&self) -> impl Iterator<Item = &DuplicateRecord> {
        self.originals
            .iter()
            .flat_map(|outcome| outcome.duplicates.iter())
    }

    /// Originals that stopped early, with the error that stopped them.
    pub fn failures(&self) -> impl Iterator<Item = (&RecordId, &GeneratorError)> {
        self.originals.iter().filter_map(|outcome| {
            outcome
                .error
                .as_ref()
                .map(|err| (&outcome.original_id, err))
        })
    }

    /// Total duplicates accepted across all originals.
    pub fn accepted_count(&self) -> usize {
        self.originals
            .iter()
            .map(|outcome| outcome.duplicates.len())
            .sum()
    }

    /// Flatten into the accepted duplicates, dropping failure details.
    pub fn into_duplicates(self) -> Vec<DuplicateRecord> {
        self.originals
            .into_iter()
            .flat_map(|outcome| outcome.duplicates)
            .collect()
    }
}

/// Generates budgeted, globally distinct duplicates from original records.
pub struct DuplicateGenerator {
    config: GeneratorConfig,
    table: FieldTable,
    operators: OperatorSet,
}

impl DuplicateGenerator {
    /// Build a generator with the built-in operators.
    pub fn new(config: GeneratorConfig, table: FieldTable) -> Result<Self, GeneratorError> {
        Self::with_operators(config, table, OperatorSet::with_defaults())
    }

    /// Build a generator with a caller-supplied operator set.
    ///
    /// Every kind with a positive probability in the table must be registered.
    pub fn with_operators(
        config: GeneratorConfig,
        table: FieldTable,
        operators: OperatorSet,
    ) -> Result<Self, GeneratorError> {
        config.validate()?;
        table.validate(config.max_num_record_modifi, config.selection)?;
        for (name, spec) in table.iter() {
            if let Some((kind, _)) = spec
                .prob_list
                .iter()
                .find(|(kind, prob)| *prob > 0.0 && !operators.contains(*kind))
            {
                return Err(GeneratorError::Configuration(format!(
                    "field '{name}' uses {kind:?}, which has no registered operator"
                )));
            }
        }
        Ok(Self {
            config,
            table,
            operators,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Field probability table driving selection.
    pub fn table(&self) -> &FieldTable {
        &self.table
    }

    /// Fresh gate for a generation run, excluding the configured identifier field.
    pub fn new_gate(&self) -> UniquenessGate {
        UniquenessGate::new(self.config.identifier_field.clone())
    }

    /// Run the modification loop until the record budget is spent.
    ///
    /// The returned candidate has not been checked for uniqueness. A round
    /// only counts toward `max_stalled_rounds` once every still-eligible field
    /// has had an unproductive round since the last successful modification.
    pub fn build_candidate<'a>(
        &self,
        original: &'a OriginalRecord,
        rng: &mut dyn RngCore,
    ) -> Result<DuplicateInProgress<'a>, GeneratorError> {
        for (name, spec) in self.table.iter() {
            if spec.select_prob > 0.0 && !original.fields.contains_key(name) {
                return Err(GeneratorError::UnknownField {
                    record_id: original.id.clone(),
                    field: name.clone(),
                });
            }
        }

        let selector = FieldSelector::new(&self.table, self.config.selection);
        let mut dup = DuplicateInProgress::new(original, self.config.max_num_record_modifi);
        let mut stalled = 0;
        let mut unproductive: HashSet<&str> = HashSet::new();

        while !dup.budget().is_exhausted() {
            let (field, spec) = selector.select(dup.budget(), &original.id, rng)?;
            let planned = plan_field_modifications(
                spec.max_num_field_modifi,
                dup.budget().remaining(),
                self.config.budget_clamp,
                rng,
            );
            debug!(record_id = %original.id, field = %field, planned, "modifying field");

            let mut progressed = false;
            for _ in 0..planned {
                if dup.budget().is_exhausted()
                    || dup.budget().field_count(field) >= spec.max_num_field_modifi
                {
                    break;
                }
                let kind = OperatorSet::choose_kind(&spec.prob_list, rng)?;
                let before = dup.value(field).unwrap_or_default();
                let Some(after) = self.operators.apply(kind, before, spec.char_range, rng)? else {
                    continue;
                };
                if dup.submit(field, after).is_success() {
                    progressed = true;
                }
            }

            if progressed {
                stalled = 0;
                unproductive.clear();
            } else {
                unproductive.insert(field.as_str());
                let all_stuck = self
                    .table
                    .iter()
                    .filter(|(name, spec)| {
                        spec.select_prob > 0.0
                            && dup.budget().field_count(name) < spec.max_num_field_modifi
                    })
                    .all(|(name, _)| unproductive.contains(name.as_str()));
                if !all_stuck {
                    continue;
                }
                stalled += 1;
                if stalled >= self.config.max_stalled_rounds {
                    warn!(record_id = %original.id, rounds = stalled, "modification loop stalled");
                    return Err(GeneratorError::NoProgress {
                        record_id: original.id.clone(),
                        rounds: stalled,
                    });
                }
            }
        }
        Ok(dup)
    }

    /// One pass: build a candidate and submit it to `gate`.
    pub fn generate_duplicate(
        &self,
        original: &OriginalRecord,
        gate: &UniquenessGate,
        rng: &mut dyn RngCore,
    ) -> Result<Generated, GeneratorError> {
        let dup = self.build_candidate(original, rng)?;
        match gate.submit(&original.id, dup.fields()) {
            GateDecision::Accepted(id) => {
                let (fields, budget) = dup.into_parts();
                let (num_modifications, field_mod_counts) = budget.into_counts();
                Ok(Generated::Accepted(DuplicateRecord {
                    id,
                    original_id: original.id.clone(),
                    fields,
                    field_mod_counts,
                    num_modifications,
                }))
            }
            GateDecision::Rejected => Ok(Generated::Rejected {
                canonical: gate.canonicalize(dup.fields()),
            }),
        }
    }

    /// Retry fresh passes until one is accepted, at most `max_uniqueness_attempts` times.
    pub fn generate_unique(
        &self,
        original: &OriginalRecord,
        gate: &UniquenessGate,
        rng: &mut dyn RngCore,
    ) -> Result<DuplicateRecord, GeneratorError> {
        let attempts = self.config.max_uniqueness_attempts;
        for _ in 0..attempts {
            if let Generated::Accepted(dup) = self.generate_duplicate(original, gate, rng)? {
                return Ok(dup);
            }
        }
        warn!(record_id = %original.id, attempts, "could not produce a distinct duplicate");
        Err(GeneratorError::UniquenessExhausted {
            record_id: original.id.clone(),
            attempts,
        })
    }

    /// Generate `per_original` duplicates for every original in parallel.
    ///
    /// Each original draws from its own stream derived from the configured
    /// seed and its id. A failing original stops early but keeps what it
    /// already produced; the other originals are unaffected.
    pub fn generate_batch(
        &self,
        originals: &[OriginalRecord],
        per_original: usize,
        gate: &UniquenessGate,
    ) -> BatchOutcome {
        let originals = originals
            .par_iter()
            .map(|original| {
                let mut rng = DeterministicRng::for_record(self.config.seed, &original.id);
                let mut duplicates = Vec::with_capacity(per_original);
                let mut error = None;
                for _ in 0..per_original {
                    match self.generate_unique(original, gate, &mut rng) {
                        Ok(dup) => duplicates.push(dup),
                        Err(err) => {
                            error = Some(err);
                            break;
                        }
                    }
                }
                OriginalOutcome {
                    original_id: original.id.clone(),
                    duplicates,
                    error,
                }
            })
            .collect();
        BatchOutcome { originals }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BudgetClamp, FieldSpec, SelectionStrategy};
    use crate::domain::CharRange;
    use crate::operators::InsertionOperator;
    use crate::position::UniformPosition;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn table() -> FieldTable {
        FieldTable::new()
            .with_field("surname", FieldSpec::insert_only(CharRange::Alpha, 0.4, 2))
            .with_field("city", FieldSpec::insert_only(CharRange::Alpha, 0.3, 2))
            .with_field("postcode", FieldSpec::insert_only(CharRange::Digit, 0.2, 1))
            .with_field("dob", FieldSpec::insert_only(CharRange::Digit, 0.1, 1))
    }

    fn original() -> OriginalRecord {
        OriginalRecord::new(
            "rec-0-org",
            [
                ("rec_id", "rec-0-org"),
                ("surname", "smith"),
                ("city", "perth"),
                ("postcode", "6000"),
                ("dob", "19770412"),
            ],
        )
    }

    #[test]
    fn spends_exactly_the_record_budget() {
        let generator = DuplicateGenerator::new(GeneratorConfig::default(), table()).unwrap();
        let record = original();
        let mut rng = StdRng::from_seed([1_u8; 32]);
        for _ in 0..200 {
            let dup = generator.build_candidate(&record, &mut rng).unwrap();
            let budget = dup.budget();
            assert_eq!(budget.num_modif_in_record(), 3);
            for (name, spec) in generator.table().iter() {
                assert!(budget.field_count(name) <= spec.max_num_field_modifi);
            }
            let added: usize = dup
                .fields()
                .iter()
                .map(|(name, value)| value.chars().count() - record.fields[name].chars().count())
                .sum();
            assert_eq!(added, 3);
            assert_eq!(dup.value("rec_id"), Some("rec-0-org"));
        }
    }

    #[test]
    fn clamped_and_unclamped_both_hold_the_invariants() {
        for clamp in [BudgetClamp::Unclamped, BudgetClamp::ClampToRemaining] {
            let config = GeneratorConfig {
                max_num_record_modifi: 4,
                budget_clamp: clamp,
                selection: SelectionStrategy::EligibleOnly,
                ..GeneratorConfig::default()
            };
            let generator = DuplicateGenerator::new(config, table()).unwrap();
            let record = original();
            let mut rng = DeterministicRng::new(77);
            for _ in 0..100 {
                let dup = generator.build_candidate(&record, &mut rng).unwrap();
                assert_eq!(dup.budget().num_modif_in_record(), 4);
                assert!(dup.budget().field_count("postcode") <= 1);
                assert!(dup.budget().field_count("surname") <= 2);
            }
        }
    }

    #[test]
    fn empty_fields_stall_instead_of_looping() {
        let table =
            FieldTable::new().with_field("city", FieldSpec::insert_only(CharRange::Alpha, 1.0, 3));
        let config = GeneratorConfig {
            max_num_record_modifi: 2,
            max_stalled_rounds: 5,
            ..GeneratorConfig::default()
        };
        let generator = DuplicateGenerator::new(config, table).unwrap();
        let record = OriginalRecord::new("rec-3-org", [("city", "")]);
        let mut rng = DeterministicRng::new(1);
        assert_eq!(
            generator.build_candidate(&record, &mut rng).unwrap_err(),
            GeneratorError::NoProgress {
                record_id: "rec-3-org".into(),
                rounds: 5,
            }
        );
    }

    #[test]
    fn empty_field_does_not_block_a_completable_record() {
        let table = FieldTable::new()
            .with_field("middle", FieldSpec::insert_only(CharRange::Alpha, 0.97, 1))
            .with_field("surname", FieldSpec::insert_only(CharRange::Alpha, 0.03, 3));
        let generator = DuplicateGenerator::new(GeneratorConfig::default(), table).unwrap();
        let record = OriginalRecord::new("rec-6-org", [("middle", ""), ("surname", "smith")]);
        for seed in 0..200 {
            let mut rng = DeterministicRng::new(seed);
            let dup = generator.build_candidate(&record, &mut rng).unwrap();
            assert_eq!(dup.budget().num_modif_in_record(), 3);
            assert_eq!(dup.budget().field_count("surname"), 3);
            assert_eq!(dup.value("middle"), Some(""));
        }
    }

    #[test]
    fn missing_field_is_reported() {
        let generator = DuplicateGenerator::new(GeneratorConfig::default(), table()).unwrap();
        let record = OriginalRecord::new("rec-4-org", [("surname", "smith")]);
        let mut rng = DeterministicRng::new(2);
        assert!(matches!(
            generator.build_candidate(&record, &mut rng),
            Err(GeneratorError::UnknownField { .. })
        ));
    }

    #[test]
    fn unregistered_kind_is_a_configuration_error() {
        let err = DuplicateGenerator::with_operators(
            GeneratorConfig::default(),
            table(),
            OperatorSet::new(),
        )
        .err()
        .unwrap();
        assert!(matches!(err, GeneratorError::Configuration(_)));
    }

    #[test]
    fn collisions_are_rejected_then_exhausted() {
        let table =
            FieldTable::new().with_field("code", FieldSpec::insert_only(CharRange::Digit, 1.0, 1));
        let config = GeneratorConfig {
            max_num_record_modifi: 1,
            max_uniqueness_attempts: 50,
            ..GeneratorConfig::default()
        };
        let operators = OperatorSet::new().with(InsertionOperator::new(UniformPosition));
        let generator = DuplicateGenerator::with_operators(config, table, operators).unwrap();
        let record = OriginalRecord::new("rec-5-org", [("code", "7")]);
        let gate = generator.new_gate();
        let mut rng = DeterministicRng::new(3);

        // "7" admits 19 distinct single insertions: "d7" and "7d" share "77".
        let mut accepted = 0;
        let mut rejected = 0;
        for _ in 0..300 {
            match generator.generate_duplicate(&record, &gate, &mut rng).unwrap() {
                Generated::Accepted(_) => accepted += 1,
                Generated::Rejected { canonical } => {
                    assert!(gate.contains(&canonical));
                    rejected += 1;
                }
            }
        }
        assert_eq!(accepted, 19);
        assert_eq!(gate.accepted_count(), 19);
        assert_eq!(rejected, 281);

        assert_eq!(
            generator.generate_unique(&record, &gate, &mut rng).unwrap_err(),
            GeneratorError::UniquenessExhausted {
                record_id: "rec-5-org".into(),
                attempts: 50,
            }
        );
    }
}
