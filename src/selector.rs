use rand::RngCore;
use rand::seq::IndexedRandom;

use crate::budget::ModificationBudget;
use crate::config::{FieldSpec, FieldTable, SelectionStrategy};
use crate::errors::GeneratorError;
use crate::types::FieldName;

/// Weighted field choice that skips fields already at their per-field cap.
pub struct FieldSelector<'a> {
    candidates: Vec<(&'a FieldName, &'a FieldSpec)>,
    strategy: SelectionStrategy,
}

impl<'a> FieldSelector<'a> {
    /// Fields with a zero selection probability are never candidates.
    pub fn new(table: &'a FieldTable, strategy: SelectionStrategy) -> Self {
        Self {
            candidates: table
                .iter()
                .filter(|(_, spec)| spec.select_prob > 0.0)
                .collect(),
            strategy,
        }
    }

    /// Pick one field whose modification count is strictly below its cap.
    pub fn select(
        &self,
        budget: &ModificationBudget,
        record_id: &str,
        rng: &mut dyn RngCore,
    ) -> Result<(&'a FieldName, &'a FieldSpec), GeneratorError> {
        let eligible = |(name, spec): &(&FieldName, &FieldSpec)| {
            budget.field_count(name) < spec.max_num_field_modifi
        };
        match self.strategy {
            SelectionStrategy::RetryUntilEligible { max_retries } => {
                for _ in 0..max_retries {
                    let drawn = draw(&self.candidates, rng)?;
                    if eligible(&drawn) {
                        return Ok(drawn);
                    }
                }
                Err(GeneratorError::SelectionExhausted {
                    record_id: record_id.to_string(),
                    attempts: max_retries,
                })
            }
            SelectionStrategy::EligibleOnly => {
                let pool: Vec<_> = self
                    .candidates
                    .iter()
                    .copied()
                    .filter(|candidate| eligible(candidate))
                    .collect();
                if pool.is_empty() {
                    return Err(GeneratorError::SelectionExhausted {
                        record_id: record_id.to_string(),
                        attempts: 1,
                    });
                }
                draw(&pool, rng)
            }
        }
    }
}

fn draw<'a>(
    pool: &[(&'a FieldName, &'a FieldSpec)],
    rng: &mut dyn RngCore,
) -> Result<(&'a FieldName, &'a FieldSpec), GeneratorError> {
    pool.choose_weighted(rng, |(_, spec)| spec.select_prob)
        .copied()
        .map_err(|err| GeneratorError::Configuration(format!("invalid field weights: {err}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CharRange;
    use crate::rng::DeterministicRng;
    use std::collections::HashMap;

    fn table() -> FieldTable {
        FieldTable::new()
            .with_field("surname", FieldSpec::insert_only(CharRange::Alpha, 0.5, 1))
            .with_field("city", FieldSpec::insert_only(CharRange::Alpha, 0.3, 1))
            .with_field("postcode", FieldSpec::insert_only(CharRange::Digit, 0.2, 1))
            .with_field("rec_id", FieldSpec::insert_only(CharRange::Alphanumeric, 0.0, 1))
    }

    fn exhaust(budget: &mut ModificationBudget, field: &str) {
        budget.track(field, "a", "ab", "a");
    }

    #[test]
    fn frequencies_follow_weights() {
        let table = table();
        let selector = FieldSelector::new(&table, SelectionStrategy::default());
        let budget = ModificationBudget::new(3);
        let mut rng = DeterministicRng::new(31);
        let mut counts: HashMap<String, usize> = HashMap::new();
        for _ in 0..10_000 {
            let (name, _) = selector.select(&budget, "rec-1", &mut rng).unwrap();
            *counts.entry(name.clone()).or_default() += 1;
        }
        assert!(!counts.contains_key("rec_id"));
        let share = counts["surname"] as f64 / 10_000.0;
        assert!((share - 0.5).abs() < 0.03, "surname share {share}");
        let share = counts["postcode"] as f64 / 10_000.0;
        assert!((share - 0.2).abs() < 0.03, "postcode share {share}");
    }

    #[test]
    fn both_strategies_skip_capped_fields() {
        let table = table();
        let mut budget = ModificationBudget::new(3);
        exhaust(&mut budget, "surname");
        exhaust(&mut budget, "city");
        for strategy in [SelectionStrategy::default(), SelectionStrategy::EligibleOnly] {
            let selector = FieldSelector::new(&table, strategy);
            let mut rng = DeterministicRng::new(32);
            for _ in 0..100 {
                let (name, _) = selector.select(&budget, "rec-1", &mut rng).unwrap();
                assert_eq!(name, "postcode");
            }
        }
    }

    #[test]
    fn retry_strategy_reports_exhaustion() {
        let table = table();
        let mut budget = ModificationBudget::new(5);
        for field in ["surname", "city", "postcode"] {
            exhaust(&mut budget, field);
        }
        let selector = FieldSelector::new(
            &table,
            SelectionStrategy::RetryUntilEligible { max_retries: 25 },
        );
        let mut rng = DeterministicRng::new(33);
        assert_eq!(
            selector.select(&budget, "rec-7", &mut rng).unwrap_err(),
            GeneratorError::SelectionExhausted {
                record_id: "rec-7".into(),
                attempts: 25,
            }
        );
    }

    #[test]
    fn eligible_only_fails_fast_when_nothing_is_left() {
        let table = table();
        let mut budget = ModificationBudget::new(5);
        for field in ["surname", "city", "postcode"] {
            exhaust(&mut budget, field);
        }
        let selector = FieldSelector::new(&table, SelectionStrategy::EligibleOnly);
        let mut rng = DeterministicRng::new(34);
        assert!(matches!(
            selector.select(&budget, "rec-7", &mut rng),
            Err(GeneratorError::SelectionExhausted { .. })
        ));
    }
}
