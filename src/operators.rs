//! Modification operators and their dispatch by [`ModificationKind`].

use indexmap::IndexMap;
use rand::RngCore;
use rand::seq::IndexedRandom;

use crate::config::ModificationKind;
use crate::constants::position::INSERTION_DIRECTION;
use crate::domain::CharRange;
use crate::errors::GeneratorError;
use crate::position::{GaussianPosition, PositionPolicy};
use crate::types::FieldValue;

/// A character-level error that can be applied to a field value.
///
/// Implementations never touch shared state; they return the candidate value
/// (or `None` for a no-op) and the caller decides whether to commit it.
pub trait FieldModifier: Send + Sync {
    /// Kind this operator implements.
    fn kind(&self) -> ModificationKind;

    /// Candidate value after one operation, or `None` when `value` cannot be modified.
    fn apply(&self, value: &str, domain: CharRange, rng: &mut dyn RngCore) -> Option<FieldValue>;
}

/// Splice `ch` into `value` before the character at `pos` (`pos == len` appends).
pub fn insert_char(value: &str, pos: usize, ch: char) -> FieldValue {
    let byte_idx = value
        .char_indices()
        .nth(pos)
        .map(|(idx, _)| idx)
        .unwrap_or(value.len());
    let mut out = String::with_capacity(value.len() + ch.len_utf8());
    out.push_str(&value[..byte_idx]);
    out.push(ch);
    out.push_str(&value[byte_idx..]);
    out
}

/// Inserts one character drawn uniformly from the field's domain.
pub struct InsertionOperator {
    policy: Box<dyn PositionPolicy>,
}

impl InsertionOperator {
    /// Insertion operator using `policy` for positions.
    pub fn new(policy: impl PositionPolicy + 'static) -> Self {
        Self {
            policy: Box::new(policy),
        }
    }
}

impl Default for InsertionOperator {
    fn default() -> Self {
        Self::new(GaussianPosition::default())
    }
}

impl FieldModifier for InsertionOperator {
    fn kind(&self) -> ModificationKind {
        ModificationKind::Insert
    }

    fn apply(&self, value: &str, domain: CharRange, rng: &mut dyn RngCore) -> Option<FieldValue> {
        let pos = self
            .policy
            .error_position(value, INSERTION_DIRECTION, rng)?;
        let ch = *domain.alphabet().choose(rng)?;
        Some(insert_char(value, pos, ch))
    }
}

/// Registry of operators keyed by the kind they implement.
#[derive(Default)]
pub struct OperatorSet {
    operators: IndexMap<ModificationKind, Box<dyn FieldModifier>>,
}

impl OperatorSet {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Every built-in kind, using default position policies.
    pub fn with_defaults() -> Self {
        Self::new().with(InsertionOperator::default())
    }

    /// Register `operator`, replacing any operator of the same kind.
    pub fn with(mut self, operator: impl FieldModifier + 'static) -> Self {
        self.operators.insert(operator.kind(), Box::new(operator));
        self
    }

    /// Whether an operator is registered for `kind`.
    pub fn contains(&self, kind: ModificationKind) -> bool {
        self.operators.contains_key(&kind)
    }

    /// Weighted draw of one kind from a field's `prob_list`.
    pub fn choose_kind(
        prob_list: &[(ModificationKind, f64)],
        rng: &mut dyn RngCore,
    ) -> Result<ModificationKind, GeneratorError> {
        prob_list
            .choose_weighted(rng, |(_, prob)| *prob)
            .map(|(kind, _)| *kind)
            .map_err(|err| {
                GeneratorError::Configuration(format!("invalid modification weights: {err}"))
            })
    }

    /// Dispatch `kind` against `value`; `Ok(None)` is a no-op.
    pub fn apply(
        &self,
        kind: ModificationKind,
        value: &str,
        domain: CharRange,
        rng: &mut dyn RngCore,
    ) -> Result<Option<FieldValue>, GeneratorError> {
        let operator = self.operators.get(&kind).ok_or_else(|| {
            GeneratorError::Configuration(format!("no operator registered for {kind:?}"))
        })?;
        Ok(operator.apply(value, domain, rng))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::position::UniformPosition;
    use crate::rng::DeterministicRng;

    struct FixedPosition(usize);

    impl PositionPolicy for FixedPosition {
        fn error_position(
            &self,
            value: &str,
            _direction: isize,
            _rng: &mut dyn RngCore,
        ) -> Option<usize> {
            (!value.is_empty()).then_some(self.0)
        }
    }

    #[test]
    fn splices_at_position() {
        assert_eq!(insert_char("smith", 2, 'x'), "smxith");
        assert_eq!(insert_char("smith", 0, 'x'), "xsmith");
        assert_eq!(insert_char("smith", 5, 'x'), "smithx");
        assert_eq!(insert_char("zoë", 3, 'y'), "zoëy");
        assert_eq!(insert_char("zoë", 2, 'y'), "zoyë");
    }

    #[test]
    fn inserts_exactly_one_domain_character() {
        let op = InsertionOperator::new(FixedPosition(2));
        let mut rng = DeterministicRng::new(11);
        for _ in 0..50 {
            let out = op.apply("smith", CharRange::Alpha, &mut rng).unwrap();
            assert_eq!(out.chars().count(), 6);
            assert!(out.starts_with("sm") && out.ends_with("ith"));
            let inserted = out.chars().nth(2).unwrap();
            assert!(inserted.is_ascii_lowercase());
        }
        let digits = op.apply("2913", CharRange::Digit, &mut rng).unwrap();
        assert!(digits.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn empty_value_is_a_no_op() {
        let op = InsertionOperator::new(UniformPosition);
        let mut rng = DeterministicRng::new(12);
        assert_eq!(op.apply("", CharRange::Alphanumeric, &mut rng), None);
    }

    #[test]
    fn dispatch_requires_registered_kind() {
        let mut rng = DeterministicRng::new(13);
        let empty = OperatorSet::new();
        assert!(matches!(
            empty.apply(ModificationKind::Insert, "abc", CharRange::Alpha, &mut rng),
            Err(GeneratorError::Configuration(_))
        ));
        let defaults = OperatorSet::with_defaults();
        assert!(defaults.contains(ModificationKind::Insert));
        let out = defaults
            .apply(ModificationKind::Insert, "abc", CharRange::Alpha, &mut rng)
            .unwrap()
            .unwrap();
        assert_eq!(out.len(), 4);
    }

    #[test]
    fn choose_kind_rejects_zero_weights() {
        let mut rng = DeterministicRng::new(14);
        assert_eq!(
            OperatorSet::choose_kind(&[(ModificationKind::Insert, 1.0)], &mut rng),
            Ok(ModificationKind::Insert)
        );
        assert!(OperatorSet::choose_kind(&[(ModificationKind::Insert, 0.0)], &mut rng).is_err());
        assert!(OperatorSet::choose_kind(&[], &mut rng).is_err());
    }
}
