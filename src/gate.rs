//! Run-wide uniqueness gate for accepted duplicates.

use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard, PoisonError};
use tracing::debug;

use crate::constants::generator::DUPLICATE_ID_INFIX;
use crate::types::{CanonicalForm, DuplicateId, FieldName, FieldValue, RecordId};

/// Outcome of submitting a finished duplicate to the gate.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateDecision {
    /// New canonical form; the duplicate was registered under this id.
    Accepted(DuplicateId),
    /// An identical duplicate was already accepted this run.
    Rejected,
}

/// Serialize field/value pairs sorted by field name, skipping `identifier_field`.
///
/// The result is independent of the map's insertion order:
/// `[('city','perth'),('surname','smith')]`.
pub fn canonical_form<'a, I>(fields: I, identifier_field: Option<&str>) -> CanonicalForm
where
    I: IntoIterator<Item = (&'a FieldName, &'a FieldValue)>,
{
    let mut pairs: Vec<(&str, &str)> = fields
        .into_iter()
        .filter(|(name, _)| Some(name.as_str()) != identifier_field)
        .map(|(name, value)| (name.as_str(), value.as_str()))
        .collect();
    pairs.sort_unstable();
    let body = pairs
        .iter()
        .map(|(name, value)| format!("('{}','{}')", quote(name), quote(value)))
        .collect::<Vec<_>>()
        .join(",");
    format!("[{body}]")
}

fn quote(text: &str) -> String {
    text.replace('\\', "\\\\").replace('\'', "\\'")
}

#[derive(Default)]
struct GateState {
    seen: HashSet<CanonicalForm>,
    used_originals: IndexMap<RecordId, Vec<DuplicateId>>,
    accepted: usize,
}

/// Summary handed back when a generation run ends.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct GateReport {
    /// Duplicates accepted during the run.
    pub accepted: usize,
    /// Canonical forms in the seen-set.
    pub distinct_forms: usize,
    /// Duplicate ids registered per original.
    pub used_originals: IndexMap<RecordId, Vec<DuplicateId>>,
}

/// Owns the seen-set and the used-originals registry for one generation run.
///
/// All mutation goes through a single lock, so concurrent submitters can
/// never both observe a canonical form as absent and both accept it.
pub struct UniquenessGate {
    identifier_field: Option<FieldName>,
    state: Mutex<GateState>,
}

impl UniquenessGate {
    /// Empty gate for a new run.
    pub fn new(identifier_field: Option<FieldName>) -> Self {
        Self {
            identifier_field,
            state: Mutex::new(GateState::default()),
        }
    }

    fn state(&self) -> MutexGuard<'_, GateState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Canonical form of `fields` under this gate's identifier exclusion.
    pub fn canonicalize(&self, fields: &IndexMap<FieldName, FieldValue>) -> CanonicalForm {
        canonical_form(fields, self.identifier_field.as_deref())
    }

    /// Accept `fields` as a duplicate of `original_id` unless an identical one was seen.
    pub fn submit(
        &self,
        original_id: &str,
        fields: &IndexMap<FieldName, FieldValue>,
    ) -> GateDecision {
        let canonical = self.canonicalize(fields);
        let mut state = self.state();
        if state.seen.contains(&canonical) {
            debug!(record_id = original_id, "rejected colliding duplicate");
            return GateDecision::Rejected;
        }
        state.seen.insert(canonical);
        let registered = state
            .used_originals
            .entry(original_id.to_string())
            .or_default();
        let duplicate_id = format!("{original_id}{DUPLICATE_ID_INFIX}{}", registered.len());
        registered.push(duplicate_id.clone());
        state.accepted += 1;
        debug!(record_id = original_id, %duplicate_id, "accepted duplicate");
        GateDecision::Accepted(duplicate_id)
    }

    /// Whether `canonical` was already accepted.
    pub fn contains(&self, canonical: &str) -> bool {
        self.state().seen.contains(canonical)
    }

    /// Duplicates accepted so far.
    pub fn accepted_count(&self) -> usize {
        self.state().accepted
    }

    /// Whether any duplicate of `original_id` was accepted.
    pub fn is_used(&self, original_id: &str) -> bool {
        self.state().used_originals.contains_key(original_id)
    }

    /// Ids accepted for `original_id`, in acceptance order.
    pub fn duplicates_of(&self, original_id: &str) -> Vec<DuplicateId> {
        self.state()
            .used_originals
            .get(original_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Tear the gate down at the end of a run.
    pub fn into_report(self) -> GateReport {
        let state = self
            .state
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner);
        GateReport {
            accepted: state.accepted,
            distinct_forms: state.seen.len(),
            used_originals: state.used_originals,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(pairs: &[(&str, &str)]) -> IndexMap<FieldName, FieldValue> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn canonical_form_is_order_independent() {
        let a = fields(&[("surname", "smith"), ("city", "perth"), ("rec_id", "rec-1")]);
        let b = fields(&[("rec_id", "rec-9"), ("city", "perth"), ("surname", "smith")]);
        let left = canonical_form(&a, Some("rec_id"));
        assert_eq!(left, canonical_form(&b, Some("rec_id")));
        assert_eq!(left, "[('city','perth'),('surname','smith')]");
    }

    #[test]
    fn canonical_form_keeps_identifier_when_unset() {
        let a = fields(&[("rec_id", "rec-1"), ("city", "perth")]);
        assert_eq!(
            canonical_form(&a, None),
            "[('city','perth'),('rec_id','rec-1')]"
        );
    }

    #[test]
    fn quotes_are_escaped() {
        let a = fields(&[("surname", "o'neil")]);
        assert_eq!(canonical_form(&a, None), "[('surname','o\\'neil')]");
    }

    #[test]
    fn accepts_new_and_rejects_repeats() {
        let gate = UniquenessGate::new(Some("rec_id".into()));
        let first = fields(&[("surname", "smxith"), ("city", "perth")]);
        assert_eq!(
            gate.submit("rec-1-org", &first),
            GateDecision::Accepted("rec-1-org-dup-0".into())
        );
        let second = fields(&[("surname", "smith"), ("city", "pexrth")]);
        assert_eq!(
            gate.submit("rec-1-org", &second),
            GateDecision::Accepted("rec-1-org-dup-1".into())
        );
        assert_eq!(gate.accepted_count(), 2);
        assert!(gate.is_used("rec-1-org"));
        assert_eq!(gate.duplicates_of("rec-1-org").len(), 2);
    }

    #[test]
    fn rejection_leaves_registries_untouched() {
        let gate = UniquenessGate::new(Some("rec_id".into()));
        let dup = fields(&[("city", "perth"), ("surname", "smith")]);
        gate.submit("rec-1-org", &dup);
        assert!(gate.contains("[('city','perth'),('surname','smith')]"));

        let reordered = fields(&[("surname", "smith"), ("rec_id", "x"), ("city", "perth")]);
        assert_eq!(gate.submit("rec-2-org", &reordered), GateDecision::Rejected);
        assert_eq!(gate.accepted_count(), 1);
        assert!(!gate.is_used("rec-2-org"));

        let report = gate.into_report();
        assert_eq!(report.accepted, 1);
        assert_eq!(report.distinct_forms, 1);
        assert_eq!(report.used_originals.len(), 1);
    }
}
