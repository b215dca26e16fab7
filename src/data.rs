use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub use crate::types::{DuplicateId, FieldName, FieldValue, RecordId};

/// Ground-truth input record from which duplicates are derived.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginalRecord {
    /// Stable record identifier.
    pub id: RecordId,
    /// Field values in source order.
    pub fields: IndexMap<FieldName, FieldValue>,
}

impl OriginalRecord {
    /// Build a record from `(field, value)` pairs.
    pub fn new<K, V, I>(id: impl Into<RecordId>, fields: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<FieldName>,
        V: Into<FieldValue>,
    {
        Self {
            id: id.into(),
            fields: fields
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }

    /// Value of `field`, if present.
    pub fn value(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }
}

/// Duplicate accepted by the uniqueness gate.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateRecord {
    /// Identifier assigned by the gate (`{original}-dup-{n}`).
    pub id: DuplicateId,
    /// Original this duplicate was derived from.
    pub original_id: RecordId,
    /// Mutated field values.
    pub fields: IndexMap<FieldName, FieldValue>,
    /// Successful modifications per field.
    pub field_mod_counts: IndexMap<FieldName, usize>,
    /// Total successful modifications.
    pub num_modifications: usize,
}

impl DuplicateRecord {
    /// Value of `field`, if present.
    pub fn value(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }
}
