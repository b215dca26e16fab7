use thiserror::Error;

use crate::types::{FieldName, RecordId};

/// Error type for configuration, field selection, and duplicate generation failures.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GeneratorError {
    /// A field declared a character category outside `digit | alpha | alphanumeric`.
    #[error("field '{field}' declares unknown character range '{category}'")]
    UnknownDomain {
        /// Field carrying the bad label.
        field: FieldName,
        /// Label as declared.
        category: String,
    },
    /// No field under its cap was drawn within the retry ceiling.
    #[error("record '{record_id}': no eligible field found after {attempts} selection attempts")]
    SelectionExhausted {
        /// Original being duplicated.
        record_id: RecordId,
        /// Draws made before giving up.
        attempts: usize,
    },
    /// Every fresh pass produced a duplicate that was already accepted.
    #[error("record '{record_id}': every candidate duplicate collided after {attempts} attempts")]
    UniquenessExhausted {
        /// Original being duplicated.
        record_id: RecordId,
        /// Passes made before giving up.
        attempts: usize,
    },
    /// Every eligible field stopped accepting modifications (for example, all are empty).
    #[error("record '{record_id}': no successful modification in {rounds} consecutive rounds")]
    NoProgress {
        /// Original being duplicated.
        record_id: RecordId,
        /// Stalled rounds counted.
        rounds: usize,
    },
    /// The field table names a field the original record lacks.
    #[error("record '{record_id}' has no field '{field}'")]
    UnknownField {
        /// Original being duplicated.
        record_id: RecordId,
        /// Missing field.
        field: FieldName,
    },
    /// Invalid table or generator settings.
    #[error("configuration error: {0}")]
    Configuration(String),
}
