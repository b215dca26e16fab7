#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Per-duplicate modification counters and acceptance rules.
pub mod budget;
/// Generator configuration and field probability tables.
pub mod config;
/// Centralized constants used across operators, selection, and generation.
pub mod constants;
/// Original and duplicate record types.
pub mod data;
/// Character domains for injected characters.
pub mod domain;
/// Run-wide uniqueness gate and canonical forms.
pub mod gate;
/// Per-record modification loop and batch generation.
pub mod generator;
mod hash;
/// Aggregate modification metrics.
pub mod metrics;
/// Modification operators and dispatch.
pub mod operators;
/// Per-field modification count planning.
pub mod planner;
/// Error position policies.
pub mod position;
/// Deterministic random streams.
pub mod rng;
/// Weighted field selection.
pub mod selector;
/// Shared type aliases.
pub mod types;

mod errors;

pub use budget::{Acceptance, DuplicateInProgress, ModificationBudget};
pub use config::{
    BudgetClamp, FieldSpec, FieldTable, GeneratorConfig, ModificationKind, SelectionStrategy,
};
pub use data::{DuplicateRecord, OriginalRecord};
pub use domain::CharRange;
pub use errors::GeneratorError;
pub use gate::{GateDecision, GateReport, UniquenessGate, canonical_form};
pub use generator::{BatchOutcome, DuplicateGenerator, Generated, OriginalOutcome};
pub use metrics::{FieldShare, ModificationSummary, modification_summary};
pub use operators::{FieldModifier, InsertionOperator, OperatorSet};
pub use position::{GaussianPosition, PositionPolicy, UniformPosition};
pub use rng::DeterministicRng;
pub use types::{CanonicalForm, DuplicateId, FieldName, FieldValue, RecordId};
