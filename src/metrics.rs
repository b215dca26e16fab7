use indexmap::IndexMap;

use crate::data::DuplicateRecord;
use crate::types::FieldName;

/// How successful modifications were spread over fields across a set of duplicates.
#[derive(Clone, Debug, PartialEq)]
pub struct ModificationSummary {
    /// Duplicates summarized.
    pub duplicates: usize,
    /// Successful modifications across all duplicates.
    pub total: usize,
    /// Mean modifications per duplicate.
    pub mean_per_duplicate: f64,
    /// Per-field breakdown, largest first.
    pub per_field: Vec<FieldShare>,
}

/// Share of all modifications that landed on one field.
#[derive(Clone, Debug, PartialEq)]
pub struct FieldShare {
    /// Field name.
    pub field: FieldName,
    /// Modifications that landed on the field.
    pub count: usize,
    /// Fraction of all modifications (0.0-1.0).
    pub share: f64,
}

impl ModificationSummary {
    /// Share for `field`, or 0.0 when it was never modified.
    pub fn share_of(&self, field: &str) -> f64 {
        self.per_field
            .iter()
            .find(|entry| entry.field == field)
            .map_or(0.0, |entry| entry.share)
    }
}

/// Summarize per-field modification counts; `None` for an empty input.
///
/// Fields are ordered by descending count, ties broken by name.
pub fn modification_summary(duplicates: &[DuplicateRecord]) -> Option<ModificationSummary> {
    if duplicates.is_empty() {
        return None;
    }
    let mut counts: IndexMap<&FieldName, usize> = IndexMap::new();
    for dup in duplicates {
        for (field, count) in &dup.field_mod_counts {
            *counts.entry(field).or_insert(0) += count;
        }
    }
    let total: usize = counts.values().sum();
    let mut per_field: Vec<FieldShare> = counts
        .into_iter()
        .map(|(field, count)| FieldShare {
            field: field.clone(),
            count,
            share: if total == 0 {
                0.0
            } else {
                count as f64 / total as f64
            },
        })
        .collect();
    per_field.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.field.cmp(&b.field)));
    Some(ModificationSummary {
        duplicates: duplicates.len(),
        total,
        mean_per_duplicate: total as f64 / duplicates.len() as f64,
        per_field,
    })
}
