use rand::{Rng, RngCore};

use crate::config::BudgetClamp;

/// Number of operations to attempt on a field this round.
///
/// A field capped at one always gets exactly one; otherwise the count is
/// uniform in `[1, max_num_field_modifi]`. Under [`BudgetClamp::Unclamped`]
/// the remaining record budget does not bound the result; the modification
/// loop stops at the budget instead.
pub fn plan_field_modifications(
    max_num_field_modifi: usize,
    remaining_record_budget: usize,
    clamp: BudgetClamp,
    rng: &mut dyn RngCore,
) -> usize {
    let planned = if max_num_field_modifi <= 1 {
        1
    } else {
        rng.random_range(1..=max_num_field_modifi)
    };
    match clamp {
        BudgetClamp::Unclamped => planned,
        BudgetClamp::ClampToRemaining => planned.min(remaining_record_budget.max(1)),
    }
}
