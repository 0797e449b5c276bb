// ➕ Aggregator
// Pure totals over an expense sequence

use crate::ledger::Expense;
use std::collections::HashMap;

/// Sum of all amounts. Zero for an empty sequence.
pub fn total(expenses: &[Expense]) -> f64 {
    expenses.iter().map(|e| e.amount).sum()
}

/// Sum of amounts grouped by category.
///
/// The map is unordered; callers must not rely on iteration order.
pub fn by_category(expenses: &[Expense]) -> HashMap<String, f64> {
    let mut totals: HashMap<String, f64> = HashMap::new();

    for expense in expenses {
        *totals.entry(expense.category.clone()).or_insert(0.0) += expense.amount;
    }

    totals
}

// ============================================================================
// TESTS
// ============================================================================
