// 📒 Ledger Store
// The shared budget and its append-only expense list, behind one lock

use crate::aggregate;
use crate::error::ExpenseError;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};
use tracing::{error, info};

// ============================================================================
// EXPENSE
// ============================================================================

/// A single expense entry. Immutable once appended.
///
/// Field names on the wire follow the browser client: `Description`,
/// `Amount`, `User`, `Category`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    #[serde(rename = "Description")]
    pub description: String,

    /// May be negative (refunds); must be finite
    #[serde(rename = "Amount")]
    pub amount: f64,

    #[serde(rename = "User")]
    pub user: String,

    #[serde(rename = "Category")]
    pub category: String,
}

impl Expense {
    pub fn new(description: &str, amount: f64, user: &str, category: &str) -> Self {
        Expense {
            description: description.to_string(),
            amount,
            user: user.to_string(),
            category: category.to_string(),
        }
    }

    /// Parse and validate an inbound JSON payload.
    pub fn from_json(bytes: &[u8]) -> Result<Self, ExpenseError> {
        let payload: ExpensePayload = serde_json::from_slice(bytes)
            .map_err(|e| ExpenseError::InvalidJson(e.to_string()))?;
        payload.validate()
    }
}

/// Raw inbound shape. Every field is optional here so that a missing
/// field is reported by name instead of as a generic parse failure.
#[derive(Debug, Deserialize)]
pub struct ExpensePayload {
    #[serde(rename = "Description", alias = "description")]
    pub description: Option<String>,

    #[serde(rename = "Amount", alias = "amount")]
    pub amount: Option<f64>,

    #[serde(rename = "User", alias = "user")]
    pub user: Option<String>,

    #[serde(rename = "Category", alias = "category")]
    pub category: Option<String>,
}

impl ExpensePayload {
    pub fn validate(self) -> Result<Expense, ExpenseError> {
        let description = self.description.ok_or(ExpenseError::MissingField("Description"))?;
        let amount = self.amount.ok_or(ExpenseError::MissingField("Amount"))?;
        let user = self.user.ok_or(ExpenseError::MissingField("User"))?;
        let category = self.category.ok_or(ExpenseError::MissingField("Category"))?;

        if !amount.is_finite() {
            return Err(ExpenseError::NonFiniteAmount(amount));
        }

        Ok(Expense {
            description,
            amount,
            user,
            category,
        })
    }
}

/// Load expenses from a CSV file with a `Description,Amount,User,Category` header
pub fn load_csv(csv_path: &Path) -> Result<Vec<Expense>> {
    let mut reader = csv::Reader::from_path(csv_path)
        .with_context(|| format!("Failed to open CSV: {:?}", csv_path))?;

    let mut expenses = Vec::new();
    for (index, record) in reader.deserialize::<ExpensePayload>().enumerate() {
        // Header is line 1
        let line = index + 2;
        let payload = record.with_context(|| format!("Failed to parse CSV line {}", line))?;
        let expense = payload
            .validate()
            .with_context(|| format!("Invalid expense on CSV line {}", line))?;
        expenses.push(expense);
    }

    Ok(expenses)
}

// ============================================================================
// BUDGET
// ============================================================================

#[derive(Debug, Clone)]
pub struct Budget {
    pub name: String,
    pub total_amount: f64,
    /// Append-only
    expenses: Vec<Expense>,
}

impl Budget {
    pub fn new(name: &str, total_amount: f64) -> Self {
        Budget {
            name: name.to_string(),
            total_amount,
            expenses: Vec::new(),
        }
    }
}

/// Aggregates computed in the same critical section as the append
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseTotals {
    pub total_expenses: f64,
    pub category_totals: HashMap<String, f64>,
    pub total_amount: f64,
}

/// Consistent point-in-time copy of the ledger
#[derive(Debug, Clone, Serialize)]
pub struct LedgerSnapshot {
    pub name: String,
    pub total_amount: f64,
    pub total_expenses: f64,
    pub expenses: Vec<Expense>,
    pub as_of: DateTime<Utc>,
}

// ============================================================================
// LEDGER STORE
// ============================================================================

/// Owns the budget. Writes and reads share one exclusion domain, so every
/// operation observes the ledger as a whole.
pub struct LedgerStore {
    budget: Mutex<Budget>,
}

impl LedgerStore {
    pub fn new(name: &str, total_amount: f64) -> Self {
        info!(budget = name, total_amount, "ledger created");
        LedgerStore {
            budget: Mutex::new(Budget::new(name, total_amount)),
        }
    }

    /// Append an expense and compute both aggregates before releasing the lock.
    pub fn add_expense(&self, expense: Expense) -> ExpenseTotals {
        self.append_with(expense, |_, _| {})
    }

    /// Like `add_expense`, but runs `on_append` inside the same critical
    /// section, so side effects happen in append order. `on_append` must not
    /// block or touch another lock.
    pub fn append_with<F>(&self, expense: Expense, on_append: F) -> ExpenseTotals
    where
        F: FnOnce(&Expense, &ExpenseTotals),
    {
        let mut budget = self.lock();
        budget.expenses.push(expense);

        let totals = ExpenseTotals {
            total_expenses: aggregate::total(&budget.expenses),
            category_totals: aggregate::by_category(&budget.expenses),
            total_amount: budget.total_amount,
        };

        if let Some(appended) = budget.expenses.last() {
            on_append(appended, &totals);
        }

        totals
    }

    pub fn read_snapshot(&self) -> LedgerSnapshot {
        let budget = self.lock();

        LedgerSnapshot {
            name: budget.name.clone(),
            total_amount: budget.total_amount,
            total_expenses: aggregate::total(&budget.expenses),
            expenses: budget.expenses.clone(),
            as_of: Utc::now(),
        }
    }

    /// A poisoned lock means a writer panicked mid-update; the ledger can no
    /// longer be trusted, so the process must not keep serving it.
    fn lock(&self) -> MutexGuard<'_, Budget> {
        match self.budget.lock() {
            Ok(guard) => guard,
            Err(_) => {
                error!("ledger lock poisoned, refusing to serve corrupted state");
                panic!("ledger lock poisoned");
            }
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_add_expense_returns_totals() {
        let ledger = LedgerStore::new("Monthly Shared Budget", 1000.0);

        let totals = ledger.add_expense(Expense::new("groceries", 500.0, "alice", "food"));
        assert_eq!(totals.total_expenses, 500.0);
        assert_eq!(totals.total_amount, 1000.0);

        let totals = ledger.add_expense(Expense::new("dinner", 350.0, "bob", "food"));
        assert_eq!(totals.total_expenses, 850.0);
        assert_eq!(totals.category_totals.len(), 1);
        assert_eq!(totals.category_totals["food"], 850.0);
    }

    #[test]
    fn test_snapshot_preserves_append_order() {
        let ledger = LedgerStore::new("Trip", 300.0);
        ledger.add_expense(Expense::new("train", 40.0, "alice", "transport"));
        ledger.add_expense(Expense::new("hotel", 120.0, "bob", "lodging"));

        let snapshot = ledger.read_snapshot();

        assert_eq!(snapshot.name, "Trip");
        assert_eq!(snapshot.total_amount, 300.0);
        assert_eq!(snapshot.total_expenses, 160.0);
        assert_eq!(snapshot.expenses[0].description, "train");
        assert_eq!(snapshot.expenses[1].description, "hotel");
    }

    #[test]
    fn test_two_concurrent_adds_no_lost_update() {
        let ledger = Arc::new(LedgerStore::new("Shared", 1000.0));

        let handles: Vec<_> = [100.0, 200.0]
            .into_iter()
            .map(|amount| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || ledger.add_expense(Expense::new("x", amount, "u", "misc")))
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = ledger.read_snapshot();
        assert_eq!(snapshot.total_expenses, 300.0);
        assert_eq!(snapshot.expenses.len(), 2);
        assert!(snapshot.expenses.iter().any(|e| e.amount == 100.0));
        assert!(snapshot.expenses.iter().any(|e| e.amount == 200.0));
    }

    #[test]
    fn test_many_concurrent_adds_sum_exactly() {
        let ledger = Arc::new(LedgerStore::new("Shared", 1_000_000.0));

        let handles: Vec<_> = (0..8)
            .map(|worker| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || {
                    for i in 0..50 {
                        let category = if i % 2 == 0 { "even" } else { "odd" };
                        ledger.add_expense(Expense::new("load", (worker + 1) as f64, "u", category));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        // 50 * (1 + 2 + ... + 8); integers are exact in f64
        let snapshot = ledger.read_snapshot();
        assert_eq!(snapshot.expenses.len(), 400);
        assert_eq!(snapshot.total_expenses, 1800.0);
    }

    #[test]
    fn test_totals_observed_by_each_writer_are_distinct() {
        // Every append sees a different prefix of the list, so each
        // returned total is unique when amounts are positive.
        let ledger = Arc::new(LedgerStore::new("Shared", 1000.0));

        let handles: Vec<_> = (0..20)
            .map(|_| {
                let ledger = Arc::clone(&ledger);
                thread::spawn(move || ledger.add_expense(Expense::new("x", 1.0, "u", "c")).total_expenses)
            })
            .collect();

        let mut seen: Vec<f64> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        seen.sort_by(|a, b| a.partial_cmp(b).unwrap());

        let expected: Vec<f64> = (1..=20).map(|n| n as f64).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn test_append_hook_sees_appended_expense() {
        let ledger = LedgerStore::new("Shared", 100.0);
        ledger.add_expense(Expense::new("first", 10.0, "alice", "food"));

        let mut seen = None;
        let totals = ledger.append_with(Expense::new("second", 5.0, "bob", "food"), |expense, totals| {
            seen = Some((expense.description.clone(), totals.total_expenses));
        });

        assert_eq!(seen, Some(("second".to_string(), 15.0)));
        assert_eq!(totals.total_expenses, 15.0);
    }

    #[test]
    fn test_from_json_accepts_browser_payload() {
        let body = br#"{"User":"alice","Description":"lunch","Amount":12.5,"Category":"food"}"#;
        let expense = Expense::from_json(body).unwrap();

        assert_eq!(expense, Expense::new("lunch", 12.5, "alice", "food"));
    }

    #[test]
    fn test_from_json_accepts_lowercase_and_negative() {
        let body = br#"{"user":"bob","description":"refund","amount":-20,"category":"food"}"#;
        let expense = Expense::from_json(body).unwrap();

        assert_eq!(expense.amount, -20.0);
    }

    #[test]
    fn test_from_json_rejects_missing_field() {
        let body = br#"{"User":"alice","Description":"lunch","Category":"food"}"#;
        assert_eq!(Expense::from_json(body), Err(ExpenseError::MissingField("Amount")));
    }

    #[test]
    fn test_from_json_rejects_garbage() {
        assert!(matches!(
            Expense::from_json(b"not json"),
            Err(ExpenseError::InvalidJson(_))
        ));
        assert!(matches!(
            Expense::from_json(br#"{"Amount":"ten"}"#),
            Err(ExpenseError::InvalidJson(_))
        ));
    }

    #[test]
    fn test_payload_rejects_non_finite_amount() {
        let payload = ExpensePayload {
            description: Some("x".to_string()),
            amount: Some(f64::INFINITY),
            user: Some("u".to_string()),
            category: Some("c".to_string()),
        };

        assert_eq!(payload.validate(), Err(ExpenseError::NonFiniteAmount(f64::INFINITY)));
    }

    #[test]
    fn test_load_csv() {
        let path = std::env::temp_dir().join(format!("shared_budget_{}.csv", uuid::Uuid::new_v4()));
        {
            let mut file = std::fs::File::create(&path).unwrap();
            writeln!(file, "Description,Amount,User,Category").unwrap();
            writeln!(file, "groceries,500,alice,food").unwrap();
            writeln!(file, "dinner,350.5,bob,food").unwrap();
        }

        let expenses = load_csv(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(expenses.len(), 2);
        assert_eq!(expenses[1], Expense::new("dinner", 350.5, "bob", "food"));
    }
}
