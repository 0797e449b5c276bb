// 📣 Events
// Change notifications broadcast to every subscriber

use crate::ledger::{Expense, ExpenseTotals};
use serde::Serialize;
use std::collections::HashMap;

/// Outbound event. Serialized as
/// `{"Type":"Expense","Data":{..},"TotalExpenses":n,"CategoryTotals":{..}}` or
/// `{"Type":"Notification","Message":".."}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "Type")]
pub enum Event {
    #[serde(rename = "Expense")]
    ExpenseAdded {
        #[serde(rename = "Data")]
        expense: Expense,

        #[serde(rename = "TotalExpenses")]
        total_expenses: f64,

        #[serde(rename = "CategoryTotals")]
        category_totals: HashMap<String, f64>,
    },

    #[serde(rename = "Notification")]
    ThresholdExceeded {
        #[serde(rename = "Message")]
        message: String,
    },
}

impl Event {
    pub fn expense_added(expense: Expense, totals: &ExpenseTotals) -> Self {
        Event::ExpenseAdded {
            expense,
            total_expenses: totals.total_expenses,
            category_totals: totals.category_totals.clone(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Event::ExpenseAdded { .. } => "Expense",
            Event::ThresholdExceeded { .. } => "Notification",
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
