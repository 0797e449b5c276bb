// Shared Budget - Core Library
// Concurrent ledger with live fan-out of every change to connected observers

pub mod aggregate;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod events;
pub mod ledger;
pub mod logging;
pub mod registry;
pub mod service;
pub mod subscribers;
pub mod threshold;

#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use config::{BudgetConfig, ServerConfig};
pub use dispatcher::{event_queue, BroadcastDispatcher, DispatchReport, EventPublisher, EventQueue};
pub use error::{ConfigError, DeliveryError, ExpenseError};
pub use events::Event;
pub use ledger::{load_csv, Budget, Expense, ExpensePayload, ExpenseTotals, LedgerSnapshot, LedgerStore};
pub use registry::{Subscriber, SubscriberId, SubscriberRegistry};
pub use service::{BudgetEngine, BudgetService};
pub use subscribers::ChannelSubscriber;
pub use threshold::ThresholdMonitor;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
