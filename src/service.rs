// 🔗 Budget Service
// Ledger → aggregates → event queue → threshold check, plus engine startup

use crate::config::BudgetConfig;
use crate::dispatcher::{event_queue, BroadcastDispatcher, EventPublisher};
use crate::error::ConfigError;
use crate::events::Event;
use crate::ledger::{Expense, ExpenseTotals, LedgerSnapshot, LedgerStore};
use crate::registry::SubscriberRegistry;
use crate::threshold::ThresholdMonitor;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

// ============================================================================
// SERVICE
// ============================================================================

/// Entry point for request handlers. Shared by reference; owns the ledger
/// and a handle to the event queue.
pub struct BudgetService {
    ledger: LedgerStore,
    publisher: EventPublisher,
    monitor: ThresholdMonitor,
}

impl BudgetService {
    pub fn new(ledger: LedgerStore, publisher: EventPublisher, monitor: ThresholdMonitor) -> Self {
        BudgetService {
            ledger,
            publisher,
            monitor,
        }
    }

    /// Append a validated expense, enqueue the change event and, if spend is
    /// above the threshold, a notification. Never waits on delivery.
    ///
    /// Events are enqueued inside the ledger's critical section, so queue
    /// order matches append order and `TotalExpenses` never goes backwards
    /// for positive amounts. Enqueueing neither blocks nor touches the
    /// registry lock, so the two exclusion domains stay unnested.
    pub fn add_expense(&self, expense: Expense) -> ExpenseTotals {
        info!(
            user = %expense.user,
            category = %expense.category,
            amount = expense.amount,
            "expense added"
        );

        self.ledger.append_with(expense, |appended, totals| {
            self.publisher.publish(Event::expense_added(appended.clone(), totals));

            if let Some(notification) = self.monitor.evaluate(totals.total_expenses, totals.total_amount) {
                debug!(
                    total_expenses = totals.total_expenses,
                    total_amount = totals.total_amount,
                    "threshold exceeded"
                );
                self.publisher.publish(notification);
            }
        })
    }

    pub fn read_snapshot(&self) -> LedgerSnapshot {
        self.ledger.read_snapshot()
    }
}

// ============================================================================
// ENGINE
// ============================================================================

/// Everything the process entry point owns: the service handlers call into,
/// the registry transports register with, and the running dispatcher.
pub struct BudgetEngine {
    pub service: Arc<BudgetService>,
    pub registry: Arc<SubscriberRegistry>,
    pub dispatcher: JoinHandle<()>,
}

impl BudgetEngine {
    /// Validate config, build fresh state and spawn the dispatcher.
    /// Must be called inside a tokio runtime.
    pub fn start(config: &BudgetConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let monitor = ThresholdMonitor::new(config.threshold)?;
        let ledger = LedgerStore::new(&config.budget_name, config.total_amount);
        let registry = Arc::new(SubscriberRegistry::new());
        let (publisher, queue) = event_queue();

        let dispatcher =
            BroadcastDispatcher::new(Arc::clone(&registry), config.delivery_timeout()).spawn(queue);

        Ok(BudgetEngine {
            service: Arc::new(BudgetService::new(ledger, publisher, monitor)),
            registry,
            dispatcher,
        })
    }
}

// ============================================================================
// TESTS
// ============================================================================
