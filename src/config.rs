// ⚙️ Configuration
// Fixed at process start from flags or environment; no runtime reconfiguration

use crate::error::ConfigError;
use crate::threshold::DEFAULT_THRESHOLD;
use clap::{Args, Parser};
use std::time::Duration;

#[derive(Debug, Clone, Args)]
pub struct BudgetConfig {
    /// Display name of the shared budget
    #[arg(long, env = "BUDGET_NAME", default_value = "Monthly Shared Budget")]
    pub budget_name: String,

    /// Total amount available
    #[arg(long, env = "BUDGET_TOTAL_AMOUNT", default_value_t = 1000.0)]
    pub total_amount: f64,

    /// Fraction of the total that triggers a notification, in (0, 1]
    #[arg(long, env = "BUDGET_THRESHOLD", default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,

    /// Per-subscriber delivery timeout in milliseconds
    #[arg(long, env = "BUDGET_DELIVERY_TIMEOUT_MS", default_value_t = 5000)]
    pub delivery_timeout_ms: u64,
}

impl BudgetConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.threshold > 0.0 && self.threshold <= 1.0) {
            return Err(ConfigError::ThresholdOutOfRange(self.threshold));
        }
        if !self.total_amount.is_finite() || self.total_amount < 0.0 {
            return Err(ConfigError::InvalidTotalAmount(self.total_amount));
        }
        if self.delivery_timeout_ms == 0 {
            return Err(ConfigError::ZeroDeliveryTimeout);
        }
        Ok(())
    }

    pub fn delivery_timeout(&self) -> Duration {
        Duration::from_millis(self.delivery_timeout_ms)
    }
}

impl Default for BudgetConfig {
    fn default() -> Self {
        BudgetConfig {
            budget_name: "Monthly Shared Budget".to_string(),
            total_amount: 1000.0,
            threshold: DEFAULT_THRESHOLD,
            delivery_timeout_ms: 5000,
        }
    }
}

/// Flags for the web server binary
#[derive(Debug, Clone, Parser)]
#[command(author, version, about = "Shared budget server with live WebSocket updates", long_about = None)]
pub struct ServerConfig {
    #[command(flatten)]
    pub budget: BudgetConfig,

    /// Address to listen on
    #[arg(long, env = "BUDGET_BIND", default_value = "0.0.0.0:8080")]
    pub bind: String,
}
