// 🚦 Threshold Monitor
// Flags spend above a fraction of the budget after every mutation

use crate::error::ConfigError;
use crate::events::Event;

pub const DEFAULT_THRESHOLD: f64 = 0.8;

/// Stateless check. Fires on every mutation that leaves spend above the
/// line, not only the first one that crosses it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdMonitor {
    threshold: f64,
}

impl ThresholdMonitor {
    /// `threshold` must lie in `(0, 1]`
    pub fn new(threshold: f64) -> Result<Self, ConfigError> {
        if !(threshold > 0.0 && threshold <= 1.0) {
            return Err(ConfigError::ThresholdOutOfRange(threshold));
        }
        Ok(ThresholdMonitor { threshold })
    }

    pub fn is_exceeded(&self, total_expenses: f64, total_amount: f64) -> bool {
        total_expenses > self.threshold * total_amount
    }

    pub fn evaluate(&self, total_expenses: f64, total_amount: f64) -> Option<Event> {
        if !self.is_exceeded(total_expenses, total_amount) {
            return None;
        }

        Some(Event::ThresholdExceeded {
            message: format!("Budget threshold of {:.0}% exceeded!", self.threshold * 100.0),
        })
    }
}

impl Default for ThresholdMonitor {
    fn default() -> Self {
        ThresholdMonitor {
            threshold: DEFAULT_THRESHOLD,
        }
    }
}
