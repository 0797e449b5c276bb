// 🚨 Error Taxonomy
// Malformed input, bad configuration and delivery failures

use thiserror::Error;

// ============================================================================
// MALFORMED INPUT
// ============================================================================

/// Rejection of an inbound expense payload. Raised at the boundary,
/// before the ledger is touched.
#[derive(Debug, Error, PartialEq)]
pub enum ExpenseError {
    #[error("invalid expense payload: {0}")]
    InvalidJson(String),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    #[error("amount must be a finite number, got {0}")]
    NonFiniteAmount(f64),
}

// ============================================================================
// CONFIGURATION
// ============================================================================

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("threshold must be in (0, 1], got {0}")]
    ThresholdOutOfRange(f64),

    #[error("total amount must be finite and non-negative, got {0}")]
    InvalidTotalAmount(f64),

    #[error("delivery timeout must be greater than zero")]
    ZeroDeliveryTimeout,
}

// ============================================================================
// DELIVERY
// ============================================================================

/// Any of these marks the subscriber as dead; the dispatcher prunes it.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DeliveryError {
    #[error("delivery timed out after {0} ms")]
    Timeout(u64),

    #[error("subscriber channel closed")]
    Closed,

    #[error("transport error: {0}")]
    Transport(String),
}
