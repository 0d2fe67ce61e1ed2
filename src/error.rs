// src/error.rs
use thiserror::Error;

pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Errors raised by the analytics core.
///
/// `StorageRead` is recoverable (callers treat the store as empty), the
/// others are surfaced to the caller as-is.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AnalyticsError {
    #[error("Failed to read historical table: {0}")]
    StorageRead(String),

    #[error("Failed to write historical table: {0}")]
    StorageWrite(String),

    #[error("Insufficient data for {metric}: need at least {required} points, got {actual}")]
    InsufficientData {
        metric: &'static str,
        required: usize,
        actual: usize,
    },

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Invariant violated: {0}")]
    InvariantViolation(String),

    #[error("Price source failed: {0}")]
    Fetch(String),
}

impl AnalyticsError {
    pub fn validation(message: impl Into<String>) -> Self {
        AnalyticsError::Validation(message.into())
    }

    pub fn invariant(message: impl Into<String>) -> Self {
        let message = message.into();
        log::error!("Invariant violated: {}", message);
        AnalyticsError::InvariantViolation(message)
    }
}
