//! Error types for the core domain.

use thiserror::Error;

/// Core domain error type.
#[derive(Debug, Error)]
pub enum Error {
    #[error("invalid ledger date: {0}")]
    InvalidPayDate(String),

    #[error("invalid bucket status: {0}")]
    InvalidBucketStatus(String),

    #[error("invalid metric name: {0}")]
    InvalidMetricName(String),

    #[error("invalid achievement condition: {0}")]
    InvalidCondition(String),

    #[error("invalid locality: {0}")]
    InvalidLocality(String),

    #[error("invalid notification kind: {0}")]
    InvalidNotificationKind(String),

    #[error("missing notification field: {kind} requires {field}")]
    MissingNotificationField { kind: String, field: String },

    #[error("invalid payment record: {0}")]
    InvalidPaymentRecord(String),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, Error>;
