//! Ledger client error types.

use thiserror::Error;

/// Failures from the external ledger, classified by retryability.
///
/// The classification is the single piece of business logic in the
/// client: `Access` means the ledger reports the record as gone or
/// malformed and the caller must treat the bucket as terminally failed;
/// everything else is transient and retried on the next scheduled cycle.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// HTTP 400/404: the account or record no longer exists as far as the
    /// ledger is concerned. Not retryable.
    #[error("ledger denied access to the record (HTTP {status}): {body}")]
    Access { status: u16, body: String },

    /// Timeout, connection failure, or any other non-2xx response.
    /// Retryable on the next cycle.
    #[error("transient ledger failure: {0}")]
    Transient(String),

    /// A 2xx response whose body could not be decoded. Treated as
    /// transient by callers.
    #[error("invalid ledger response: {0}")]
    InvalidResponse(String),

    #[error("ledger configuration error: {0}")]
    Config(String),
}

impl LedgerError {
    /// Whether the failure is terminal for the bucket (drives it to
    /// `failed`) rather than retryable.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Access { .. })
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = std::result::Result<T, LedgerError>;
