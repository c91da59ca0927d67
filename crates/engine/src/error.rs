//! Engine error types.

use moneypot_ledger::LedgerError;
use moneypot_metadata::MetadataError;
use thiserror::Error;

/// Errors surfaced by reconciliation and the achievement pipeline.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("metadata error: {0}")]
    Metadata(#[from] MetadataError),

    /// Transient ledger failures propagate here; terminal access errors
    /// are consumed by the reconciler and never escape as `Err`.
    #[error("ledger error: {0}")]
    Ledger(#[from] LedgerError),

    #[error("domain error: {0}")]
    Domain(#[from] moneypot_core::Error),

    #[error("not found: {0}")]
    NotFound(String),
}

/// Result type for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;
