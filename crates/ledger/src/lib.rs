//! HTTP client for the external savings ledger.
//!
//! The ledger is the source of truth for every bucket's payment history
//! and schedule expiry. This crate provides the timeout-bounded call to
//! fetch one account's history, plus the terminal-vs-transient failure
//! classification the reconciler depends on.

pub mod client;
pub mod error;

pub use client::{LedgerClient, LedgerPort};
pub use error::{LedgerError, LedgerResult};
