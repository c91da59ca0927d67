//! Core domain types and shared logic for the moneypot savings engine.
//!
//! This crate defines the canonical data model used across all other crates:
//! - Bucket lifecycle states and progress updates
//! - Fixed-width ledger dates and payment facts
//! - User metric counters and qualifying action types
//! - Achievement conditions and locality classification
//! - Notification kinds and templates

pub mod achievement;
pub mod bucket;
pub mod config;
pub mod error;
pub mod metrics;
pub mod notification;
pub mod paydate;
pub mod payment;

pub use achievement::{AchievementCondition, Locality};
pub use bucket::{BucketProgressUpdate, BucketStatus};
pub use error::{Error, Result};
pub use metrics::{ActionType, MetricName};
pub use notification::NotificationKind;
pub use paydate::PayDate;
pub use payment::{PaymentEntry, PaymentFacts, PaymentRecord};

/// Default number of buckets reconciled concurrently per batch.
pub const DEFAULT_BATCH_SIZE: u32 = 3;

/// Default delay between reconciliation batches, in milliseconds.
pub const DEFAULT_BATCH_DELAY_MS: u64 = 500;

/// Default ledger request timeout, in milliseconds.
pub const DEFAULT_LEDGER_TIMEOUT_MS: u64 = 10_000;
