//! Reconciliation and achievement engine for moneypot.
//!
//! This crate ties the store and the ledger client together:
//! - `BucketReconciler` compares one bucket against ledger ground truth
//!   and drives its lifecycle state machine
//! - `BatchScheduler` sweeps all eligible buckets in rate-limited batches
//! - `AchievementPipeline` turns qualifying actions into metric
//!   increments, exactly-once unlocks, and reward grants
//! - `NotificationEmitter` renders and persists the resulting
//!   notifications

pub mod error;
pub mod notify;
pub mod pipeline;
pub mod reconcile;
pub mod scheduler;

pub use error::{EngineError, EngineResult};
pub use notify::NotificationEmitter;
pub use pipeline::{Achievement, AchievementPipeline, PipelineOutcome, UnlockResult};
pub use reconcile::{BucketReconciler, ReconcileOutcome, ReconcilePort};
pub use scheduler::{BatchScheduler, RunSummary};
