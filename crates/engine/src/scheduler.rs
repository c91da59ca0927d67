//! Batched sweeps over all eligible buckets.

use crate::error::EngineResult;
use crate::reconcile::{ReconcileOutcome, ReconcilePort};
use futures::future::join_all;
use moneypot_core::config::SyncConfig;
use moneypot_metadata::MetadataStore;
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Aggregate counts for one full sweep.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total: usize,
    pub no_change: usize,
    pub updated: usize,
    pub marked_success: usize,
    pub marked_failed: usize,
    pub errors: usize,
    pub duration: Duration,
}

impl RunSummary {
    fn record(&mut self, result: &EngineResult<ReconcileOutcome>) {
        match result {
            Ok(ReconcileOutcome::NoChange) => self.no_change += 1,
            Ok(ReconcileOutcome::Updated) => self.updated += 1,
            Ok(ReconcileOutcome::MarkedSuccess) => self.marked_success += 1,
            Ok(ReconcileOutcome::MarkedFailed) => self.marked_failed += 1,
            Err(_) => self.errors += 1,
        }
    }
}

/// Sweeps eligible buckets in fixed-size concurrent batches with a pause
/// between batches, so the ledger never sees more than `batch_size`
/// in-flight inquiries from one sweep.
pub struct BatchScheduler {
    store: Arc<dyn MetadataStore>,
    reconciler: Arc<dyn ReconcilePort>,
    config: SyncConfig,
}

impl BatchScheduler {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        reconciler: Arc<dyn ReconcilePort>,
        config: SyncConfig,
    ) -> Self {
        Self {
            store,
            reconciler,
            config,
        }
    }

    /// Run one full sweep. Per-bucket failures are folded into the
    /// summary instead of aborting the sweep; only listing the eligible
    /// set can fail the whole run.
    pub async fn run_once(&self) -> EngineResult<RunSummary> {
        let started = Instant::now();
        let buckets = self.store.list_active_buckets().await?;

        let mut summary = RunSummary {
            total: buckets.len(),
            ..RunSummary::default()
        };

        let batch_size = self.config.batch_size.max(1) as usize;
        let batch_count = buckets.len().div_ceil(batch_size);
        for (index, batch) in buckets.chunks(batch_size).enumerate() {
            let results = join_all(batch.iter().map(|bucket| async move {
                let result = self.reconciler.reconcile(bucket).await;
                if let Err(e) = &result {
                    tracing::warn!(
                        bucket_id = %bucket.bucket_id,
                        error = %e,
                        "bucket reconciliation failed, will retry next sweep"
                    );
                }
                result
            }))
            .await;

            for result in &results {
                summary.record(result);
            }

            if index + 1 < batch_count {
                tokio::time::sleep(self.config.batch_delay()).await;
            }
        }

        summary.duration = started.elapsed();
        tracing::info!(
            total = summary.total,
            no_change = summary.no_change,
            updated = summary.updated,
            marked_success = summary.marked_success,
            marked_failed = summary.marked_failed,
            errors = summary.errors,
            duration_ms = summary.duration.as_millis() as u64,
            "reconciliation sweep finished"
        );
        Ok(summary)
    }

    /// Run sweeps forever on the configured interval. The first sweep
    /// happens immediately only when `run_on_startup` is set.
    pub async fn run_loop(&self) {
        let mut interval = tokio::time::interval(self.config.interval());
        // The first tick of a tokio interval completes immediately.
        if !self.config.run_on_startup {
            interval.tick().await;
        }
        loop {
            interval.tick().await;
            if let Err(e) = self.run_once().await {
                tracing::error!(error = %e, "reconciliation sweep aborted");
            }
        }
    }
}
