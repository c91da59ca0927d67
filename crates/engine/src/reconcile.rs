//! Per-bucket reconciliation against ledger ground truth.

use crate::error::{EngineError, EngineResult};
use crate::notify::NotificationEmitter;
use crate::pipeline::AchievementPipeline;
use async_trait::async_trait;
use moneypot_core::{ActionType, BucketProgressUpdate, BucketStatus, PayDate, PaymentFacts};
use moneypot_ledger::LedgerPort;
use moneypot_metadata::MetadataStore;
use moneypot_metadata::models::BucketRow;
use moneypot_metadata::repos::FinalizeResult;
use std::sync::Arc;
use time::{OffsetDateTime, UtcOffset};

/// What a reconciliation pass did to one bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// Stored state already matched the ledger.
    NoChange,
    /// Payment counts / last progress date were refreshed.
    Updated,
    /// The schedule expired; the bucket transitioned to `success`.
    MarkedSuccess,
    /// The ledger denied access to the record; the bucket transitioned
    /// to `failed`.
    MarkedFailed,
}

impl ReconcileOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoChange => "no_change",
            Self::Updated => "updated",
            Self::MarkedSuccess => "marked_success",
            Self::MarkedFailed => "marked_failed",
        }
    }
}

/// Port for reconciling one bucket, so the scheduler (and tests) receive
/// the reconciler by injection instead of construction.
#[async_trait]
pub trait ReconcilePort: Send + Sync {
    /// Reconcile one bucket against the ledger. Transient failures are
    /// returned as `Err` and retried on the next scheduled cycle.
    async fn reconcile(&self, bucket: &BucketRow) -> EngineResult<ReconcileOutcome>;
}

/// Decision engine for a single bucket.
pub struct BucketReconciler {
    store: Arc<dyn MetadataStore>,
    ledger: Arc<dyn LedgerPort>,
    pipeline: AchievementPipeline,
    emitter: NotificationEmitter,
    /// Business-timezone offset used to compute "today" for expiry checks.
    utc_offset_hours: i8,
}

impl BucketReconciler {
    pub fn new(
        store: Arc<dyn MetadataStore>,
        ledger: Arc<dyn LedgerPort>,
        utc_offset_hours: i8,
    ) -> Self {
        let pipeline = AchievementPipeline::new(store.clone());
        let emitter = NotificationEmitter::new(store.clone());
        Self {
            store,
            ledger,
            pipeline,
            emitter,
            utc_offset_hours,
        }
    }

    fn today(&self) -> PayDate {
        let offset = UtcOffset::from_hms(self.utc_offset_hours, 0, 0).unwrap_or(UtcOffset::UTC);
        PayDate::from_date(OffsetDateTime::now_utc().to_offset(offset).date())
    }

    /// Terminal failure path: the ledger no longer recognizes the account.
    async fn mark_failed(&self, bucket: &BucketRow, reason: &str) -> EngineResult<ReconcileOutcome> {
        let now = OffsetDateTime::now_utc();
        match self
            .store
            .finalize_bucket(bucket.bucket_id, BucketStatus::Failed.as_str(), now)
            .await?
        {
            FinalizeResult::Applied(row) => {
                tracing::warn!(
                    bucket_id = %row.bucket_id,
                    reason,
                    "bucket marked failed"
                );
                self.emitter.payment_failed(&row, reason).await?;
                Ok(ReconcileOutcome::MarkedFailed)
            }
            FinalizeResult::AlreadyTerminal(_) | FinalizeResult::NotFound => {
                Ok(ReconcileOutcome::NoChange)
            }
        }
    }

    /// Expiry path: the schedule ran out, so the bucket succeeded
    /// regardless of individual payment results.
    async fn mark_success(&self, bucket: &BucketRow) -> EngineResult<ReconcileOutcome> {
        let now = OffsetDateTime::now_utc();
        let row = match self
            .store
            .finalize_bucket(bucket.bucket_id, BucketStatus::Success.as_str(), now)
            .await?
        {
            FinalizeResult::Applied(row) => row,
            FinalizeResult::AlreadyTerminal(_) | FinalizeResult::NotFound => {
                return Ok(ReconcileOutcome::NoChange);
            }
        };

        tracing::info!(bucket_id = %row.bucket_id, "bucket completed (schedule expired)");

        // The achievement pipeline runs outside the bucket's transaction;
        // its failure must not mask the already-committed transition.
        self.run_completion_pipeline(&row).await;
        self.emitter.bucket_completed(&row).await?;

        Ok(ReconcileOutcome::MarkedSuccess)
    }

    async fn run_completion_pipeline(&self, bucket: &BucketRow) {
        let mut actions = vec![ActionType::CompleteBucket];
        if bucket.is_challenge {
            actions.push(ActionType::CompleteChallenge);
        }
        for action in actions {
            if let Err(e) = self.pipeline.record_action(bucket.user_id, action).await {
                tracing::error!(
                    bucket_id = %bucket.bucket_id,
                    user_id = %bucket.user_id,
                    action = action.as_str(),
                    error = %e,
                    "completion pipeline failed after bucket transition"
                );
            }
        }
    }

    /// Count-refresh path: update the three progress fields and report
    /// each increase once, named by its size.
    async fn apply_progress(
        &self,
        bucket: &BucketRow,
        facts: &PaymentFacts,
    ) -> EngineResult<ReconcileOutcome> {
        let update = BucketProgressUpdate {
            success_payment: facts.success_count as i32,
            fail_payment: facts.fail_count as i32,
            last_progress_date: facts.last_payment_date,
        };
        let applied = self
            .store
            .update_progress(bucket.bucket_id, &update, OffsetDateTime::now_utc())
            .await?;
        if !applied {
            // A concurrent writer finalized the bucket under us.
            return Ok(ReconcileOutcome::NoChange);
        }

        let success_increase = facts.success_count.saturating_sub(bucket.success_payment as u32);
        let fail_increase = facts.fail_count.saturating_sub(bucket.fail_payment as u32);

        if success_increase > 0 {
            self.emitter.payment_success(bucket, success_increase).await?;
        }
        if fail_increase > 0 {
            let reason = format!("{fail_increase} scheduled deposit(s) could not be collected.");
            self.emitter.payment_failed(bucket, &reason).await?;
        }

        tracing::info!(
            bucket_id = %bucket.bucket_id,
            success = format!("{} -> {}", bucket.success_payment, facts.success_count),
            fail = format!("{} -> {}", bucket.fail_payment, facts.fail_count),
            "bucket payments updated"
        );
        Ok(ReconcileOutcome::Updated)
    }

    fn has_progress_changed(bucket: &BucketRow, facts: &PaymentFacts) -> bool {
        let stored_date = bucket.last_progress_date.as_deref();
        let new_date = facts.last_payment_date.map(|d| d.to_string());
        bucket.success_payment != facts.success_count as i32
            || bucket.fail_payment != facts.fail_count as i32
            || stored_date != new_date.as_deref()
    }
}

#[async_trait]
impl ReconcilePort for BucketReconciler {
    async fn reconcile(&self, bucket: &BucketRow) -> EngineResult<ReconcileOutcome> {
        // Eligibility is a no-op by construction, not an error.
        if bucket.status != BucketStatus::InProgress.as_str() {
            return Ok(ReconcileOutcome::NoChange);
        }
        let Some(account_ref) = bucket.account_ref.as_deref() else {
            return Ok(ReconcileOutcome::NoChange);
        };

        let user = self
            .store
            .get_user(bucket.user_id)
            .await?
            .ok_or_else(|| EngineError::NotFound(format!("user {}", bucket.user_id)))?;

        let record = match self
            .ledger
            .fetch_payment_history(&user.user_key, account_ref)
            .await
        {
            Ok(record) => record,
            Err(e) if e.is_terminal() => {
                return self
                    .mark_failed(bucket, "the ledger no longer recognizes the account")
                    .await;
            }
            // Transient: leave the bucket untouched; the next scheduled
            // cycle is the retry mechanism.
            Err(e) => return Err(e.into()),
        };

        let facts = PaymentFacts::from_record(&record, self.today())?;

        if facts.is_expired {
            return self.mark_success(bucket).await;
        }

        if Self::has_progress_changed(bucket, &facts) {
            return self.apply_progress(bucket, &facts).await;
        }

        Ok(ReconcileOutcome::NoChange)
    }
}
