//! Savings bucket repository.

use crate::error::MetadataResult;
use crate::models::BucketRow;
use async_trait::async_trait;
use moneypot_core::BucketProgressUpdate;
use time::OffsetDateTime;
use uuid::Uuid;

/// Result of a terminal-transition attempt on a bucket.
#[derive(Debug, Clone)]
pub enum FinalizeResult {
    /// This call performed the transition; the row reflects the new state.
    Applied(BucketRow),
    /// Another writer already finalized the bucket; the row is returned
    /// untouched and the caller must not emit side effects.
    AlreadyTerminal(BucketRow),
    /// The bucket does not exist.
    NotFound,
}

/// Repository for bucket operations.
#[async_trait]
pub trait BucketRepo: Send + Sync {
    /// Create a new bucket.
    async fn create_bucket(&self, bucket: &BucketRow) -> MetadataResult<()>;

    /// Get a bucket by ID.
    async fn get_bucket(&self, bucket_id: Uuid) -> MetadataResult<Option<BucketRow>>;

    /// Get all buckets eligible for reconciliation: `status = 'in_progress'`
    /// with a non-null account reference, in stable creation order.
    async fn list_active_buckets(&self) -> MetadataResult<Vec<BucketRow>>;

    /// Apply a payment-progress partial update to an in-progress bucket.
    ///
    /// Touches only the three mutable progress fields; the update is
    /// guarded by `status = 'in_progress'` so a concurrent terminal
    /// transition cannot be overwritten. Returns whether a row changed.
    async fn update_progress(
        &self,
        bucket_id: Uuid,
        update: &BucketProgressUpdate,
        updated_at: OffsetDateTime,
    ) -> MetadataResult<bool>;

    /// Atomically transition a bucket to a terminal status, clearing its
    /// account reference in the same statement.
    ///
    /// The read and the guarded update run in one transaction, so a
    /// scheduled sweep and an on-demand sync racing on the same bucket
    /// resolve to exactly one `Applied`.
    async fn finalize_bucket(
        &self,
        bucket_id: Uuid,
        status: &str,
        updated_at: OffsetDateTime,
    ) -> MetadataResult<FinalizeResult>;
}
