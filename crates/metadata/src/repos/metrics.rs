//! User metrics repository.

use crate::error::MetadataResult;
use crate::models::UserMetricsRow;
use async_trait::async_trait;
use moneypot_core::MetricName;
use time::OffsetDateTime;
use uuid::Uuid;

/// Repository for per-user metric counters.
#[async_trait]
pub trait MetricsRepo: Send + Sync {
    /// Create the zeroed metrics row for a new user. Idempotent.
    async fn create_metrics(&self, user_id: Uuid, now: OffsetDateTime) -> MetadataResult<()>;

    /// Apply relative increments server-side and return the post-increment
    /// row. Never a read-modify-write from application memory, so
    /// concurrent action sources cannot lose updates.
    async fn increment_metrics(
        &self,
        user_id: Uuid,
        deltas: &[(MetricName, i64)],
        updated_at: OffsetDateTime,
    ) -> MetadataResult<UserMetricsRow>;

    /// Get a user's metrics row.
    async fn get_metrics(&self, user_id: Uuid) -> MetadataResult<Option<UserMetricsRow>>;
}
