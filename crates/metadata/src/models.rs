//! Database models mapping to the metadata schema.

use moneypot_core::MetricName;
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

// =============================================================================
// Users
// =============================================================================

/// User record. Created at registration time by an external collaborator;
/// this core only reads it to resolve ledger credentials.
#[derive(Debug, Clone, FromRow)]
pub struct UserRow {
    pub user_id: Uuid,
    pub nickname: String,
    /// Opaque credential presented to the ledger on the user's behalf.
    pub user_key: String,
    pub created_at: OffsetDateTime,
}

// =============================================================================
// Buckets
// =============================================================================

/// Savings bucket record.
///
/// Invariants: `account_ref` is non-null exactly while `status` is
/// `in_progress`; terminal statuses are immutable. Both are enforced by
/// the store's guarded updates plus a schema CHECK.
#[derive(Debug, Clone, FromRow)]
pub struct BucketRow {
    pub bucket_id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub status: String,
    pub target_amount: i64,
    /// Total scheduled deposits over the bucket's lifetime.
    pub total_payment: i32,
    pub success_payment: i32,
    pub fail_payment: i32,
    /// Most recent deposit date (`YYYYMMDD`), if any deposit happened yet.
    pub last_progress_date: Option<String>,
    /// Reference to the externally held account, present only while the
    /// bucket is in progress.
    pub account_ref: Option<String>,
    pub is_challenge: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

// =============================================================================
// User metrics
// =============================================================================

/// Per-user lifetime counters. One row per user, created at registration;
/// mutated only by relative increments.
#[derive(Debug, Clone, FromRow)]
pub struct UserMetricsRow {
    pub user_id: Uuid,
    pub buckets_created: i64,
    pub likes_given: i64,
    pub likes_received: i64,
    pub comments_made: i64,
    pub bucket_pushes: i64,
    pub buckets_completed: i64,
    pub challenges_completed: i64,
    pub updated_at: OffsetDateTime,
}

impl UserMetricsRow {
    /// Current value of a named counter.
    pub fn value(&self, metric: MetricName) -> i64 {
        match metric {
            MetricName::BucketsCreated => self.buckets_created,
            MetricName::LikesGiven => self.likes_given,
            MetricName::LikesReceived => self.likes_received,
            MetricName::CommentsMade => self.comments_made,
            MetricName::BucketPushes => self.bucket_pushes,
            MetricName::BucketsCompleted => self.buckets_completed,
            MetricName::ChallengesCompleted => self.challenges_completed,
        }
    }
}

// =============================================================================
// Achievements and rewards
// =============================================================================

/// Achievement definition. Read-only to the engine.
#[derive(Debug, Clone, FromRow)]
pub struct AchievementRow {
    pub achievement_id: Uuid,
    pub code: String,
    pub title: String,
    pub description: String,
    /// JSON `{"metric": ..., "threshold": ...}`, validated at load.
    pub condition: String,
    /// `active` or `passive`; decides the unlock notification's read state.
    pub locality: String,
    pub is_active: bool,
    pub created_at: OffsetDateTime,
}

/// Cosmetic reward item catalog entry.
#[derive(Debug, Clone, FromRow)]
pub struct RewardItemRow {
    pub item_id: Uuid,
    pub name: String,
    pub item_type: String,
    pub created_at: OffsetDateTime,
}

/// One-time unlock record: at most one row per (user, achievement).
#[derive(Debug, Clone, FromRow)]
pub struct AchievementUnlockRow {
    pub user_id: Uuid,
    pub achievement_id: Uuid,
    pub unlocked_at: OffsetDateTime,
    pub meta: Option<String>,
}

/// Item owned by a user.
#[derive(Debug, Clone, FromRow)]
pub struct InventoryItemRow {
    pub user_id: Uuid,
    pub item_id: Uuid,
    pub item_type: String,
    pub acquired_at: OffsetDateTime,
}

// =============================================================================
// Notifications
// =============================================================================

/// Notification record. Read state is fixed at creation time.
#[derive(Debug, Clone, FromRow)]
pub struct NotificationRow {
    pub notification_id: Uuid,
    pub user_id: Uuid,
    pub kind: String,
    pub title: String,
    pub message: String,
    pub related_bucket_id: Option<Uuid>,
    pub related_achievement_id: Option<Uuid>,
    pub is_read: bool,
    pub read_at: Option<OffsetDateTime>,
    pub created_at: OffsetDateTime,
}
