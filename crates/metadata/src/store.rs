//! Metadata store trait and the SQLite implementation.

use crate::error::{MetadataError, MetadataResult};
use crate::models::{
    AchievementRow, AchievementUnlockRow, BucketRow, InventoryItemRow, NotificationRow,
    RewardItemRow, UserMetricsRow, UserRow,
};
use crate::repos::buckets::FinalizeResult;
use crate::repos::{
    AchievementRepo, BucketRepo, InventoryRepo, MetricsRepo, NotificationRepo, UserRepo,
};
use async_trait::async_trait;
use moneypot_core::{BucketProgressUpdate, BucketStatus, MetricName};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use time::OffsetDateTime;
use uuid::Uuid;

/// Combined metadata store trait.
#[async_trait]
pub trait MetadataStore:
    BucketRepo
    + UserRepo
    + MetricsRepo
    + AchievementRepo
    + InventoryRepo
    + NotificationRepo
    + Send
    + Sync
{
    /// Run database migrations.
    async fn migrate(&self) -> MetadataResult<()>;

    /// Check database connectivity and health.
    async fn health_check(&self) -> MetadataResult<()>;
}

/// SQLite-based metadata store.
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Create a new SQLite store and run migrations.
    pub async fn new(path: impl AsRef<Path>) -> MetadataResult<Self> {
        let path = path.as_ref();

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let opts = SqliteConnectOptions::from_str(&format!("sqlite:{}?mode=rwc", path.display()))?
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            .synchronous(sqlx::sqlite::SqliteSynchronous::Normal)
            .foreign_keys(true)
            // Prevent transient "database is locked" errors under concurrent access.
            .busy_timeout(Duration::from_secs(5));

        let pool = SqlitePoolOptions::new()
            // SQLite permits limited write concurrency; a single connection
            // avoids persistent "database is locked" failures under the
            // scheduler's concurrent batches.
            .max_connections(1)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }
}

#[async_trait]
impl MetadataStore for SqliteStore {
    async fn migrate(&self) -> MetadataResult<()> {
        for statement in schema_statements(SCHEMA_SQL) {
            sqlx::query(statement).execute(&self.pool).await?;
        }
        Ok(())
    }

    async fn health_check(&self) -> MetadataResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

fn schema_statements(schema: &str) -> Vec<&str> {
    schema
        .split(';')
        .filter_map(|statement| {
            let trimmed = statement.trim();
            if trimmed.is_empty() {
                return None;
            }
            let has_sql = trimmed.lines().any(|line| {
                let line = line.trim();
                !line.is_empty() && !line.starts_with("--")
            });
            has_sql.then_some(trimmed)
        })
        .collect()
}

// =============================================================================
// BucketRepo
// =============================================================================

#[async_trait]
impl BucketRepo for SqliteStore {
    async fn create_bucket(&self, bucket: &BucketRow) -> MetadataResult<()> {
        sqlx::query(
            "INSERT INTO buckets (
                bucket_id, user_id, name, status, target_amount, total_payment,
                success_payment, fail_payment, last_progress_date, account_ref,
                is_challenge, created_at, updated_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(bucket.bucket_id)
        .bind(bucket.user_id)
        .bind(&bucket.name)
        .bind(&bucket.status)
        .bind(bucket.target_amount)
        .bind(bucket.total_payment)
        .bind(bucket.success_payment)
        .bind(bucket.fail_payment)
        .bind(&bucket.last_progress_date)
        .bind(&bucket.account_ref)
        .bind(bucket.is_challenge)
        .bind(bucket.created_at)
        .bind(bucket.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_bucket(&self, bucket_id: Uuid) -> MetadataResult<Option<BucketRow>> {
        let row = sqlx::query_as::<_, BucketRow>("SELECT * FROM buckets WHERE bucket_id = ?")
            .bind(bucket_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn list_active_buckets(&self) -> MetadataResult<Vec<BucketRow>> {
        let rows = sqlx::query_as::<_, BucketRow>(
            "SELECT * FROM buckets
             WHERE status = 'in_progress' AND account_ref IS NOT NULL
             ORDER BY created_at, bucket_id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn update_progress(
        &self,
        bucket_id: Uuid,
        update: &BucketProgressUpdate,
        updated_at: OffsetDateTime,
    ) -> MetadataResult<bool> {
        // Guarded by status so a concurrent terminal transition wins.
        let result = sqlx::query(
            "UPDATE buckets
             SET success_payment = ?, fail_payment = ?, last_progress_date = ?, updated_at = ?
             WHERE bucket_id = ? AND status = 'in_progress'",
        )
        .bind(update.success_payment)
        .bind(update.fail_payment)
        .bind(update.last_progress_date.map(|d| d.to_string()))
        .bind(updated_at)
        .bind(bucket_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn finalize_bucket(
        &self,
        bucket_id: Uuid,
        status: &str,
        updated_at: OffsetDateTime,
    ) -> MetadataResult<FinalizeResult> {
        // Validate the target status before writing anything.
        let target = BucketStatus::parse(status)?;
        if target.is_active() {
            return Err(MetadataError::Constraint(format!(
                "finalize_bucket cannot transition to {status}"
            )));
        }

        // Atomically read and transition inside one transaction. The write
        // acquires SQLite's exclusive lock, so a scheduled sweep and an
        // on-demand sync cannot both apply a transition to the same bucket.
        let mut tx = self.pool.begin().await?;

        let bucket = sqlx::query_as::<_, BucketRow>("SELECT * FROM buckets WHERE bucket_id = ?")
            .bind(bucket_id)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(mut bucket) = bucket else {
            tx.commit().await?;
            return Ok(FinalizeResult::NotFound);
        };

        if bucket.status != BucketStatus::InProgress.as_str() {
            tx.commit().await?;
            return Ok(FinalizeResult::AlreadyTerminal(bucket));
        }

        let result = sqlx::query(
            "UPDATE buckets
             SET status = ?, account_ref = NULL, updated_at = ?
             WHERE bucket_id = ? AND status = 'in_progress'",
        )
        .bind(status)
        .bind(updated_at)
        .bind(bucket_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        if result.rows_affected() > 0 {
            bucket.status = status.to_string();
            bucket.account_ref = None;
            bucket.updated_at = updated_at;
            Ok(FinalizeResult::Applied(bucket))
        } else {
            Ok(FinalizeResult::AlreadyTerminal(bucket))
        }
    }
}

// =============================================================================
// UserRepo
// =============================================================================

#[async_trait]
impl UserRepo for SqliteStore {
    async fn create_user(&self, user: &UserRow) -> MetadataResult<()> {
        sqlx::query(
            "INSERT INTO users (user_id, nickname, user_key, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(user.user_id)
        .bind(&user.nickname)
        .bind(&user.user_key)
        .bind(user.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn get_user(&self, user_id: Uuid) -> MetadataResult<Option<UserRow>> {
        let row = sqlx::query_as::<_, UserRow>("SELECT * FROM users WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }
}

// =============================================================================
// MetricsRepo
// =============================================================================

#[async_trait]
impl MetricsRepo for SqliteStore {
    async fn create_metrics(&self, user_id: Uuid, now: OffsetDateTime) -> MetadataResult<()> {
        sqlx::query(
            "INSERT INTO user_metrics (user_id, updated_at) VALUES (?, ?)
             ON CONFLICT(user_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(now)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn increment_metrics(
        &self,
        user_id: Uuid,
        deltas: &[(MetricName, i64)],
        updated_at: OffsetDateTime,
    ) -> MetadataResult<UserMetricsRow> {
        if deltas.is_empty() {
            return self
                .get_metrics(user_id)
                .await?
                .ok_or_else(|| MetadataError::NotFound(format!("user_metrics {user_id}")));
        }

        // Column names come from the closed MetricName enum, never from
        // caller input, so assembling the SET clause by name is safe.
        let mut assignments: Vec<String> = deltas
            .iter()
            .map(|(metric, _)| format!("{col} = {col} + ?", col = metric.as_str()))
            .collect();
        assignments.push("updated_at = ?".to_string());

        let sql = format!(
            "UPDATE user_metrics SET {} WHERE user_id = ? RETURNING *",
            assignments.join(", ")
        );

        let mut query = sqlx::query_as::<_, UserMetricsRow>(&sql);
        for (_, delta) in deltas {
            query = query.bind(delta);
        }
        let row = query
            .bind(updated_at)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.ok_or_else(|| MetadataError::NotFound(format!("user_metrics {user_id}")))
    }

    async fn get_metrics(&self, user_id: Uuid) -> MetadataResult<Option<UserMetricsRow>> {
        let row = sqlx::query_as::<_, UserMetricsRow>(
            "SELECT * FROM user_metrics WHERE user_id = ?",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row)
    }
}

// =============================================================================
// AchievementRepo
// =============================================================================

#[async_trait]
impl AchievementRepo for SqliteStore {
    async fn create_achievement(&self, achievement: &AchievementRow) -> MetadataResult<()> {
        sqlx::query(
            "INSERT INTO achievements (
                achievement_id, code, title, description, condition, locality,
                is_active, created_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(achievement.achievement_id)
        .bind(&achievement.code)
        .bind(&achievement.title)
        .bind(&achievement.description)
        .bind(&achievement.condition)
        .bind(&achievement.locality)
        .bind(achievement.is_active)
        .bind(achievement.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn create_reward_item(&self, item: &RewardItemRow) -> MetadataResult<()> {
        sqlx::query(
            "INSERT INTO reward_items (item_id, name, item_type, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(item.item_id)
        .bind(&item.name)
        .bind(&item.item_type)
        .bind(item.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn attach_reward(
        &self,
        achievement_id: Uuid,
        item_id: Uuid,
        position: i32,
    ) -> MetadataResult<()> {
        sqlx::query(
            "INSERT INTO achievement_rewards (achievement_id, position, item_id) VALUES (?, ?, ?)",
        )
        .bind(achievement_id)
        .bind(position)
        .bind(item_id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_locked_active(&self, user_id: Uuid) -> MetadataResult<Vec<AchievementRow>> {
        let rows = sqlx::query_as::<_, AchievementRow>(
            "SELECT a.* FROM achievements a
             LEFT JOIN achievement_unlocks u
               ON a.achievement_id = u.achievement_id AND u.user_id = ?
             WHERE u.user_id IS NULL AND a.is_active = 1
             ORDER BY a.created_at, a.achievement_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn rewards_for_achievement(
        &self,
        achievement_id: Uuid,
    ) -> MetadataResult<Vec<RewardItemRow>> {
        let rows = sqlx::query_as::<_, RewardItemRow>(
            "SELECT ri.* FROM achievement_rewards ar
             JOIN reward_items ri ON ar.item_id = ri.item_id
             WHERE ar.achievement_id = ?
             ORDER BY ar.position",
        )
        .bind(achievement_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn insert_unlock(&self, unlock: &AchievementUnlockRow) -> MetadataResult<bool> {
        // The UNIQUE(user_id, achievement_id) primary key plus DO NOTHING
        // makes concurrent triggers race safely: exactly one caller sees
        // rows_affected = 1.
        let result = sqlx::query(
            "INSERT INTO achievement_unlocks (user_id, achievement_id, unlocked_at, meta)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(user_id, achievement_id) DO NOTHING",
        )
        .bind(unlock.user_id)
        .bind(unlock.achievement_id)
        .bind(unlock.unlocked_at)
        .bind(&unlock.meta)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_unlocks(&self, user_id: Uuid) -> MetadataResult<Vec<AchievementUnlockRow>> {
        let rows = sqlx::query_as::<_, AchievementUnlockRow>(
            "SELECT * FROM achievement_unlocks WHERE user_id = ?
             ORDER BY unlocked_at DESC, achievement_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

// =============================================================================
// InventoryRepo
// =============================================================================

#[async_trait]
impl InventoryRepo for SqliteStore {
    async fn grant_item(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        item_type: &str,
        acquired_at: OffsetDateTime,
    ) -> MetadataResult<bool> {
        let result = sqlx::query(
            "INSERT INTO user_inventory (user_id, item_id, item_type, acquired_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(user_id, item_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(item_id)
        .bind(item_type)
        .bind(acquired_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_inventory(&self, user_id: Uuid) -> MetadataResult<Vec<InventoryItemRow>> {
        let rows = sqlx::query_as::<_, InventoryItemRow>(
            "SELECT * FROM user_inventory WHERE user_id = ? ORDER BY acquired_at, item_id",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }
}

// =============================================================================
// NotificationRepo
// =============================================================================

#[async_trait]
impl NotificationRepo for SqliteStore {
    async fn create_notification(&self, notification: &NotificationRow) -> MetadataResult<()> {
        sqlx::query(
            "INSERT INTO notifications (
                notification_id, user_id, kind, title, message,
                related_bucket_id, related_achievement_id, is_read, read_at, created_at
             ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(notification.notification_id)
        .bind(notification.user_id)
        .bind(&notification.kind)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.related_bucket_id)
        .bind(notification.related_achievement_id)
        .bind(notification.is_read)
        .bind(notification.read_at)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_notifications(
        &self,
        user_id: Uuid,
        limit: u32,
    ) -> MetadataResult<Vec<NotificationRow>> {
        let rows = sqlx::query_as::<_, NotificationRow>(
            "SELECT * FROM notifications WHERE user_id = ?
             ORDER BY created_at DESC, notification_id LIMIT ?",
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn count_unread(&self, user_id: Uuid) -> MetadataResult<u64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count as u64)
    }

    async fn mark_read(
        &self,
        notification_id: Uuid,
        read_at: OffsetDateTime,
    ) -> MetadataResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET is_read = 1, read_at = ?
             WHERE notification_id = ? AND is_read = 0",
        )
        .bind(read_at)
        .bind(notification_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// SQL schema for SQLite.
const SCHEMA_SQL: &str = r#"
-- Users (created by the registration collaborator)
CREATE TABLE IF NOT EXISTS users (
    user_id BLOB PRIMARY KEY,
    nickname TEXT NOT NULL,
    user_key TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Savings buckets
CREATE TABLE IF NOT EXISTS buckets (
    bucket_id BLOB PRIMARY KEY,
    user_id BLOB NOT NULL REFERENCES users(user_id),
    name TEXT NOT NULL,
    status TEXT NOT NULL DEFAULT 'in_progress'
        CHECK (status IN ('in_progress', 'success', 'failed')),
    target_amount INTEGER NOT NULL,
    total_payment INTEGER NOT NULL,
    success_payment INTEGER NOT NULL DEFAULT 0,
    fail_payment INTEGER NOT NULL DEFAULT 0,
    last_progress_date TEXT,
    account_ref TEXT,
    is_challenge INTEGER NOT NULL DEFAULT 0,
    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    -- The account reference exists exactly while the bucket is in progress.
    CHECK ((status = 'in_progress') = (account_ref IS NOT NULL)),
    CHECK (success_payment + fail_payment <= total_payment)
);
CREATE INDEX IF NOT EXISTS idx_buckets_active
    ON buckets(status) WHERE status = 'in_progress';
CREATE INDEX IF NOT EXISTS idx_buckets_user ON buckets(user_id);

-- Per-user lifetime counters (one row per user, relative increments only)
CREATE TABLE IF NOT EXISTS user_metrics (
    user_id BLOB PRIMARY KEY REFERENCES users(user_id),
    buckets_created INTEGER NOT NULL DEFAULT 0,
    likes_given INTEGER NOT NULL DEFAULT 0,
    likes_received INTEGER NOT NULL DEFAULT 0,
    comments_made INTEGER NOT NULL DEFAULT 0,
    bucket_pushes INTEGER NOT NULL DEFAULT 0,
    buckets_completed INTEGER NOT NULL DEFAULT 0,
    challenges_completed INTEGER NOT NULL DEFAULT 0,
    updated_at TEXT NOT NULL
);

-- Achievement definitions (read-only to the engine)
CREATE TABLE IF NOT EXISTS achievements (
    achievement_id BLOB PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    title TEXT NOT NULL,
    description TEXT NOT NULL,
    condition TEXT NOT NULL,
    locality TEXT NOT NULL CHECK (locality IN ('active', 'passive')),
    is_active INTEGER NOT NULL DEFAULT 1,
    created_at TEXT NOT NULL
);

-- Cosmetic reward item catalog
CREATE TABLE IF NOT EXISTS reward_items (
    item_id BLOB PRIMARY KEY,
    name TEXT NOT NULL,
    item_type TEXT NOT NULL,
    created_at TEXT NOT NULL
);

-- Ordered reward list per achievement
CREATE TABLE IF NOT EXISTS achievement_rewards (
    achievement_id BLOB NOT NULL REFERENCES achievements(achievement_id),
    position INTEGER NOT NULL,
    item_id BLOB NOT NULL REFERENCES reward_items(item_id),
    PRIMARY KEY (achievement_id, position)
);

-- One-time unlock records: the exactly-once contract lives in this key
CREATE TABLE IF NOT EXISTS achievement_unlocks (
    user_id BLOB NOT NULL REFERENCES users(user_id),
    achievement_id BLOB NOT NULL REFERENCES achievements(achievement_id),
    unlocked_at TEXT NOT NULL,
    meta TEXT,
    PRIMARY KEY (user_id, achievement_id)
);

-- User-owned reward items (idempotent grants)
CREATE TABLE IF NOT EXISTS user_inventory (
    user_id BLOB NOT NULL REFERENCES users(user_id),
    item_id BLOB NOT NULL REFERENCES reward_items(item_id),
    item_type TEXT NOT NULL,
    acquired_at TEXT NOT NULL,
    PRIMARY KEY (user_id, item_id)
);

-- Notifications (read state fixed at creation)
CREATE TABLE IF NOT EXISTS notifications (
    notification_id BLOB PRIMARY KEY,
    user_id BLOB NOT NULL REFERENCES users(user_id),
    kind TEXT NOT NULL,
    title TEXT NOT NULL,
    message TEXT NOT NULL,
    related_bucket_id BLOB,
    related_achievement_id BLOB,
    is_read INTEGER NOT NULL DEFAULT 0,
    read_at TEXT,
    created_at TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_notifications_user
    ON notifications(user_id, created_at DESC);
CREATE INDEX IF NOT EXISTS idx_notifications_unread
    ON notifications(user_id) WHERE is_read = 0;
"#;
