//! Common test utilities and fixtures.

use moneypot_metadata::models::{AchievementRow, BucketRow, RewardItemRow, UserRow};
use moneypot_metadata::{MetadataResult, MetadataStore, SqliteStore};
use std::sync::Arc;
use tempfile::TempDir;
use time::OffsetDateTime;
use uuid::Uuid;

/// A test metadata store backed by a temp-dir SQLite file, cleaned up on drop.
pub struct TestMetadata {
    pub store: Arc<dyn MetadataStore>,
    _temp_dir: TempDir,
}

impl TestMetadata {
    pub async fn new() -> MetadataResult<Self> {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let store = SqliteStore::new(&db_path).await?;
        Ok(Self {
            store: Arc::new(store),
            _temp_dir: temp_dir,
        })
    }

    pub fn store(&self) -> Arc<dyn MetadataStore> {
        self.store.clone()
    }
}

/// Create a user with initialized metric counters.
pub async fn seed_user(store: &dyn MetadataStore, nickname: &str) -> UserRow {
    let now = OffsetDateTime::now_utc();
    let user = UserRow {
        user_id: Uuid::new_v4(),
        nickname: nickname.to_string(),
        user_key: format!("key-{nickname}"),
        created_at: now,
    };
    store.create_user(&user).await.expect("create user");
    store
        .create_metrics(user.user_id, now)
        .await
        .expect("create metrics");
    user
}

/// An in-progress bucket with a linked account, satisfying the schema's
/// status/account invariant.
pub fn in_progress_bucket(user_id: Uuid, name: &str) -> BucketRow {
    let now = OffsetDateTime::now_utc();
    BucketRow {
        bucket_id: Uuid::new_v4(),
        user_id,
        name: name.to_string(),
        status: "in_progress".to_string(),
        target_amount: 1_000_000,
        total_payment: 52,
        success_payment: 0,
        fail_payment: 0,
        last_progress_date: None,
        account_ref: Some(format!("0012-{name}")),
        is_challenge: false,
        created_at: now,
        updated_at: now,
    }
}

#[allow(dead_code)]
pub fn achievement(code: &str, metric: &str, threshold: u64, locality: &str) -> AchievementRow {
    AchievementRow {
        achievement_id: Uuid::new_v4(),
        code: code.to_string(),
        title: format!("Achievement {code}"),
        description: format!("Reach {threshold} {metric}"),
        condition: format!(r#"{{"metric": "{metric}", "threshold": {threshold}}}"#),
        locality: locality.to_string(),
        is_active: true,
        created_at: OffsetDateTime::now_utc(),
    }
}

#[allow(dead_code)]
pub fn reward_item(name: &str, item_type: &str) -> RewardItemRow {
    RewardItemRow {
        item_id: Uuid::new_v4(),
        name: name.to_string(),
        item_type: item_type.to_string(),
        created_at: OffsetDateTime::now_utc(),
    }
}
