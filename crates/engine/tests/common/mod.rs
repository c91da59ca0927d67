//! Common test utilities: store harness, scripted ledger, fixtures.

// Each test binary compiles this module separately, so helpers unused by
// one binary are not dead code overall.
#![allow(dead_code)]

use async_trait::async_trait;
use moneypot_core::payment::{PaymentEntry, PaymentRecord};
use moneypot_ledger::{LedgerError, LedgerPort, LedgerResult};
use moneypot_metadata::models::{AchievementRow, BucketRow, RewardItemRow, UserRow};
use moneypot_metadata::{MetadataStore, SqliteStore};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;
use time::OffsetDateTime;
use uuid::Uuid;

/// Expiry far enough out that "today" never passes it.
pub const FUTURE_EXPIRY: &str = "29991231";
/// Expiry safely in the past.
pub const PAST_EXPIRY: &str = "20200101";

/// Temp-dir SQLite store that cleans up on drop.
pub struct TestStore {
    pub store: Arc<dyn MetadataStore>,
    _temp_dir: TempDir,
}

impl TestStore {
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test.db");
        let store = SqliteStore::new(&db_path).await.expect("Failed to open store");
        Self {
            store: Arc::new(store),
            _temp_dir: temp_dir,
        }
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

/// An in-progress bucket with a linked account.
pub async fn seed_bucket(store: &dyn MetadataStore, user_id: Uuid, name: &str) -> BucketRow {
    let now = OffsetDateTime::now_utc();
    let bucket = BucketRow {
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
    };
    store.create_bucket(&bucket).await.expect("create bucket");
    bucket
}

/// Register an achievement definition, optionally with one reward item.
pub async fn seed_achievement(
    store: &dyn MetadataStore,
    code: &str,
    metric: &str,
    threshold: u64,
    locality: &str,
    reward: Option<&str>,
) -> AchievementRow {
    let now = OffsetDateTime::now_utc();
    let achievement = AchievementRow {
        achievement_id: Uuid::new_v4(),
        code: code.to_string(),
        title: format!("Achievement {code}"),
        description: format!("Reach {threshold} {metric}"),
        condition: format!(r#"{{"metric": "{metric}", "threshold": {threshold}}}"#),
        locality: locality.to_string(),
        is_active: true,
        created_at: now,
    };
    store
        .create_achievement(&achievement)
        .await
        .expect("create achievement");

    if let Some(name) = reward {
        let item = RewardItemRow {
            item_id: Uuid::new_v4(),
            name: name.to_string(),
            item_type: "decoration".to_string(),
            created_at: now,
        };
        store.create_reward_item(&item).await.expect("create item");
        store
            .attach_reward(achievement.achievement_id, item.item_id, 0)
            .await
            .expect("attach reward");
    }
    achievement
}

/// Build a payment record with the given success/fail counts. Payment
/// dates count up from an arbitrary base so the maximum is deterministic.
pub fn payment_record(success: u32, fail: u32, expiry: &str) -> PaymentRecord {
    let mut payments = Vec::new();
    let mut day = 1u32;
    for _ in 0..success {
        payments.push(PaymentEntry {
            status: "SUCCESS".to_string(),
            payment_date: format!("202505{day:02}"),
        });
        day += 1;
    }
    for _ in 0..fail {
        payments.push(PaymentEntry {
            status: "FAIL".to_string(),
            payment_date: format!("202505{day:02}"),
        });
        day += 1;
    }
    PaymentRecord {
        payments,
        account_expiry_date: expiry.to_string(),
        total_balance: Some((success as i64 * 10_000).to_string()),
    }
}

/// One scripted ledger reply.
pub enum Scripted {
    Record(PaymentRecord),
    Terminal(u16),
    Transient,
}

impl Scripted {
    fn into_result(self) -> LedgerResult<PaymentRecord> {
        match self {
            Self::Record(record) => Ok(record),
            Self::Terminal(status) => Err(LedgerError::Access {
                status,
                body: "record gone".to_string(),
            }),
            Self::Transient => Err(LedgerError::Transient("connection reset".to_string())),
        }
    }
}

/// Ledger double with per-account scripted replies. The last reply for an
/// account repeats once its queue drains, so reruns stay deterministic.
pub struct MockLedger {
    scripts: Mutex<HashMap<String, VecDeque<Scripted>>>,
    calls: AtomicUsize,
}

impl MockLedger {
    pub fn new() -> Self {
        Self {
            scripts: Mutex::new(HashMap::new()),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn script(&self, account_ref: &str, reply: Scripted) {
        self.scripts
            .lock()
            .unwrap()
            .entry(account_ref.to_string())
            .or_default()
            .push_back(reply);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LedgerPort for MockLedger {
    async fn fetch_payment_history(
        &self,
        _user_key: &str,
        account_ref: &str,
    ) -> LedgerResult<PaymentRecord> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut scripts = self.scripts.lock().unwrap();
        let queue = scripts
            .get_mut(account_ref)
            .unwrap_or_else(|| panic!("no scripted reply for account {account_ref}"));
        let reply = if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            // Re-script the final reply so repeated sweeps see it again.
            match queue.front().expect("script queue exhausted") {
                Scripted::Record(record) => Scripted::Record(record.clone()),
                Scripted::Terminal(status) => Scripted::Terminal(*status),
                Scripted::Transient => Scripted::Transient,
            }
        };
        reply.into_result()
    }
}
