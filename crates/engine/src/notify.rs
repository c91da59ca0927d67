//! Notification rendering and persistence.

use crate::error::EngineResult;
use crate::pipeline::Achievement;
use moneypot_core::{Locality, NotificationKind};
use moneypot_metadata::MetadataStore;
use moneypot_metadata::models::{BucketRow, NotificationRow};
use serde_json::{Value, json};
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

/// Renders a notification from a per-kind template and persists it.
///
/// Read state is decided at creation time and never inferred from the
/// call site: achievement notifications follow the achievement's
/// locality, everything else is created unread.
#[derive(Clone)]
pub struct NotificationEmitter {
    store: Arc<dyn MetadataStore>,
}

impl NotificationEmitter {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        Self { store }
    }

    /// Render and persist a notification.
    pub async fn emit(
        &self,
        user_id: Uuid,
        kind: NotificationKind,
        payload: &Value,
        related_bucket_id: Option<Uuid>,
        related_achievement_id: Option<Uuid>,
        pre_read: bool,
    ) -> EngineResult<NotificationRow> {
        let (title, message) = kind.render(payload)?;
        let now = OffsetDateTime::now_utc();
        let notification = NotificationRow {
            notification_id: Uuid::new_v4(),
            user_id,
            kind: kind.as_str().to_string(),
            title,
            message,
            related_bucket_id,
            related_achievement_id,
            is_read: pre_read,
            read_at: pre_read.then_some(now),
            created_at: now,
        };
        self.store.create_notification(&notification).await?;
        tracing::debug!(
            user_id = %user_id,
            kind = kind.as_str(),
            pre_read,
            "notification created"
        );
        Ok(notification)
    }

    /// Notify an increase in a bucket's successful deposit count. The
    /// increase is reported once, named by its size, not per payment.
    pub async fn payment_success(
        &self,
        bucket: &BucketRow,
        count: u32,
    ) -> EngineResult<NotificationRow> {
        self.emit(
            bucket.user_id,
            NotificationKind::PaymentSuccess,
            &json!({ "bucket_name": bucket.name, "count": count }),
            Some(bucket.bucket_id),
            None,
            false,
        )
        .await
    }

    /// Notify a deposit failure (an increase in failed deposits, or the
    /// terminal loss of ledger access).
    pub async fn payment_failed(
        &self,
        bucket: &BucketRow,
        reason: &str,
    ) -> EngineResult<NotificationRow> {
        self.emit(
            bucket.user_id,
            NotificationKind::PaymentFailed,
            &json!({ "bucket_name": bucket.name, "reason": reason }),
            Some(bucket.bucket_id),
            None,
            false,
        )
        .await
    }

    /// Notify that a bucket reached the end of its schedule.
    pub async fn bucket_completed(&self, bucket: &BucketRow) -> EngineResult<NotificationRow> {
        self.emit(
            bucket.user_id,
            NotificationKind::BucketCompleted,
            &json!({ "bucket_name": bucket.name }),
            Some(bucket.bucket_id),
            None,
            false,
        )
        .await
    }

    /// Notify an achievement unlock. Pre-read exactly when the
    /// achievement is classified `active` (the recipient performed the
    /// qualifying action themselves).
    pub async fn achievement_unlocked(
        &self,
        user_id: Uuid,
        achievement: &Achievement,
    ) -> EngineResult<NotificationRow> {
        self.emit(
            user_id,
            NotificationKind::Achievement,
            &json!({ "achievement_title": achievement.title }),
            None,
            Some(achievement.id),
            achievement.locality == Locality::Active,
        )
        .await
    }
}
