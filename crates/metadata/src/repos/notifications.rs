//! Notification repository.

use crate::error::MetadataResult;
use crate::models::NotificationRow;
use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

/// Repository for notification records.
#[async_trait]
pub trait NotificationRepo: Send + Sync {
    /// Persist a notification. Read state is fixed at creation.
    async fn create_notification(&self, notification: &NotificationRow) -> MetadataResult<()>;

    /// List a user's notifications, most recent first.
    async fn list_notifications(
        &self,
        user_id: Uuid,
        limit: u32,
    ) -> MetadataResult<Vec<NotificationRow>>;

    /// Count a user's unread notifications.
    async fn count_unread(&self, user_id: Uuid) -> MetadataResult<u64>;

    /// Mark a notification as read. Returns whether a row changed (false
    /// if it was already read or does not exist).
    async fn mark_read(
        &self,
        notification_id: Uuid,
        read_at: OffsetDateTime,
    ) -> MetadataResult<bool>;
}
