//! User inventory repository.

use crate::error::MetadataResult;
use crate::models::InventoryItemRow;
use async_trait::async_trait;
use time::OffsetDateTime;
use uuid::Uuid;

/// Repository for user-owned reward items.
#[async_trait]
pub trait InventoryRepo: Send + Sync {
    /// Grant an item to a user. Idempotent: returns `true` if the item was
    /// newly granted, `false` if the user already owned it.
    async fn grant_item(
        &self,
        user_id: Uuid,
        item_id: Uuid,
        item_type: &str,
        acquired_at: OffsetDateTime,
    ) -> MetadataResult<bool>;

    /// List a user's inventory in acquisition order.
    async fn list_inventory(&self, user_id: Uuid) -> MetadataResult<Vec<InventoryItemRow>>;
}
