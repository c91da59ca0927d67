//! Achievement repository.

use crate::error::MetadataResult;
use crate::models::{AchievementRow, AchievementUnlockRow, RewardItemRow};
use async_trait::async_trait;
use uuid::Uuid;

/// Repository for achievement definitions, unlocks, and rewards.
#[async_trait]
pub trait AchievementRepo: Send + Sync {
    /// Create an achievement definition (seed/admin surface).
    async fn create_achievement(&self, achievement: &AchievementRow) -> MetadataResult<()>;

    /// Create a reward item catalog entry (seed/admin surface).
    async fn create_reward_item(&self, item: &RewardItemRow) -> MetadataResult<()>;

    /// Attach a reward item to an achievement at a position in its ordered
    /// reward list.
    async fn attach_reward(
        &self,
        achievement_id: Uuid,
        item_id: Uuid,
        position: i32,
    ) -> MetadataResult<()>;

    /// List active achievements the user has not unlocked yet, in stable
    /// creation order. This is the evaluation candidate set.
    async fn list_locked_active(&self, user_id: Uuid) -> MetadataResult<Vec<AchievementRow>>;

    /// Ordered reward items for an achievement.
    async fn rewards_for_achievement(
        &self,
        achievement_id: Uuid,
    ) -> MetadataResult<Vec<RewardItemRow>>;

    /// Insert an unlock record, conflict-safe: returns `true` if this call
    /// created the row, `false` if the (user, achievement) pair already
    /// existed. This is the exactly-once guard against concurrent triggers.
    async fn insert_unlock(&self, unlock: &AchievementUnlockRow) -> MetadataResult<bool>;

    /// List a user's unlocks, most recent first.
    async fn list_unlocks(&self, user_id: Uuid) -> MetadataResult<Vec<AchievementUnlockRow>>;
}
