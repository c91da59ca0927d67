//! Integration tests for the achievement pipeline.

mod common;

use common::{TestStore, seed_achievement, seed_user};
use moneypot_core::ActionType;
use moneypot_engine::AchievementPipeline;
use moneypot_metadata::models::AchievementRow;
use time::OffsetDateTime;
use uuid::Uuid;

#[tokio::test]
async fn test_action_increments_metrics() {
    let store = TestStore::new().await;
    let user = seed_user(store.store.as_ref(), "alice").await;
    let pipeline = AchievementPipeline::new(store.store());

    let outcome = pipeline
        .record_action(user.user_id, ActionType::CreateBucket)
        .await
        .unwrap();
    assert_eq!(outcome.metrics.buckets_created, 1);
    assert!(outcome.unlocked.is_empty());

    let outcome = pipeline
        .record_action(user.user_id, ActionType::GiveLike)
        .await
        .unwrap();
    assert_eq!(outcome.metrics.buckets_created, 1);
    assert_eq!(outcome.metrics.likes_given, 1);
}

#[tokio::test]
async fn test_threshold_unlocks_with_rewards_and_notification() {
    let store = TestStore::new().await;
    let user = seed_user(store.store.as_ref(), "bob").await;
    let def = seed_achievement(
        store.store.as_ref(),
        "first_bucket",
        "buckets_created",
        1,
        "active",
        Some("Starter Ribbon"),
    )
    .await;
    let pipeline = AchievementPipeline::new(store.store());

    let outcome = pipeline
        .record_action(user.user_id, ActionType::CreateBucket)
        .await
        .unwrap();
    assert_eq!(outcome.unlocked.len(), 1);
    let unlock = &outcome.unlocked[0];
    assert_eq!(unlock.achievement.id, def.achievement_id);
    assert_eq!(unlock.rewards.len(), 1);
    assert_eq!(unlock.rewards[0].name, "Starter Ribbon");

    // Active locality: the user triggered the unlock themselves, so the
    // notification is born read.
    assert!(unlock.notification.is_read);
    assert!(unlock.notification.read_at.is_some());
    assert!(
        unlock
            .notification
            .message
            .contains("Achievement first_bucket")
    );

    let inventory = store.store().list_inventory(user.user_id).await.unwrap();
    assert_eq!(inventory.len(), 1);

    let unlocks = store.store().list_unlocks(user.user_id).await.unwrap();
    assert_eq!(unlocks.len(), 1);
    let meta = unlocks[0].meta.as_deref().unwrap();
    assert!(meta.contains("create_bucket"));
}

#[tokio::test]
async fn test_unlock_happens_exactly_once() {
    let store = TestStore::new().await;
    let user = seed_user(store.store.as_ref(), "carol").await;
    seed_achievement(
        store.store.as_ref(),
        "liker",
        "likes_given",
        1,
        "active",
        None,
    )
    .await;
    let pipeline = AchievementPipeline::new(store.store());

    let first = pipeline
        .record_action(user.user_id, ActionType::GiveLike)
        .await
        .unwrap();
    assert_eq!(first.unlocked.len(), 1);

    // The threshold stays satisfied forever, but the unlock never repeats.
    let second = pipeline
        .record_action(user.user_id, ActionType::GiveLike)
        .await
        .unwrap();
    assert!(second.unlocked.is_empty());
    assert_eq!(second.metrics.likes_given, 2);

    let unlocks = store.store().list_unlocks(user.user_id).await.unwrap();
    assert_eq!(unlocks.len(), 1);
    let notifications = store
        .store()
        .list_notifications(user.user_id, 100)
        .await
        .unwrap();
    assert_eq!(notifications.len(), 1);
}

#[tokio::test]
async fn test_single_action_can_unlock_several() {
    let store = TestStore::new().await;
    let user = seed_user(store.store.as_ref(), "dave").await;
    seed_achievement(
        store.store.as_ref(),
        "first_comment",
        "comments_made",
        1,
        "active",
        None,
    )
    .await;
    seed_achievement(
        store.store.as_ref(),
        "conversationalist",
        "comments_made",
        1,
        "passive",
        None,
    )
    .await;
    let pipeline = AchievementPipeline::new(store.store());

    let outcome = pipeline
        .record_action(user.user_id, ActionType::CreateComment)
        .await
        .unwrap();
    assert_eq!(outcome.unlocked.len(), 2);
    assert_eq!(store.store().list_unlocks(user.user_id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_threshold_not_met_stays_locked() {
    let store = TestStore::new().await;
    let user = seed_user(store.store.as_ref(), "erin").await;
    seed_achievement(
        store.store.as_ref(),
        "push_master",
        "bucket_pushes",
        3,
        "active",
        None,
    )
    .await;
    let pipeline = AchievementPipeline::new(store.store());

    for _ in 0..2 {
        let outcome = pipeline
            .record_action(user.user_id, ActionType::BucketPush)
            .await
            .unwrap();
        assert!(outcome.unlocked.is_empty());
    }

    let outcome = pipeline
        .record_action(user.user_id, ActionType::BucketPush)
        .await
        .unwrap();
    assert_eq!(outcome.unlocked.len(), 1);
}

#[tokio::test]
async fn test_passive_unlock_notification_stays_unread() {
    let store = TestStore::new().await;
    let user = seed_user(store.store.as_ref(), "frank").await;
    seed_achievement(
        store.store.as_ref(),
        "beloved",
        "likes_received",
        1,
        "passive",
        None,
    )
    .await;
    let pipeline = AchievementPipeline::new(store.store());

    let outcome = pipeline
        .record_action(user.user_id, ActionType::ReceiveLike)
        .await
        .unwrap();
    assert_eq!(outcome.unlocked.len(), 1);
    assert!(!outcome.unlocked[0].notification.is_read);
    assert!(outcome.unlocked[0].notification.read_at.is_none());
    assert_eq!(store.store().count_unread(user.user_id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_malformed_definition_does_not_poison_evaluation() {
    let store = TestStore::new().await;
    let user = seed_user(store.store.as_ref(), "grace").await;

    let broken = AchievementRow {
        achievement_id: Uuid::new_v4(),
        code: "broken".to_string(),
        title: "Broken".to_string(),
        description: "Unparseable condition".to_string(),
        condition: r#"{"metric": "stargazers", "threshold": 1}"#.to_string(),
        locality: "active".to_string(),
        is_active: true,
        created_at: OffsetDateTime::now_utc(),
    };
    store.store().create_achievement(&broken).await.unwrap();
    seed_achievement(
        store.store.as_ref(),
        "valid",
        "buckets_created",
        1,
        "active",
        None,
    )
    .await;

    let pipeline = AchievementPipeline::new(store.store());
    let outcome = pipeline
        .record_action(user.user_id, ActionType::CreateBucket)
        .await
        .unwrap();
    assert_eq!(outcome.unlocked.len(), 1);
    assert_eq!(outcome.unlocked[0].achievement.code, "valid");
}

#[tokio::test]
async fn test_duplicate_reward_grant_is_tolerated() {
    let store = TestStore::new().await;
    let user = seed_user(store.store.as_ref(), "heidi").await;

    // Two achievements share one reward item; the second grant is a no-op.
    let shared_item = moneypot_metadata::models::RewardItemRow {
        item_id: Uuid::new_v4(),
        name: "Shared Crown".to_string(),
        item_type: "decoration".to_string(),
        created_at: OffsetDateTime::now_utc(),
    };
    store.store().create_reward_item(&shared_item).await.unwrap();
    let a = seed_achievement(
        store.store.as_ref(),
        "first_like_given",
        "likes_given",
        1,
        "active",
        None,
    )
    .await;
    let b = seed_achievement(
        store.store.as_ref(),
        "second_like_given",
        "likes_given",
        2,
        "active",
        None,
    )
    .await;
    store
        .store()
        .attach_reward(a.achievement_id, shared_item.item_id, 0)
        .await
        .unwrap();
    store
        .store()
        .attach_reward(b.achievement_id, shared_item.item_id, 0)
        .await
        .unwrap();

    let pipeline = AchievementPipeline::new(store.store());
    pipeline
        .record_action(user.user_id, ActionType::GiveLike)
        .await
        .unwrap();
    let outcome = pipeline
        .record_action(user.user_id, ActionType::GiveLike)
        .await
        .unwrap();
    assert_eq!(outcome.unlocked.len(), 1);

    let inventory = store.store().list_inventory(user.user_id).await.unwrap();
    assert_eq!(inventory.len(), 1);
}
