//! The achievement pipeline: metrics ledger, evaluator, reward granter.

use crate::error::{EngineError, EngineResult};
use crate::notify::NotificationEmitter;
use moneypot_core::{AchievementCondition, ActionType, Locality};
use moneypot_metadata::MetadataStore;
use moneypot_metadata::models::{
    AchievementRow, AchievementUnlockRow, NotificationRow, RewardItemRow, UserMetricsRow,
};
use serde_json::json;
use std::sync::Arc;
use time::OffsetDateTime;
use uuid::Uuid;

/// An achievement definition with its condition validated into typed form.
#[derive(Debug, Clone)]
pub struct Achievement {
    pub id: Uuid,
    pub code: String,
    pub title: String,
    pub description: String,
    pub condition: AchievementCondition,
    pub locality: Locality,
}

impl Achievement {
    /// Validate a stored row into the typed form. Fails on a malformed
    /// condition blob or locality value.
    pub fn from_row(row: &AchievementRow) -> EngineResult<Self> {
        Ok(Self {
            id: row.achievement_id,
            code: row.code.clone(),
            title: row.title.clone(),
            description: row.description.clone(),
            condition: AchievementCondition::from_json(&row.condition)?,
            locality: Locality::parse(&row.locality)?,
        })
    }
}

/// One unlock produced by a pipeline run, with its granted rewards and
/// the rendered notification.
#[derive(Debug)]
pub struct UnlockResult {
    pub achievement: Achievement,
    pub rewards: Vec<RewardItemRow>,
    pub notification: NotificationRow,
}

/// Outcome of recording one qualifying action.
#[derive(Debug)]
pub struct PipelineOutcome {
    pub metrics: UserMetricsRow,
    pub unlocked: Vec<UnlockResult>,
}

/// Drives metric increments, achievement evaluation, and reward grants
/// for qualifying user actions.
///
/// Runs outside any bucket transaction: a crash between a bucket's
/// terminal commit and this pipeline leaves counters one action behind,
/// which the next qualifying action does not repair. Accepted gap.
#[derive(Clone)]
pub struct AchievementPipeline {
    store: Arc<dyn MetadataStore>,
    emitter: NotificationEmitter,
}

impl AchievementPipeline {
    pub fn new(store: Arc<dyn MetadataStore>) -> Self {
        let emitter = NotificationEmitter::new(store.clone());
        Self { store, emitter }
    }

    /// Record a qualifying action: increment the user's counters, unlock
    /// any newly satisfied achievements exactly once, grant their rewards,
    /// and emit unlock notifications.
    pub async fn record_action(
        &self,
        user_id: Uuid,
        action: ActionType,
    ) -> EngineResult<PipelineOutcome> {
        let now = OffsetDateTime::now_utc();
        let metrics = self
            .store
            .increment_metrics(user_id, action.metric_deltas(), now)
            .await?;

        let satisfied = self.evaluate(user_id, &metrics).await?;
        let unlocked = self.grant(user_id, action, satisfied, now).await?;

        if !unlocked.is_empty() {
            tracing::info!(
                user_id = %user_id,
                action = action.as_str(),
                unlocked = unlocked.len(),
                "achievements unlocked"
            );
        }

        Ok(PipelineOutcome { metrics, unlocked })
    }

    /// Scan active, not-yet-unlocked achievements and return those whose
    /// threshold the updated counters now satisfy. Several may become
    /// satisfied by a single update.
    async fn evaluate(
        &self,
        user_id: Uuid,
        metrics: &UserMetricsRow,
    ) -> EngineResult<Vec<Achievement>> {
        let candidates = self.store.list_locked_active(user_id).await?;
        let mut satisfied = Vec::new();
        for row in &candidates {
            let achievement = match Achievement::from_row(row) {
                Ok(a) => a,
                Err(e) => {
                    // A malformed definition must not poison evaluation of
                    // the rest; it is a seed-data bug to fix out of band.
                    tracing::warn!(
                        achievement_id = %row.achievement_id,
                        code = %row.code,
                        error = %e,
                        "skipping achievement with invalid definition"
                    );
                    continue;
                }
            };
            let value = metrics.value(achievement.condition.metric);
            if achievement.condition.is_satisfied_by(value) {
                satisfied.push(achievement);
            }
        }
        Ok(satisfied)
    }

    /// Persist unlocks exactly once and grant reward items idempotently.
    /// A concurrent trigger losing the unlock insert skips the whole
    /// grant, so rewards and notifications happen once per pair.
    async fn grant(
        &self,
        user_id: Uuid,
        action: ActionType,
        achievements: Vec<Achievement>,
        now: OffsetDateTime,
    ) -> EngineResult<Vec<UnlockResult>> {
        let mut results = Vec::new();
        for achievement in achievements {
            let unlock = AchievementUnlockRow {
                user_id,
                achievement_id: achievement.id,
                unlocked_at: now,
                meta: Some(json!({ "source": action.as_str() }).to_string()),
            };
            let inserted = self.store.insert_unlock(&unlock).await?;
            if !inserted {
                tracing::debug!(
                    user_id = %user_id,
                    code = %achievement.code,
                    "unlock already recorded by a concurrent trigger"
                );
                continue;
            }

            let rewards = self.store.rewards_for_achievement(achievement.id).await?;
            for reward in &rewards {
                let granted = self
                    .store
                    .grant_item(user_id, reward.item_id, &reward.item_type, now)
                    .await?;
                if !granted {
                    tracing::debug!(
                        user_id = %user_id,
                        item_id = %reward.item_id,
                        "reward item already owned"
                    );
                }
            }

            let notification = self
                .emitter
                .achievement_unlocked(user_id, &achievement)
                .await?;

            results.push(UnlockResult {
                achievement,
                rewards,
                notification,
            });
        }
        Ok(results)
    }

    /// Look up a user's unlocks (read surface for collaborators).
    pub async fn list_unlocks(&self, user_id: Uuid) -> EngineResult<Vec<AchievementUnlockRow>> {
        self.store.list_unlocks(user_id).await.map_err(EngineError::from)
    }
}
