//! User metric counters and the qualifying actions that increment them.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Named per-user lifetime counter.
///
/// The set is fixed: each variant maps to one column of the user metrics
/// row, and achievements express their thresholds against these names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MetricName {
    BucketsCreated,
    LikesGiven,
    LikesReceived,
    CommentsMade,
    BucketPushes,
    BucketsCompleted,
    ChallengesCompleted,
}

impl MetricName {
    pub const ALL: [MetricName; 7] = [
        Self::BucketsCreated,
        Self::LikesGiven,
        Self::LikesReceived,
        Self::CommentsMade,
        Self::BucketPushes,
        Self::BucketsCompleted,
        Self::ChallengesCompleted,
    ];

    /// Column name in the user metrics table.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BucketsCreated => "buckets_created",
            Self::LikesGiven => "likes_given",
            Self::LikesReceived => "likes_received",
            Self::CommentsMade => "comments_made",
            Self::BucketPushes => "bucket_pushes",
            Self::BucketsCompleted => "buckets_completed",
            Self::ChallengesCompleted => "challenges_completed",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "buckets_created" => Ok(Self::BucketsCreated),
            "likes_given" => Ok(Self::LikesGiven),
            "likes_received" => Ok(Self::LikesReceived),
            "comments_made" => Ok(Self::CommentsMade),
            "bucket_pushes" => Ok(Self::BucketPushes),
            "buckets_completed" => Ok(Self::BucketsCompleted),
            "challenges_completed" => Ok(Self::ChallengesCompleted),
            other => Err(Error::InvalidMetricName(other.to_string())),
        }
    }
}

/// A qualifying user action that feeds the metrics ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    CreateBucket,
    GiveLike,
    ReceiveLike,
    CreateComment,
    BucketPush,
    CompleteBucket,
    CompleteChallenge,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CreateBucket => "create_bucket",
            Self::GiveLike => "give_like",
            Self::ReceiveLike => "receive_like",
            Self::CreateComment => "create_comment",
            Self::BucketPush => "bucket_push",
            Self::CompleteBucket => "complete_bucket",
            Self::CompleteChallenge => "complete_challenge",
        }
    }

    /// Metric increments recorded for this action.
    ///
    /// Always relative deltas; the store applies them server-side so
    /// concurrent action sources cannot lose updates.
    pub fn metric_deltas(&self) -> &'static [(MetricName, i64)] {
        match self {
            Self::CreateBucket => &[(MetricName::BucketsCreated, 1)],
            Self::GiveLike => &[(MetricName::LikesGiven, 1)],
            Self::ReceiveLike => &[(MetricName::LikesReceived, 1)],
            Self::CreateComment => &[(MetricName::CommentsMade, 1)],
            Self::BucketPush => &[(MetricName::BucketPushes, 1)],
            Self::CompleteBucket => &[(MetricName::BucketsCompleted, 1)],
            Self::CompleteChallenge => &[(MetricName::ChallengesCompleted, 1)],
        }
    }
}
