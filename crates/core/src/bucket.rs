//! Bucket lifecycle states and progress updates.

use crate::error::{Error, Result};
use crate::paydate::PayDate;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a savings bucket.
///
/// Transitions are monotonic and terminal: once a bucket leaves
/// `InProgress` it is never reconciled again, and its external account
/// reference is cleared in the same transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BucketStatus {
    InProgress,
    Success,
    Failed,
}

impl BucketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InProgress => "in_progress",
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "in_progress" => Ok(Self::InProgress),
            "success" => Ok(Self::Success),
            "failed" => Ok(Self::Failed),
            other => Err(Error::InvalidBucketStatus(other.to_string())),
        }
    }

    /// Whether the bucket is still eligible for reconciliation.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::InProgress)
    }
}

/// Typed partial update for a bucket's payment progress.
///
/// Enumerates exactly the fields a count-only reconciliation is allowed to
/// touch; status and account reference changes go through the terminal
/// transition path instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BucketProgressUpdate {
    pub success_payment: i32,
    pub fail_payment: i32,
    pub last_progress_date: Option<PayDate>,
}
