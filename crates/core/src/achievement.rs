//! Achievement conditions and notification locality.

use crate::error::{Error, Result};
use crate::metrics::MetricName;
use serde::{Deserialize, Serialize};

/// Threshold condition for unlocking an achievement.
///
/// Stored as JSON on the achievement row and validated into this typed
/// form at load time, never parsed ad hoc during evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AchievementCondition {
    pub metric: MetricName,
    pub threshold: u64,
}

impl AchievementCondition {
    /// Parse and validate a stored condition blob.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| Error::InvalidCondition(format!("{raw}: {e}")))
    }

    pub fn to_json(&self) -> String {
        // Infallible for this shape.
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Whether a metric value satisfies this condition.
    pub fn is_satisfied_by(&self, value: i64) -> bool {
        value >= 0 && value as u64 >= self.threshold
    }
}

/// Whether the unlocking action is performed by the recipient themselves.
///
/// Carried explicitly per achievement, not inferred from the call site:
/// an `Active` achievement's notification is created pre-read (the user
/// was present for the triggering action), a `Passive` one arrives unread
/// (another actor or a scheduled job crossed the threshold for them).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Locality {
    Active,
    Passive,
}

impl Locality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Passive => "passive",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(Self::Active),
            "passive" => Ok(Self::Passive),
            other => Err(Error::InvalidLocality(other.to_string())),
        }
    }
}
