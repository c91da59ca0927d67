//! Notification kinds and message templates.
//!
//! Each kind carries a title/message template pair rendered by `{field}`
//! substitution against a JSON payload. Required fields are validated
//! before rendering so a malformed payload fails loudly instead of
//! producing a half-empty message.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Notification categories produced by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Achievement,
    PaymentSuccess,
    PaymentFailed,
    BucketCompleted,
}

struct Template {
    title: &'static str,
    message: &'static str,
    required: &'static [&'static str],
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Achievement => "achievement",
            Self::PaymentSuccess => "payment_success",
            Self::PaymentFailed => "payment_failed",
            Self::BucketCompleted => "bucket_completed",
        }
    }

    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "achievement" => Ok(Self::Achievement),
            "payment_success" => Ok(Self::PaymentSuccess),
            "payment_failed" => Ok(Self::PaymentFailed),
            "bucket_completed" => Ok(Self::BucketCompleted),
            other => Err(Error::InvalidNotificationKind(other.to_string())),
        }
    }

    fn template(&self) -> Template {
        match self {
            Self::Achievement => Template {
                title: "Achievement unlocked!",
                message: "You earned the \"{achievement_title}\" achievement!",
                required: &["achievement_title"],
            },
            Self::PaymentSuccess => Template {
                title: "Deposit recorded",
                message: "\"{bucket_name}\" recorded {count} new successful deposit(s).",
                required: &["bucket_name", "count"],
            },
            Self::PaymentFailed => Template {
                title: "Deposit failed",
                message: "\"{bucket_name}\" has a deposit problem: {reason}",
                required: &["bucket_name", "reason"],
            },
            Self::BucketCompleted => Template {
                title: "Bucket completed!",
                message: "\"{bucket_name}\" reached the end of its schedule. Congratulations!",
                required: &["bucket_name"],
            },
        }
    }

    /// Render the title and message for this kind from a JSON payload.
    pub fn render(&self, payload: &Value) -> Result<(String, String)> {
        let template = self.template();
        for field in template.required {
            let present = payload.get(field).is_some_and(|v| !v.is_null());
            if !present {
                return Err(Error::MissingNotificationField {
                    kind: self.as_str().to_string(),
                    field: (*field).to_string(),
                });
            }
        }
        Ok((
            substitute(template.title, payload),
            substitute(template.message, payload),
        ))
    }
}

/// Replace each `{field}` placeholder with the payload's value for it.
/// Unknown placeholders render as the empty string.
fn substitute(template: &str, payload: &Value) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        match after.find('}') {
            Some(end) => {
                let key = &after[..end];
                match payload.get(key) {
                    Some(Value::String(s)) => out.push_str(s),
                    Some(Value::Null) | None => {}
                    Some(other) => out.push_str(&other.to_string()),
                }
                rest = &after[end + 1..];
            }
            None => {
                out.push_str(&rest[start..]);
                return out;
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_round_trips() {
        for kind in [
            NotificationKind::Achievement,
            NotificationKind::PaymentSuccess,
            NotificationKind::PaymentFailed,
            NotificationKind::BucketCompleted,
        ] {
            assert_eq!(NotificationKind::parse(kind.as_str()).unwrap(), kind);
        }
        assert!(NotificationKind::parse("comment").is_err());
    }

    #[test]
    fn renders_achievement_message() {
        let (title, message) = NotificationKind::Achievement
            .render(&json!({"achievement_title": "First Bucket"}))
            .unwrap();
        assert_eq!(title, "Achievement unlocked!");
        assert_eq!(message, "You earned the \"First Bucket\" achievement!");
    }

    #[test]
    fn renders_numeric_fields() {
        let (_, message) = NotificationKind::PaymentSuccess
            .render(&json!({"bucket_name": "Trip fund", "count": 2}))
            .unwrap();
        assert_eq!(message, "\"Trip fund\" recorded 2 new successful deposit(s).");
    }

    #[test]
    fn missing_required_field_is_rejected() {
        let err = NotificationKind::PaymentFailed
            .render(&json!({"bucket_name": "Trip fund"}))
            .unwrap_err();
        assert!(err.to_string().contains("reason"));
    }

    #[test]
    fn null_required_field_is_rejected() {
        assert!(
            NotificationKind::BucketCompleted
                .render(&json!({"bucket_name": null}))
                .is_err()
        );
    }

    #[test]
    fn unknown_placeholder_renders_empty() {
        assert_eq!(substitute("a {missing} b", &json!({})), "a  b");
    }

    #[test]
    fn unterminated_placeholder_is_literal() {
        assert_eq!(substitute("stuck {here", &json!({})), "stuck {here");
    }
}
