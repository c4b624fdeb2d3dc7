use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Match,
    DateAccepted,
    DateConfirmed,
    DateDeclined,
    DateAppeal,
    DateAppealResolved,
    DateRevealed,
    DateExpired,
}

impl NotificationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Match => "match",
            NotificationKind::DateAccepted => "date_accepted",
            NotificationKind::DateConfirmed => "date_confirmed",
            NotificationKind::DateDeclined => "date_declined",
            NotificationKind::DateAppeal => "date_appeal",
            NotificationKind::DateAppealResolved => "date_appeal_resolved",
            NotificationKind::DateRevealed => "date_revealed",
            NotificationKind::DateExpired => "date_expired",
        }
    }
}

impl FromStr for NotificationKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "match" => Ok(NotificationKind::Match),
            "date_accepted" => Ok(NotificationKind::DateAccepted),
            "date_confirmed" => Ok(NotificationKind::DateConfirmed),
            "date_declined" => Ok(NotificationKind::DateDeclined),
            "date_appeal" => Ok(NotificationKind::DateAppeal),
            "date_appeal_resolved" => Ok(NotificationKind::DateAppealResolved),
            "date_revealed" => Ok(NotificationKind::DateRevealed),
            "date_expired" => Ok(NotificationKind::DateExpired),
            other => Err(format!("unknown notification type: {}", other)),
        }
    }
}

/// What a notifier delivers to a single user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationPayload {
    pub title: String,
    pub body: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
}

impl NotificationPayload {
    pub fn new(kind: NotificationKind, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            kind,
            anchor: None,
        }
    }

    pub fn with_anchor(mut self, anchor: impl Into<String>) -> Self {
        self.anchor = Some(anchor.into());
        self
    }
}

/// A stored in-app notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub user_id: String,
    pub title: String,
    pub body: String,
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<String>,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

impl Notification {
    pub fn from_payload(user_id: &str, payload: NotificationPayload, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id: user_id.to_string(),
            title: payload.title,
            body: payload.body,
            kind: payload.kind,
            anchor: payload.anchor,
            read: false,
            created_at: now,
        }
    }
}
