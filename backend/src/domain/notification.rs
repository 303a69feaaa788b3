//! User-facing notifications.
//!
//! Notifications are immutable apart from the read flag. `mark_read` only
//! moves an unread notification to read; calling it again keeps the original
//! `read_at`.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{TreeRecordId, UserId};

/// Identifier of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NotificationId(Uuid);

impl NotificationId {
    /// Generate a new random identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap a UUID loaded from storage or a request path.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for NotificationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Kind of event a notification reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    /// A tree record was verified.
    TreeVerified,
    /// Points were awarded outside a verification.
    PointsAwarded,
    /// A new tree record was submitted.
    NewRecord,
    /// A certification was earned.
    Milestone,
    /// Leaderboard position changed.
    LeaderboardUpdate,
}

impl NotificationType {
    /// Returns the database string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::TreeVerified => "tree_verified",
            Self::PointsAwarded => "points_awarded",
            Self::NewRecord => "new_record",
            Self::Milestone => "milestone",
            Self::LeaderboardUpdate => "leaderboard_update",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown notification type.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown notification type: {input}")]
pub struct ParseNotificationTypeError {
    /// The unrecognised input value.
    pub input: String,
}

impl FromStr for NotificationType {
    type Err = ParseNotificationTypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "tree_verified" => Ok(Self::TreeVerified),
            "points_awarded" => Ok(Self::PointsAwarded),
            "new_record" => Ok(Self::NewRecord),
            "milestone" => Ok(Self::Milestone),
            "leaderboard_update" => Ok(Self::LeaderboardUpdate),
            other => Err(ParseNotificationTypeError {
                input: other.to_owned(),
            }),
        }
    }
}

/// Validation errors for new notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NotificationValidationError {
    /// The title was blank.
    #[error("notification title must not be empty")]
    EmptyTitle,
    /// The message was blank.
    #[error("notification message must not be empty")]
    EmptyMessage,
}

/// Request to emit a notification, validated before it is stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationDraft {
    /// Receiving user.
    pub recipient: UserId,
    /// Acting user, absent for system notices.
    pub sender: Option<UserId>,
    /// Event kind.
    pub kind: NotificationType,
    /// Short headline.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Related tree record.
    pub tree_record_id: Option<TreeRecordId>,
    /// Points mentioned by the notification.
    pub points: Option<i32>,
}

impl NotificationDraft {
    /// Start a system draft with no sender or attachments.
    pub fn new(
        recipient: UserId,
        kind: NotificationType,
        title: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            recipient,
            sender: None,
            kind,
            title: title.into(),
            message: message.into(),
            tree_record_id: None,
            points: None,
        }
    }

    /// Attach the tree record the notification refers to.
    pub fn with_tree_record(mut self, id: TreeRecordId) -> Self {
        self.tree_record_id = Some(id);
        self
    }

    /// Attach a points value.
    pub fn with_points(mut self, points: i32) -> Self {
        self.points = Some(points);
        self
    }

    /// Attach the acting user.
    pub fn with_sender(mut self, sender: UserId) -> Self {
        self.sender = Some(sender);
        self
    }

    /// Validate the draft and stamp it as an unread notification.
    ///
    /// # Examples
    /// ```
    /// use backend::domain::{NotificationDraft, NotificationType, UserId};
    /// use chrono::Utc;
    ///
    /// let draft = NotificationDraft::new(
    ///     UserId::random(),
    ///     NotificationType::NewRecord,
    ///     "Tree submitted",
    ///     "Your oak is awaiting review.",
    /// );
    /// let notification = draft.into_notification(Utc::now()).expect("valid draft");
    /// assert!(!notification.is_read);
    /// ```
    pub fn into_notification(
        self,
        now: DateTime<Utc>,
    ) -> Result<Notification, NotificationValidationError> {
        if self.title.trim().is_empty() {
            return Err(NotificationValidationError::EmptyTitle);
        }
        if self.message.trim().is_empty() {
            return Err(NotificationValidationError::EmptyMessage);
        }

        Ok(self.stamp(now))
    }

    /// Stamp a draft whose copy is generated by the crate and known to be
    /// non-blank.
    pub(crate) fn stamp(self, now: DateTime<Utc>) -> Notification {
        Notification {
            id: NotificationId::random(),
            recipient: self.recipient,
            sender: self.sender,
            kind: self.kind,
            title: self.title,
            message: self.message,
            tree_record_id: self.tree_record_id,
            points: self.points,
            is_read: false,
            created_at: now,
            read_at: None,
        }
    }
}

/// A stored notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Notification identifier.
    pub id: NotificationId,
    /// Receiving user.
    pub recipient: UserId,
    /// Acting user, absent for system notices.
    pub sender: Option<UserId>,
    /// Event kind.
    #[serde(rename = "type")]
    pub kind: NotificationType,
    /// Short headline.
    pub title: String,
    /// Body text.
    pub message: String,
    /// Related tree record.
    pub tree_record_id: Option<TreeRecordId>,
    /// Points mentioned by the notification.
    pub points: Option<i32>,
    /// Whether the recipient has read it.
    pub is_read: bool,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Set once, on the first transition to read.
    pub read_at: Option<DateTime<Utc>>,
}

impl Notification {
    /// Flip an unread notification to read.
    ///
    /// Returns `true` when the state changed. A notification that is already
    /// read keeps its original `read_at`.
    pub fn mark_read(&mut self, at: DateTime<Utc>) -> bool {
        if self.is_read {
            return false;
        }
        self.is_read = true;
        self.read_at = Some(at);
        true
    }
}

/// Sort notifications newest first, breaking ties by identifier.
pub fn sort_newest_first(notifications: &mut [Notification]) {
    notifications.sort_by(|a, b| {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| b.id.as_uuid().cmp(a.id.as_uuid()))
    });
}
