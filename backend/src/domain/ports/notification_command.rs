//! Driving port for emitting and acknowledging notifications.

use async_trait::async_trait;

use crate::domain::{Error, Notification, NotificationDraft, NotificationId, UserId};

/// Driving port for notification writes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationCommand: Send + Sync {
    /// Validate and store a notification.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for a blank title or message.
    async fn emit(&self, draft: NotificationDraft) -> Result<Notification, Error>;

    /// Mark one of `user`'s notifications as read.
    ///
    /// Re-marking returns the notification unchanged with its original
    /// `read_at`.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` when the notification does not exist or belongs to
    /// another user.
    async fn mark_read(&self, id: &NotificationId, user: &UserId) -> Result<Notification, Error>;

    /// Mark every unread notification of `user` as read and return the count.
    async fn mark_all_read(&self, user: &UserId) -> Result<u64, Error>;
}
