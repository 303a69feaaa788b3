//! Driving port for reading a user's inbox.

use async_trait::async_trait;

use crate::domain::{Error, Notification, UserId};

/// Driving port for notification reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationQuery: Send + Sync {
    /// List a user's notifications, newest first.
    async fn list(&self, user: &UserId, unread_only: bool) -> Result<Vec<Notification>, Error>;

    /// Count a user's unread notifications.
    async fn unread_count(&self, user: &UserId) -> Result<u64, Error>;
}
