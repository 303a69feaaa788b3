//! Port for reading and updating stored notifications.
//!
//! Notifications written by the award pipeline go through
//! [`super::RewardsTransaction`]; this port serves the inbox operations that
//! run outside a pipeline transaction.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Notification, NotificationId, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by notification repository adapters.
    pub enum NotificationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "notification repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "notification repository query failed: {message}",
    }
}

/// Port for notification storage.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Store a notification emitted outside the award pipeline.
    async fn insert(&self, notification: &Notification)
    -> Result<(), NotificationRepositoryError>;

    /// Load a single notification.
    async fn find(
        &self,
        id: &NotificationId,
    ) -> Result<Option<Notification>, NotificationRepositoryError>;

    /// List a user's notifications, newest first.
    async fn list_for_user(
        &self,
        user_id: &UserId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, NotificationRepositoryError>;

    /// Count a user's unread notifications.
    async fn unread_count(&self, user_id: &UserId) -> Result<u64, NotificationRepositoryError>;

    /// Flip one unread notification to read, stamping `read_at`.
    ///
    /// Already-read notifications are left untouched. Returns the stored
    /// notification after the update, or `None` if it does not exist.
    async fn mark_read(
        &self,
        id: &NotificationId,
        read_at: DateTime<Utc>,
    ) -> Result<Option<Notification>, NotificationRepositoryError>;

    /// Flip every unread notification of a user to read and return how many
    /// changed.
    async fn mark_all_read(
        &self,
        user_id: &UserId,
        read_at: DateTime<Utc>,
    ) -> Result<u64, NotificationRepositoryError>;
}

/// Fixture implementation with an always-empty inbox.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureNotificationRepository;

#[async_trait]
impl NotificationRepository for FixtureNotificationRepository {
    async fn insert(
        &self,
        _notification: &Notification,
    ) -> Result<(), NotificationRepositoryError> {
        Ok(())
    }

    async fn find(
        &self,
        _id: &NotificationId,
    ) -> Result<Option<Notification>, NotificationRepositoryError> {
        Ok(None)
    }

    async fn list_for_user(
        &self,
        _user_id: &UserId,
        _unread_only: bool,
    ) -> Result<Vec<Notification>, NotificationRepositoryError> {
        Ok(Vec::new())
    }

    async fn unread_count(&self, _user_id: &UserId) -> Result<u64, NotificationRepositoryError> {
        Ok(0)
    }

    async fn mark_read(
        &self,
        _id: &NotificationId,
        _read_at: DateTime<Utc>,
    ) -> Result<Option<Notification>, NotificationRepositoryError> {
        Ok(None)
    }

    async fn mark_all_read(
        &self,
        _user_id: &UserId,
        _read_at: DateTime<Utc>,
    ) -> Result<u64, NotificationRepositoryError> {
        Ok(0)
    }
}
