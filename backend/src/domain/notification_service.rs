//! Notification inbox service.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;
use tracing::debug;

use crate::domain::ports::{
    NotificationCommand, NotificationQuery, NotificationRepository, NotificationRepositoryError,
};
use crate::domain::{Error, Notification, NotificationDraft, NotificationId, UserId};

/// Service implementing the notification driving ports.
#[derive(Clone)]
pub struct NotificationService<R> {
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> NotificationService<R> {
    /// Create a new service over the given repository.
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }
}

fn map_repository_error(error: NotificationRepositoryError) -> Error {
    match error {
        NotificationRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("notification repository unavailable: {message}"))
        }
        NotificationRepositoryError::Query { message } => {
            Error::internal(format!("notification repository error: {message}"))
        }
    }
}

fn not_found(id: &NotificationId) -> Error {
    Error::not_found(format!("notification {id} not found"))
}

#[async_trait]
impl<R> NotificationCommand for NotificationService<R>
where
    R: NotificationRepository,
{
    async fn emit(&self, draft: NotificationDraft) -> Result<Notification, Error> {
        let notification = draft
            .into_notification(self.clock.utc())
            .map_err(|err| Error::invalid_request(err.to_string()))?;
        self.repo
            .insert(&notification)
            .await
            .map_err(map_repository_error)?;
        debug!(
            notification_id = %notification.id,
            user_id = %notification.recipient,
            kind = %notification.kind,
            "notification emitted"
        );
        Ok(notification)
    }

    async fn mark_read(&self, id: &NotificationId, user: &UserId) -> Result<Notification, Error> {
        let existing = self
            .repo
            .find(id)
            .await
            .map_err(map_repository_error)?
            .filter(|notification| &notification.recipient == user)
            .ok_or_else(|| not_found(id))?;
        if existing.is_read {
            return Ok(existing);
        }

        self.repo
            .mark_read(id, self.clock.utc())
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| not_found(id))
    }

    async fn mark_all_read(&self, user: &UserId) -> Result<u64, Error> {
        self.repo
            .mark_all_read(user, self.clock.utc())
            .await
            .map_err(map_repository_error)
    }
}

#[async_trait]
impl<R> NotificationQuery for NotificationService<R>
where
    R: NotificationRepository,
{
    async fn list(&self, user: &UserId, unread_only: bool) -> Result<Vec<Notification>, Error> {
        self.repo
            .list_for_user(user, unread_only)
            .await
            .map_err(map_repository_error)
    }

    async fn unread_count(&self, user: &UserId) -> Result<u64, Error> {
        self.repo
            .unread_count(user)
            .await
            .map_err(map_repository_error)
    }
}
