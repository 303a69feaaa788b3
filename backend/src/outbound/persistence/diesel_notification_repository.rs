//! PostgreSQL-backed `NotificationRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{NotificationRepository, NotificationRepositoryError};
use crate::domain::{Notification, NotificationId, UserId};

use super::diesel_error_mapping::{count_to_u64, map_diesel_error, map_pool_error, map_row_error};
use super::models::{NewNotificationRow, NotificationRow};
use super::pool::DbPool;
use super::schema::notifications;

/// Diesel-backed implementation of the [`NotificationRepository`] port.
#[derive(Clone)]
pub struct DieselNotificationRepository {
    pool: DbPool,
}

impl DieselNotificationRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn diesel_error(error: diesel::result::Error) -> NotificationRepositoryError {
    map_diesel_error(
        error,
        NotificationRepositoryError::query,
        NotificationRepositoryError::connection,
    )
}

fn into_notification(row: NotificationRow) -> Result<Notification, NotificationRepositoryError> {
    Notification::try_from(row).map_err(|err| map_row_error(&err, NotificationRepositoryError::query))
}

#[async_trait]
impl NotificationRepository for DieselNotificationRepository {
    async fn insert(
        &self,
        notification: &Notification,
    ) -> Result<(), NotificationRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, NotificationRepositoryError::connection))?;
        diesel::insert_into(notifications::table)
            .values(NewNotificationRow::from(notification))
            .execute(&mut conn)
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }

    async fn find(
        &self,
        id: &NotificationId,
    ) -> Result<Option<Notification>, NotificationRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, NotificationRepositoryError::connection))?;
        let row: Option<NotificationRow> = notifications::table
            .find(*id.as_uuid())
            .select(NotificationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(into_notification).transpose()
    }

    async fn list_for_user(
        &self,
        user_id: &UserId,
        unread_only: bool,
    ) -> Result<Vec<Notification>, NotificationRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, NotificationRepositoryError::connection))?;
        let mut query = notifications::table
            .filter(notifications::recipient_id.eq(*user_id.as_uuid()))
            .select(NotificationRow::as_select())
            .order((notifications::created_at.desc(), notifications::id.desc()))
            .into_boxed();
        if unread_only {
            query = query.filter(notifications::is_read.eq(false));
        }
        let rows: Vec<NotificationRow> = query.load(&mut conn).await.map_err(diesel_error)?;
        rows.into_iter().map(into_notification).collect()
    }

    async fn unread_count(&self, user_id: &UserId) -> Result<u64, NotificationRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, NotificationRepositoryError::connection))?;
        let count: i64 = notifications::table
            .filter(notifications::recipient_id.eq(*user_id.as_uuid()))
            .filter(notifications::is_read.eq(false))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(count_to_u64(count))
    }

    async fn mark_read(
        &self,
        id: &NotificationId,
        read_at: DateTime<Utc>,
    ) -> Result<Option<Notification>, NotificationRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, NotificationRepositoryError::connection))?;
        let uuid = *id.as_uuid();

        // Only unread rows are touched so an existing `read_at` survives.
        let updated: Option<NotificationRow> = diesel::update(
            notifications::table
                .find(uuid)
                .filter(notifications::is_read.eq(false)),
        )
        .set((
            notifications::is_read.eq(true),
            notifications::read_at.eq(Some(read_at)),
        ))
        .returning(NotificationRow::as_returning())
        .get_result(&mut conn)
        .await
        .optional()
        .map_err(diesel_error)?;

        if let Some(row) = updated {
            return into_notification(row).map(Some);
        }
        let row: Option<NotificationRow> = notifications::table
            .find(uuid)
            .select(NotificationRow::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(into_notification).transpose()
    }

    async fn mark_all_read(
        &self,
        user_id: &UserId,
        read_at: DateTime<Utc>,
    ) -> Result<u64, NotificationRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, NotificationRepositoryError::connection))?;
        let updated = diesel::update(
            notifications::table
                .filter(notifications::recipient_id.eq(*user_id.as_uuid()))
                .filter(notifications::is_read.eq(false)),
        )
        .set((
            notifications::is_read.eq(true),
            notifications::read_at.eq(Some(read_at)),
        ))
        .execute(&mut conn)
        .await
        .map_err(diesel_error)?;
        Ok(u64::try_from(updated).unwrap_or_default())
    }
}
