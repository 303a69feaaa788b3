//! PostgreSQL-backed `LeaderboardRepository` implementation using Diesel ORM.
//!
//! All-time standings read the cached `users.points` column. Weekly standings
//! aggregate ledger deltas since the window start.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;
use uuid::Uuid;

use crate::domain::ports::{LeaderboardRepository, LeaderboardRepositoryError};
use crate::domain::{Standing, UserId};

use super::diesel_error_mapping::{
    count_to_u64, limit_to_i64, map_diesel_error, map_pool_error, map_row_error,
};
use super::models::StandingRow;
use super::pool::DbPool;
use super::schema::{ledger_entries, users};

/// Diesel-backed implementation of the [`LeaderboardRepository`] port.
#[derive(Clone)]
pub struct DieselLeaderboardRepository {
    pool: DbPool,
}

impl DieselLeaderboardRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn diesel_error(error: diesel::result::Error) -> LeaderboardRepositoryError {
    map_diesel_error(
        error,
        LeaderboardRepositoryError::query,
        LeaderboardRepositoryError::connection,
    )
}

fn into_standings(rows: Vec<StandingRow>) -> Result<Vec<Standing>, LeaderboardRepositoryError> {
    rows.into_iter()
        .map(Standing::try_from)
        .collect::<Result<_, _>>()
        .map_err(|err| map_row_error(&err, LeaderboardRepositoryError::query))
}

#[async_trait]
impl LeaderboardRepository for DieselLeaderboardRepository {
    async fn user_points(
        &self,
        user_id: &UserId,
    ) -> Result<Option<i64>, LeaderboardRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, LeaderboardRepositoryError::connection))?;
        users::table
            .find(*user_id.as_uuid())
            .select(users::points)
            .first(&mut conn)
            .await
            .optional()
            .map_err(diesel_error)
    }

    async fn count_users_above(&self, points: i64) -> Result<u64, LeaderboardRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, LeaderboardRepositoryError::connection))?;
        let count: i64 = users::table
            .filter(users::points.gt(points))
            .count()
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(count_to_u64(count))
    }

    async fn top_standings(&self, limit: usize) -> Result<Vec<Standing>, LeaderboardRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, LeaderboardRepositoryError::connection))?;
        let rows: Vec<StandingRow> = users::table
            .select((users::id, users::display_name, users::points))
            .order((
                users::points.desc(),
                users::display_name.asc(),
                users::id.asc(),
            ))
            .limit(limit_to_i64(limit))
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        into_standings(rows)
    }

    async fn weekly_standings(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Standing>, LeaderboardRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, LeaderboardRepositoryError::connection))?;
        let sums: Vec<(Uuid, String, Option<i64>)> = ledger_entries::table
            .inner_join(users::table)
            .filter(ledger_entries::created_at.ge(since))
            .group_by((users::id, users::display_name))
            .select((users::id, users::display_name, diesel::dsl::sum(ledger_entries::delta)))
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;

        let rows = sums
            .into_iter()
            .map(|(id, display_name, points)| StandingRow {
                id,
                display_name,
                points: points.unwrap_or_default(),
            })
            .collect();
        let mut standings = into_standings(rows)?;
        standings.sort_by(|a, b| {
            b.points
                .cmp(&a.points)
                .then_with(|| a.display_name.as_ref().cmp(b.display_name.as_ref()))
                .then_with(|| a.user_id.cmp(&b.user_id))
        });
        standings.truncate(limit);
        Ok(standings)
    }
}
