//! Port for leaderboard aggregates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Standing, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by leaderboard repository adapters.
    pub enum LeaderboardRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "leaderboard repository connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "leaderboard repository query failed: {message}",
    }
}

/// Port for the aggregates behind ranks and leaderboards.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeaderboardRepository: Send + Sync {
    /// Cached all-time total of a user, or `None` for unknown users.
    async fn user_points(&self, user_id: &UserId)
    -> Result<Option<i64>, LeaderboardRepositoryError>;

    /// Number of users whose cached total is strictly greater than `points`.
    async fn count_users_above(&self, points: i64) -> Result<u64, LeaderboardRepositoryError>;

    /// Highest all-time totals, ordered by points descending.
    async fn top_standings(&self, limit: usize) -> Result<Vec<Standing>, LeaderboardRepositoryError>;

    /// Sum of ledger deltas per user for entries created at or after `since`,
    /// ordered by the sum descending. Users without entries are absent.
    async fn weekly_standings(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Standing>, LeaderboardRepositoryError>;
}

/// Fixture implementation with no users.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureLeaderboardRepository;

#[async_trait]
impl LeaderboardRepository for FixtureLeaderboardRepository {
    async fn user_points(
        &self,
        _user_id: &UserId,
    ) -> Result<Option<i64>, LeaderboardRepositoryError> {
        Ok(None)
    }

    async fn count_users_above(&self, _points: i64) -> Result<u64, LeaderboardRepositoryError> {
        Ok(0)
    }

    async fn top_standings(
        &self,
        _limit: usize,
    ) -> Result<Vec<Standing>, LeaderboardRepositoryError> {
        Ok(Vec::new())
    }

    async fn weekly_standings(
        &self,
        _since: DateTime<Utc>,
        _limit: usize,
    ) -> Result<Vec<Standing>, LeaderboardRepositoryError> {
        Ok(Vec::new())
    }
}
