//! Driving port for ranks and leaderboards.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::{Error, LeaderboardEntry, UserId};

/// A single user's all-time position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRank {
    /// Ranked user.
    pub user_id: UserId,
    /// Cached all-time total.
    pub points: i64,
    /// One more than the number of users with strictly more points.
    pub rank: u64,
}

/// Leaderboard of points earned in the current week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyLeaderboard {
    /// Monday 00:00 UTC of the current week.
    pub week_start: DateTime<Utc>,
    /// Ranked weekly sums.
    pub entries: Vec<LeaderboardEntry>,
}

/// Driving port for leaderboard reads.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LeaderboardQuery: Send + Sync {
    /// All-time rank of one user.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown users.
    async fn rank(&self, user: &UserId) -> Result<UserRank, Error>;

    /// Top all-time totals.
    async fn top_users(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, Error>;

    /// Top sums of ledger entries created since the start of this week.
    async fn weekly(&self, limit: usize) -> Result<WeeklyLeaderboard, Error>;
}
