//! Leaderboard service.

use std::sync::Arc;

use async_trait::async_trait;
use mockable::Clock;

use crate::domain::ports::{
    LeaderboardQuery, LeaderboardRepository, LeaderboardRepositoryError, UserRank,
    WeeklyLeaderboard,
};
use crate::domain::{Error, LeaderboardEntry, UserId, rank_for, rank_standings, week_start};

/// Service implementing [`LeaderboardQuery`].
#[derive(Clone)]
pub struct LeaderboardService<R> {
    repo: Arc<R>,
    clock: Arc<dyn Clock>,
}

impl<R> LeaderboardService<R> {
    /// Create a new service over the given repository.
    pub fn new(repo: Arc<R>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }
}

fn map_repository_error(error: LeaderboardRepositoryError) -> Error {
    match error {
        LeaderboardRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("leaderboard repository unavailable: {message}"))
        }
        LeaderboardRepositoryError::Query { message } => {
            Error::internal(format!("leaderboard repository error: {message}"))
        }
    }
}

#[async_trait]
impl<R> LeaderboardQuery for LeaderboardService<R>
where
    R: LeaderboardRepository,
{
    async fn rank(&self, user: &UserId) -> Result<UserRank, Error> {
        let points = self
            .repo
            .user_points(user)
            .await
            .map_err(map_repository_error)?
            .ok_or_else(|| Error::not_found(format!("user {user} not found")))?;
        let above = self
            .repo
            .count_users_above(points)
            .await
            .map_err(map_repository_error)?;

        Ok(UserRank {
            user_id: user.clone(),
            points,
            rank: rank_for(above),
        })
    }

    async fn top_users(&self, limit: usize) -> Result<Vec<LeaderboardEntry>, Error> {
        let standings = self
            .repo
            .top_standings(limit)
            .await
            .map_err(map_repository_error)?;
        Ok(rank_standings(standings, limit))
    }

    async fn weekly(&self, limit: usize) -> Result<WeeklyLeaderboard, Error> {
        let since = week_start(self.clock.utc());
        let standings = self
            .repo
            .weekly_standings(since, limit)
            .await
            .map_err(map_repository_error)?;
        Ok(WeeklyLeaderboard {
            week_start: since,
            entries: rank_standings(standings, limit),
        })
    }
}
