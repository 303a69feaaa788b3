//! Port for per-user tree record aggregates.

use async_trait::async_trait;

use crate::domain::{TreeStatistics, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by tree statistics adapters.
    pub enum TreeStatisticsRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "tree statistics connection failed: {message}",
        /// Query failed during execution.
        Query { message: String } =>
            "tree statistics query failed: {message}",
    }
}

/// Port for counting a user's records by kind and species.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TreeStatisticsRepository: Send + Sync {
    /// Aggregates over every record owned by `owner`. Unknown users and users
    /// without records yield all-zero statistics.
    async fn statistics_for(
        &self,
        owner: &UserId,
    ) -> Result<TreeStatistics, TreeStatisticsRepositoryError>;
}

/// Fixture implementation with no records.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureTreeStatisticsRepository;

#[async_trait]
impl TreeStatisticsRepository for FixtureTreeStatisticsRepository {
    async fn statistics_for(
        &self,
        _owner: &UserId,
    ) -> Result<TreeStatistics, TreeStatisticsRepositoryError> {
        Ok(TreeStatistics::default())
    }
}
