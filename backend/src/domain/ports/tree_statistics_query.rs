//! Driving port for tree record statistics.

use async_trait::async_trait;

use crate::domain::{Error, TreeStatistics, UserId};

/// Driving port for a participant's submission summary.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TreeStatisticsQuery: Send + Sync {
    /// Record totals by kind plus the number of distinct species.
    async fn statistics(&self, owner: &UserId) -> Result<TreeStatistics, Error>;
}
