//! Tree statistics service.

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::ports::{
    TreeStatisticsQuery, TreeStatisticsRepository, TreeStatisticsRepositoryError,
};
use crate::domain::{Error, TreeStatistics, UserId};

/// Service implementing [`TreeStatisticsQuery`].
#[derive(Clone)]
pub struct TreeStatisticsService<R> {
    repo: Arc<R>,
}

impl<R> TreeStatisticsService<R> {
    /// Create a new service over the given repository.
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }
}

fn map_repository_error(error: TreeStatisticsRepositoryError) -> Error {
    match error {
        TreeStatisticsRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("tree statistics unavailable: {message}"))
        }
        TreeStatisticsRepositoryError::Query { message } => {
            Error::internal(format!("tree statistics error: {message}"))
        }
    }
}

#[async_trait]
impl<R> TreeStatisticsQuery for TreeStatisticsService<R>
where
    R: TreeStatisticsRepository,
{
    async fn statistics(&self, owner: &UserId) -> Result<TreeStatistics, Error> {
        self.repo
            .statistics_for(owner)
            .await
            .map_err(map_repository_error)
    }
}
