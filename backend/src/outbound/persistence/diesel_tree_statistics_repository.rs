//! PostgreSQL-backed `TreeStatisticsRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use diesel::dsl::{count_distinct, count_star};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{TreeStatisticsRepository, TreeStatisticsRepositoryError};
use crate::domain::{TreeStatistics, UserId};

use super::diesel_error_mapping::{count_to_u64, map_diesel_error, map_pool_error, map_row_error};
use super::models::tree_statistics;
use super::pool::DbPool;
use super::schema::tree_records;

/// Diesel-backed implementation of the [`TreeStatisticsRepository`] port.
#[derive(Clone)]
pub struct DieselTreeStatisticsRepository {
    pool: DbPool,
}

impl DieselTreeStatisticsRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn diesel_error(error: diesel::result::Error) -> TreeStatisticsRepositoryError {
    map_diesel_error(
        error,
        TreeStatisticsRepositoryError::query,
        TreeStatisticsRepositoryError::connection,
    )
}

#[async_trait]
impl TreeStatisticsRepository for DieselTreeStatisticsRepository {
    async fn statistics_for(
        &self,
        owner: &UserId,
    ) -> Result<TreeStatistics, TreeStatisticsRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, TreeStatisticsRepositoryError::connection))?;
        let owner_id = *owner.as_uuid();

        let kind_counts: Vec<(String, i64)> = tree_records::table
            .filter(tree_records::owner_id.eq(owner_id))
            .group_by(tree_records::kind)
            .select((tree_records::kind, count_star()))
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        let species: i64 = tree_records::table
            .filter(tree_records::owner_id.eq(owner_id))
            .select(count_distinct(tree_records::species))
            .get_result(&mut conn)
            .await
            .map_err(diesel_error)?;

        tree_statistics(
            kind_counts
                .into_iter()
                .map(|(kind, count)| (kind, count_to_u64(count)))
                .collect(),
            count_to_u64(species),
        )
        .map_err(|err| map_row_error(&err, TreeStatisticsRepositoryError::query))
    }
}
