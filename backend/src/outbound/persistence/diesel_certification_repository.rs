//! PostgreSQL-backed `CertificationRepository` implementation using Diesel ORM.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::domain::ports::{CertificationRepository, CertificationRepositoryError};
use crate::domain::{CertificationDefinition, HeldCertification, UserId};

use super::diesel_error_mapping::{map_diesel_error, map_pool_error, map_row_error};
use super::models::CertificationRow;
use super::pool::DbPool;
use super::schema::{certifications, user_certifications};

/// Diesel-backed implementation of the [`CertificationRepository`] port.
#[derive(Clone)]
pub struct DieselCertificationRepository {
    pool: DbPool,
}

impl DieselCertificationRepository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn diesel_error(error: diesel::result::Error) -> CertificationRepositoryError {
    map_diesel_error(
        error,
        CertificationRepositoryError::query,
        CertificationRepositoryError::connection,
    )
}

fn into_definition(
    row: CertificationRow,
) -> Result<CertificationDefinition, CertificationRepositoryError> {
    CertificationDefinition::try_from(row)
        .map_err(|err| map_row_error(&err, CertificationRepositoryError::query))
}

#[async_trait]
impl CertificationRepository for DieselCertificationRepository {
    async fn list_definitions(
        &self,
    ) -> Result<Vec<CertificationDefinition>, CertificationRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, CertificationRepositoryError::connection))?;
        let rows: Vec<CertificationRow> = certifications::table
            .select(CertificationRow::as_select())
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;
        let mut definitions = rows
            .into_iter()
            .map(into_definition)
            .collect::<Result<Vec<_>, _>>()?;
        definitions.sort_by(CertificationDefinition::catalog_order);
        Ok(definitions)
    }

    async fn list_earned(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<HeldCertification>, CertificationRepositoryError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, CertificationRepositoryError::connection))?;
        let rows: Vec<(CertificationRow, i64, DateTime<Utc>)> = user_certifications::table
            .inner_join(certifications::table)
            .filter(user_certifications::user_id.eq(*user_id.as_uuid()))
            .order(user_certifications::earned_at.asc())
            .select((
                CertificationRow::as_select(),
                user_certifications::points_at_award,
                user_certifications::earned_at,
            ))
            .load(&mut conn)
            .await
            .map_err(diesel_error)?;

        rows.into_iter()
            .map(|(row, points_at_award, earned_at)| {
                Ok(HeldCertification {
                    certification: into_definition(row)?,
                    points_at_award,
                    earned_at,
                })
            })
            .collect()
    }

    async fn insert_definition_if_absent(
        &self,
        definition: &CertificationDefinition,
    ) -> Result<bool, CertificationRepositoryError> {
        let row = CertificationRow::try_from(definition)
            .map_err(|err| map_row_error(&err, CertificationRepositoryError::query))?;
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| map_pool_error(err, CertificationRepositoryError::connection))?;
        let inserted = diesel::insert_into(certifications::table)
            .values(&row)
            .on_conflict(certifications::name)
            .do_nothing()
            .execute(&mut conn)
            .await
            .map_err(diesel_error)?;
        Ok(inserted == 1)
    }
}
