//! PostgreSQL-backed `RewardsStore` using an owned pooled connection.
//!
//! [`DieselRewardsStore::begin`] takes a connection out of the pool and opens
//! a transaction on it. The returned handle owns that connection until
//! `commit` or `rollback`. A handle dropped mid-transaction returns a
//! connection the pool sees as broken, so it is closed and the server rolls
//! the transaction back.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use diesel::dsl::not;
use diesel::prelude::*;
use diesel_async::pooled_connection::bb8::PooledConnection;
use diesel_async::{AnsiTransactionManager, AsyncPgConnection, RunQueryDsl, TransactionManager};
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{RewardsStore, RewardsStoreError, RewardsTransaction};
use crate::domain::{
    CertificationDefinition, EarnedCertification, LedgerEntry, Notification, TreeCounts,
    TreeRecord, TreeRecordId, UserId, VerificationTransition,
};

use super::diesel_error_mapping::{count_to_u64, map_diesel_error, map_pool_error, map_row_error};
use super::models::{
    CertificationRow, NewLedgerEntryRow, NewNotificationRow, NewTreeRecordRow,
    NewUserCertificationRow, TreeRecordRow,
};
use super::pool::DbPool;
use super::schema::{
    certifications, ledger_entries, notifications, tree_records, user_certifications, users,
};

/// Diesel-backed implementation of the [`RewardsStore`] port.
#[derive(Clone)]
pub struct DieselRewardsStore {
    pool: DbPool,
}

impl DieselRewardsStore {
    /// Create a new store with the given connection pool.
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

fn diesel_error(error: diesel::result::Error) -> RewardsStoreError {
    map_diesel_error(error, RewardsStoreError::query, RewardsStoreError::connection)
}

#[async_trait]
impl RewardsStore for DieselRewardsStore {
    async fn begin(&self) -> Result<Box<dyn RewardsTransaction>, RewardsStoreError> {
        let mut conn = self
            .pool
            .get_owned()
            .await
            .map_err(|err| map_pool_error(err, RewardsStoreError::connection))?;
        AnsiTransactionManager::begin_transaction(&mut *conn)
            .await
            .map_err(diesel_error)?;
        Ok(Box::new(DieselRewardsTransaction { conn }))
    }
}

/// Open transaction over an owned pooled connection.
pub struct DieselRewardsTransaction {
    conn: PooledConnection<'static, AsyncPgConnection>,
}

impl DieselRewardsTransaction {
    fn conn(&mut self) -> &mut AsyncPgConnection {
        &mut self.conn
    }

    async fn load_tree_record(
        &mut self,
        id: Uuid,
    ) -> Result<Option<TreeRecord>, RewardsStoreError> {
        let row: Option<TreeRecordRow> = tree_records::table
            .find(id)
            .select(TreeRecordRow::as_select())
            .first(self.conn())
            .await
            .optional()
            .map_err(diesel_error)?;
        row.map(TreeRecord::try_from)
            .transpose()
            .map_err(|err| map_row_error(&err, RewardsStoreError::query))
    }
}

#[async_trait]
impl RewardsTransaction for DieselRewardsTransaction {
    async fn lock_user(&mut self, user_id: &UserId) -> Result<(), RewardsStoreError> {
        let locked: Option<Uuid> = users::table
            .find(*user_id.as_uuid())
            .select(users::id)
            .for_update()
            .first(self.conn())
            .await
            .optional()
            .map_err(diesel_error)?;
        locked
            .map(|_| ())
            .ok_or_else(|| RewardsStoreError::missing_user(user_id.as_ref()))
    }

    async fn append_ledger_entry(&mut self, entry: &LedgerEntry) -> Result<(), RewardsStoreError> {
        diesel::insert_into(ledger_entries::table)
            .values(NewLedgerEntryRow::from(entry))
            .execute(self.conn())
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }

    async fn recompute_points(&mut self, user_id: &UserId) -> Result<i64, RewardsStoreError> {
        let uuid = *user_id.as_uuid();
        let total: Option<i64> = ledger_entries::table
            .filter(ledger_entries::user_id.eq(uuid))
            .select(diesel::dsl::sum(ledger_entries::delta))
            .first(self.conn())
            .await
            .map_err(diesel_error)?;
        let total = total.unwrap_or_default();

        diesel::update(users::table.find(uuid))
            .set(users::points.eq(total))
            .execute(self.conn())
            .await
            .map_err(diesel_error)?;
        debug!(user_id = %user_id, points = total, "points total recomputed");
        Ok(total)
    }

    async fn tree_counts(&mut self, user_id: &UserId) -> Result<TreeCounts, RewardsStoreError> {
        let owner = *user_id.as_uuid();
        let total: i64 = tree_records::table
            .filter(tree_records::owner_id.eq(owner))
            .count()
            .get_result(self.conn())
            .await
            .map_err(diesel_error)?;
        let verified: i64 = tree_records::table
            .filter(tree_records::owner_id.eq(owner))
            .filter(tree_records::verified.eq(true))
            .count()
            .get_result(self.conn())
            .await
            .map_err(diesel_error)?;
        Ok(TreeCounts {
            total: count_to_u64(total),
            verified: count_to_u64(verified),
        })
    }

    async fn unearned_certifications(
        &mut self,
        user_id: &UserId,
    ) -> Result<Vec<CertificationDefinition>, RewardsStoreError> {
        let earned = user_certifications::table
            .filter(user_certifications::user_id.eq(*user_id.as_uuid()))
            .select(user_certifications::certification_id);
        let rows: Vec<CertificationRow> = certifications::table
            .filter(not(certifications::id.eq_any(earned)))
            .select(CertificationRow::as_select())
            .load(self.conn())
            .await
            .map_err(diesel_error)?;
        rows.into_iter()
            .map(CertificationDefinition::try_from)
            .collect::<Result<_, _>>()
            .map_err(|err| map_row_error(&err, RewardsStoreError::query))
    }

    async fn insert_earned_certification(
        &mut self,
        earned: &EarnedCertification,
    ) -> Result<bool, RewardsStoreError> {
        let inserted = diesel::insert_into(user_certifications::table)
            .values(NewUserCertificationRow::from(earned))
            .on_conflict_do_nothing()
            .execute(self.conn())
            .await
            .map_err(diesel_error)?;
        Ok(inserted == 1)
    }

    async fn insert_notification(
        &mut self,
        notification: &Notification,
    ) -> Result<(), RewardsStoreError> {
        diesel::insert_into(notifications::table)
            .values(NewNotificationRow::from(notification))
            .execute(self.conn())
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }

    async fn find_tree_record(
        &mut self,
        id: &TreeRecordId,
    ) -> Result<Option<TreeRecord>, RewardsStoreError> {
        self.load_tree_record(*id.as_uuid()).await
    }

    async fn insert_tree_record(&mut self, record: &TreeRecord) -> Result<(), RewardsStoreError> {
        diesel::insert_into(tree_records::table)
            .values(NewTreeRecordRow::from(record))
            .execute(self.conn())
            .await
            .map(|_| ())
            .map_err(diesel_error)
    }

    async fn mark_tree_verified(
        &mut self,
        id: &TreeRecordId,
        verified_at: DateTime<Utc>,
    ) -> Result<VerificationTransition, RewardsStoreError> {
        let uuid = *id.as_uuid();
        let flipped: Option<TreeRecordRow> = diesel::update(
            tree_records::table
                .find(uuid)
                .filter(tree_records::verified.eq(false)),
        )
        .set((
            tree_records::verified.eq(true),
            tree_records::verified_at.eq(Some(verified_at)),
        ))
        .returning(TreeRecordRow::as_returning())
        .get_result(self.conn())
        .await
        .optional()
        .map_err(diesel_error)?;

        if let Some(row) = flipped {
            let record = TreeRecord::try_from(row)
                .map_err(|err| map_row_error(&err, RewardsStoreError::query))?;
            return Ok(VerificationTransition::Verified(record));
        }

        Ok(self.load_tree_record(uuid).await?.map_or(
            VerificationTransition::Missing,
            VerificationTransition::AlreadyVerified,
        ))
    }

    async fn commit(self: Box<Self>) -> Result<(), RewardsStoreError> {
        let mut tx = *self;
        AnsiTransactionManager::commit_transaction(tx.conn())
            .await
            .map_err(diesel_error)
    }

    async fn rollback(self: Box<Self>) -> Result<(), RewardsStoreError> {
        let mut tx = *self;
        AnsiTransactionManager::rollback_transaction(tx.conn())
            .await
            .map_err(diesel_error)
    }
}
