//! Port for the transactional rewards store.
//!
//! Every write the award pipeline performs goes through one
//! [`RewardsTransaction`]: lock the user row, append the ledger entry,
//! recompute the cached total, record earned certifications and emit
//! notifications. Either all of it commits or none of it does.
//!
//! Dropping a transaction without calling [`RewardsTransaction::commit`]
//! must discard its writes.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{
    CertificationDefinition, EarnedCertification, LedgerEntry, Notification, TreeCounts,
    TreeRecord, TreeRecordId, UserId, VerificationTransition,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by rewards store adapters.
    pub enum RewardsStoreError {
        /// Connection could not be established or was lost.
        Connection { message: String } =>
            "rewards store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "rewards store query failed: {message}",
        /// The user row to lock does not exist.
        MissingUser { user_id: String } =>
            "user {user_id} does not exist",
    }
}

/// One open unit of work against the rewards tables.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RewardsTransaction: Send {
    /// Take the per-user row lock serialising concurrent awards.
    ///
    /// Fails with [`RewardsStoreError::MissingUser`] when the user is unknown.
    async fn lock_user(&mut self, user_id: &UserId) -> Result<(), RewardsStoreError>;

    /// Append an immutable ledger entry.
    async fn append_ledger_entry(&mut self, entry: &LedgerEntry) -> Result<(), RewardsStoreError>;

    /// Recompute the user's cached total from all ledger entries, store it and
    /// return it.
    async fn recompute_points(&mut self, user_id: &UserId) -> Result<i64, RewardsStoreError>;

    /// Count the user's tree records, total and verified.
    async fn tree_counts(&mut self, user_id: &UserId) -> Result<TreeCounts, RewardsStoreError>;

    /// Definitions the user has not earned yet.
    async fn unearned_certifications(
        &mut self,
        user_id: &UserId,
    ) -> Result<Vec<CertificationDefinition>, RewardsStoreError>;

    /// Record an earned certification.
    ///
    /// Returns `false` without writing when the (user, definition) pair
    /// already exists.
    async fn insert_earned_certification(
        &mut self,
        earned: &EarnedCertification,
    ) -> Result<bool, RewardsStoreError>;

    /// Store a notification.
    async fn insert_notification(
        &mut self,
        notification: &Notification,
    ) -> Result<(), RewardsStoreError>;

    /// Load a tree record.
    async fn find_tree_record(
        &mut self,
        id: &TreeRecordId,
    ) -> Result<Option<TreeRecord>, RewardsStoreError>;

    /// Store a newly submitted tree record.
    async fn insert_tree_record(&mut self, record: &TreeRecord) -> Result<(), RewardsStoreError>;

    /// Conditionally flip a record from unverified to verified.
    async fn mark_tree_verified(
        &mut self,
        id: &TreeRecordId,
        verified_at: DateTime<Utc>,
    ) -> Result<VerificationTransition, RewardsStoreError>;

    /// Make every write in this transaction durable.
    async fn commit(self: Box<Self>) -> Result<(), RewardsStoreError>;

    /// Discard every write in this transaction.
    async fn rollback(self: Box<Self>) -> Result<(), RewardsStoreError>;
}

/// Factory for [`RewardsTransaction`] handles.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RewardsStore: Send + Sync {
    /// Open a new transaction.
    async fn begin(&self) -> Result<Box<dyn RewardsTransaction>, RewardsStoreError>;
}
