//! Driving port for writing points to the ledger.
//!
//! Every point change, including administrative corrections, enters through
//! [`PointsAwardCommand::award_points`], which runs the full award pipeline:
//! ledger append, total recompute, certification evaluation and milestone
//! notifications.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{
    CertificationDefinition, Error, LedgerEntry, Notification, PointsCategory, TreeRecordId,
    UserId, UserProgress,
};

/// Request to append one ledger entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardRequest {
    /// User whose balance changes.
    pub user_id: UserId,
    /// Signed point change; zero and negative values are accepted.
    pub delta: i32,
    /// Why the points are written.
    pub category: PointsCategory,
    /// Optional free-text explanation.
    pub reason: Option<String>,
    /// Tree record that triggered the award.
    pub tree_record_id: Option<TreeRecordId>,
}

impl AwardRequest {
    /// Request without reason or tree record.
    pub fn new(user_id: UserId, delta: i32, category: PointsCategory) -> Self {
        Self {
            user_id,
            delta,
            category,
            reason: None,
            tree_record_id: None,
        }
    }

    /// Attach a free-text reason.
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Attach the triggering tree record.
    pub fn with_tree_record(mut self, id: TreeRecordId) -> Self {
        self.tree_record_id = Some(id);
        self
    }
}

/// Everything one award wrote.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AwardOutcome {
    /// The appended ledger entry.
    pub entry: LedgerEntry,
    /// Recomputed totals used for certification evaluation.
    pub progress: UserProgress,
    /// Certifications earned by this award, in catalog order.
    pub newly_earned: Vec<CertificationDefinition>,
    /// Notifications emitted by this award.
    pub notifications: Vec<Notification>,
}

/// Driving port for the award pipeline.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PointsAwardCommand: Send + Sync {
    /// Append a ledger entry and run the pipeline in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown users and `ServiceUnavailable` or
    /// `InternalError` for storage failures. Nothing is written on error.
    async fn award_points(&self, request: AwardRequest) -> Result<AwardOutcome, Error>;
}
