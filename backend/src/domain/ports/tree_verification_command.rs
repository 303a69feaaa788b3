//! Driving port for verifying tree records.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{Error, TreeRecord, TreeRecordId};

use super::AwardOutcome;

/// Result of a verification request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "status")]
pub enum TreeVerificationOutcome {
    /// The record moved to verified and its owner was awarded points.
    Verified {
        /// The record after the transition.
        record: TreeRecord,
        /// What the award wrote.
        award: AwardOutcome,
    },
    /// The record was already verified; nothing was awarded.
    AlreadyVerified {
        /// The unchanged record.
        record: TreeRecord,
    },
}

/// Driving port called when a reviewer verifies a tree record.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TreeVerificationCommand: Send + Sync {
    /// Verify a record and award its owner exactly once.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` for unknown records and storage errors otherwise.
    async fn verify_tree_record(
        &self,
        id: &TreeRecordId,
    ) -> Result<TreeVerificationOutcome, Error>;
}
