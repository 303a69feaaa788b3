//! Driving port for submitting tree records.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::{Error, TreeRecord, TreeRecordId, TreeRecordKind, UserId};

/// Request to submit a tree record for review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTreeRecordRequest {
    /// Submitting user.
    pub owner: UserId,
    /// Plant or update.
    pub kind: TreeRecordKind,
    /// Plant record an update refers to; required for updates only.
    pub parent: Option<TreeRecordId>,
    /// Species name.
    pub species: String,
    /// Uploaded photo location, passed to the authenticity scorer.
    pub photo_url: Option<Url>,
}

/// Driving port for new tree records.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TreeSubmissionCommand: Send + Sync {
    /// Score and store an unverified record.
    ///
    /// # Errors
    ///
    /// Returns `InvalidRequest` for blank species or an inconsistent parent,
    /// `NotFound` when the parent does not exist, and storage errors
    /// otherwise. Scorer failures never fail the submission.
    async fn submit(&self, request: SubmitTreeRecordRequest) -> Result<TreeRecord, Error>;
}
