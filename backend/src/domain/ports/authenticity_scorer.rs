//! Driven port for scoring the authenticity of a tree photo.
//!
//! Scoring is a best-effort side channel: a failing or slow scorer never
//! blocks a submission, which then keeps
//! [`AuthenticityScore::UNASSESSED`].

use async_trait::async_trait;
use url::Url;

use crate::domain::{AuthenticityScore, TreeRecordId, TreeRecordKind};

use super::define_port_error;

/// What the scorer is asked to assess.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticityRequest {
    /// Record being submitted.
    pub tree_record_id: TreeRecordId,
    /// Plant or update.
    pub kind: TreeRecordKind,
    /// Species claimed by the submitter.
    pub species: String,
    /// Location of the uploaded photo, when one exists.
    pub photo_url: Option<Url>,
}

define_port_error! {
    /// Errors surfaced while calling the scoring service.
    pub enum AuthenticityScorerError {
        /// Network transport failed before receiving a response.
        Transport { message: String } =>
            "authenticity scorer transport failed: {message}",
        /// The service answered with a non-success status.
        Status { status: u16 } =>
            "authenticity scorer returned status {status}",
        /// The response body could not be decoded.
        Decode { message: String } =>
            "authenticity scorer response decode failed: {message}",
    }
}

/// Port for assessing a photo's authenticity.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuthenticityScorer: Send + Sync {
    /// Score one submission.
    async fn score(
        &self,
        request: &AuthenticityRequest,
    ) -> Result<AuthenticityScore, AuthenticityScorerError>;
}

/// Scorer returning the same score for every request.
///
/// Used when no scoring endpoint is configured (with
/// [`AuthenticityScore::UNASSESSED`]) and in tests.
#[derive(Debug, Clone, Copy, Default)]
pub struct FixedAuthenticityScorer(pub AuthenticityScore);

#[async_trait]
impl AuthenticityScorer for FixedAuthenticityScorer {
    async fn score(
        &self,
        _request: &AuthenticityRequest,
    ) -> Result<AuthenticityScore, AuthenticityScorerError> {
        Ok(self.0)
    }
}
