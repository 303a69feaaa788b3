//! Driven port for anchoring earned certifications on a public ledger.
//!
//! Anchoring happens after the award transaction commits. Failures are
//! logged and never undo the award.

use async_trait::async_trait;

use crate::domain::{CertificationId, UserId};

use super::define_port_error;

/// Certification award to publish.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnchorRequest {
    /// Holder.
    pub user_id: UserId,
    /// Earned definition.
    pub certification_id: CertificationId,
    /// Definition name.
    pub certification_name: String,
    /// Holder's points total at award time.
    pub points_earned: i64,
    /// Holder's verified tree count at award time.
    pub tree_count: u64,
}

/// Acknowledgement from the anchoring service.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AnchorReceipt {
    /// External reference such as a transaction hash, when one was issued.
    pub reference: Option<String>,
}

define_port_error! {
    /// Errors surfaced while anchoring a certification.
    pub enum CertificationAnchorError {
        /// Network transport failed before receiving a response.
        Transport { message: String } =>
            "certification anchor transport failed: {message}",
        /// The service answered with a non-success status.
        Status { status: u16 } =>
            "certification anchor returned status {status}",
        /// The response body could not be decoded.
        Decode { message: String } =>
            "certification anchor response decode failed: {message}",
    }
}

/// Port for publishing earned certifications.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CertificationAnchor: Send + Sync {
    /// Publish one earned certification.
    async fn anchor(&self, request: &AnchorRequest)
    -> Result<AnchorReceipt, CertificationAnchorError>;
}

/// Anchor that publishes nothing; used when no endpoint is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCertificationAnchor;

#[async_trait]
impl CertificationAnchor for DisabledCertificationAnchor {
    async fn anchor(
        &self,
        _request: &AnchorRequest,
    ) -> Result<AnchorReceipt, CertificationAnchorError> {
        Ok(AnchorReceipt::default())
    }
}
