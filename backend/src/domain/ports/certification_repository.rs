//! Port for the certification catalog and earned certifications.

use async_trait::async_trait;

use crate::domain::{CertificationDefinition, HeldCertification, UserId};

use super::define_port_error;

define_port_error! {
    /// Errors raised by certification repository adapters.
    pub enum CertificationRepositoryError {
        /// Repository connection could not be established.
        Connection { message: String } =>
            "certification repository connection failed: {message}",
        /// Query or mutation failed during execution.
        Query { message: String } =>
            "certification repository query failed: {message}",
    }
}

/// Port for catalog reads and seeding.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CertificationRepository: Send + Sync {
    /// All definitions in catalog order (tier, required points, name).
    async fn list_definitions(
        &self,
    ) -> Result<Vec<CertificationDefinition>, CertificationRepositoryError>;

    /// Certifications a user holds, oldest first.
    async fn list_earned(
        &self,
        user_id: &UserId,
    ) -> Result<Vec<HeldCertification>, CertificationRepositoryError>;

    /// Insert a definition unless one with the same name exists.
    ///
    /// Returns `true` when the definition was created.
    async fn insert_definition_if_absent(
        &self,
        definition: &CertificationDefinition,
    ) -> Result<bool, CertificationRepositoryError>;
}

/// Fixture implementation with an empty catalog that accepts every insert.
#[derive(Debug, Default, Clone, Copy)]
pub struct FixtureCertificationRepository;

#[async_trait]
impl CertificationRepository for FixtureCertificationRepository {
    async fn list_definitions(
        &self,
    ) -> Result<Vec<CertificationDefinition>, CertificationRepositoryError> {
        Ok(Vec::new())
    }

    async fn list_earned(
        &self,
        _user_id: &UserId,
    ) -> Result<Vec<HeldCertification>, CertificationRepositoryError> {
        Ok(Vec::new())
    }

    async fn insert_definition_if_absent(
        &self,
        _definition: &CertificationDefinition,
    ) -> Result<bool, CertificationRepositoryError> {
        Ok(true)
    }
}
