//! Driving ports for the certification catalog.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::{CertificationDefinition, Error, HeldCertification, UserId};

/// Outcome of seeding the default catalog.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedReport {
    /// Names of definitions created by this run.
    pub created: Vec<String>,
    /// Names of definitions that already existed.
    pub existing: Vec<String>,
}

/// Read side of the catalog.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CertificationCatalogQuery: Send + Sync {
    /// All definitions in catalog order.
    async fn list_definitions(&self) -> Result<Vec<CertificationDefinition>, Error>;

    /// Certifications held by a user.
    async fn list_earned(&self, user: &UserId) -> Result<Vec<HeldCertification>, Error>;
}

/// Write side of the catalog.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CertificationCatalogCommand: Send + Sync {
    /// Create any default definitions missing by name. Safe to repeat.
    async fn seed_default_catalog(&self) -> Result<SeedReport, Error>;
}
