//! Certification catalog reads and default seeding.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::domain::ports::{
    CertificationCatalogCommand, CertificationCatalogQuery, CertificationRepository,
    CertificationRepositoryError, SeedReport,
};
use crate::domain::{
    CertificationDefinition, CertificationThresholds, CertificationTier,
    CertificationValidationError, Error, HeldCertification, UserId,
};

struct CatalogSeed {
    name: &'static str,
    description: &'static str,
    icon: &'static str,
    tier: CertificationTier,
    required_points: i64,
    required_trees: u64,
    required_verification_rate: u32,
}

const DEFAULT_CATALOG: [CatalogSeed; 7] = [
    CatalogSeed {
        name: "Seedling",
        description: "Plant your first tree record",
        icon: "sprout",
        tier: CertificationTier::Bronze,
        required_points: 0,
        required_trees: 1,
        required_verification_rate: 0,
    },
    CatalogSeed {
        name: "Tree Planter",
        description: "Submit 5 verified tree records",
        icon: "tree",
        tier: CertificationTier::Bronze,
        required_points: 0,
        required_trees: 5,
        required_verification_rate: 0,
    },
    CatalogSeed {
        name: "Eco Enthusiast",
        description: "Earn 500 points from tree verification",
        icon: "leaf",
        tier: CertificationTier::Silver,
        required_points: 500,
        required_trees: 0,
        required_verification_rate: 0,
    },
    CatalogSeed {
        name: "Master Planter",
        description: "Submit 20 verified tree records",
        icon: "trees",
        tier: CertificationTier::Silver,
        required_points: 0,
        required_trees: 20,
        required_verification_rate: 0,
    },
    CatalogSeed {
        name: "Environmental Champion",
        description: "Earn 1500 points and achieve 80% verification rate",
        icon: "shield-alert",
        tier: CertificationTier::Gold,
        required_points: 1500,
        required_trees: 10,
        required_verification_rate: 80,
    },
    CatalogSeed {
        name: "Forest Guardian",
        description: "Plant 50 verified trees and earn 3000 points",
        icon: "shield-check",
        tier: CertificationTier::Gold,
        required_points: 3000,
        required_trees: 50,
        required_verification_rate: 70,
    },
    CatalogSeed {
        name: "Tree Legend",
        description: "Achieve the ultimate: 100 verified trees and 5000 points",
        icon: "crown",
        tier: CertificationTier::Platinum,
        required_points: 5000,
        required_trees: 100,
        required_verification_rate: 75,
    },
];

/// The certifications every deployment starts with.
pub fn default_catalog() -> Result<Vec<CertificationDefinition>, CertificationValidationError> {
    DEFAULT_CATALOG
        .iter()
        .map(|seed| {
            CertificationDefinition::new(
                seed.name,
                seed.description,
                seed.icon,
                seed.tier,
                CertificationThresholds {
                    required_points: seed.required_points,
                    required_trees: seed.required_trees,
                    required_verification_rate: seed.required_verification_rate,
                },
            )
        })
        .collect()
}

/// Service implementing the catalog driving ports.
#[derive(Clone)]
pub struct CertificationCatalogService<R> {
    repo: Arc<R>,
}

impl<R> CertificationCatalogService<R> {
    /// Create a new service over the given repository.
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }
}

fn map_repository_error(error: CertificationRepositoryError) -> Error {
    match error {
        CertificationRepositoryError::Connection { message } => {
            Error::service_unavailable(format!("certification repository unavailable: {message}"))
        }
        CertificationRepositoryError::Query { message } => {
            Error::internal(format!("certification repository error: {message}"))
        }
    }
}

#[async_trait]
impl<R> CertificationCatalogQuery for CertificationCatalogService<R>
where
    R: CertificationRepository,
{
    async fn list_definitions(&self) -> Result<Vec<CertificationDefinition>, Error> {
        self.repo
            .list_definitions()
            .await
            .map_err(map_repository_error)
    }

    async fn list_earned(&self, user: &UserId) -> Result<Vec<HeldCertification>, Error> {
        self.repo
            .list_earned(user)
            .await
            .map_err(map_repository_error)
    }
}

#[async_trait]
impl<R> CertificationCatalogCommand for CertificationCatalogService<R>
where
    R: CertificationRepository,
{
    async fn seed_default_catalog(&self) -> Result<SeedReport, Error> {
        let catalog =
            default_catalog().map_err(|err| Error::internal(format!("invalid default catalog: {err}")))?;

        let mut report = SeedReport::default();
        for definition in catalog {
            let created = self
                .repo
                .insert_definition_if_absent(&definition)
                .await
                .map_err(map_repository_error)?;
            if created {
                report.created.push(definition.name);
            } else {
                report.existing.push(definition.name);
            }
        }

        info!(
            created = report.created.len(),
            existing = report.existing.len(),
            "certification catalog seeded"
        );
        Ok(report)
    }
}
