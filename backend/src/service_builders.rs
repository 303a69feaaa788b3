//! Builders wiring configured side channels into the domain services.
//!
//! Each builder reads [`RewardsSettings`]; a side channel without an endpoint
//! stays disabled and the service falls back to its inert default.

use std::sync::Arc;

use mockable::Clock;

use crate::config::{RewardsSettings, SettingsError};
use crate::domain::ports::{AuthenticityScorer, CertificationAnchor};
use crate::domain::{AwardPipeline, TreeSubmissionService};
use crate::outbound::side_channels::{HttpAuthenticityScorer, HttpCertificationAnchor};

/// Errors raised while building services from settings.
#[derive(Debug, thiserror::Error)]
pub enum ServiceBuildError {
    /// A configured value could not be used.
    #[error(transparent)]
    Settings(#[from] SettingsError),
    /// The HTTP client for a side channel could not be created.
    #[error("failed to build {side_channel} client: {source}")]
    Client {
        /// Side channel being built.
        side_channel: &'static str,
        /// Underlying client error.
        #[source]
        source: reqwest::Error,
    },
}

/// Authenticity scorer for the configured endpoint, if any.
///
/// # Errors
///
/// Returns [`ServiceBuildError`] for a malformed endpoint or when the HTTP
/// client cannot be created.
pub fn authenticity_scorer(
    settings: &RewardsSettings,
) -> Result<Option<Arc<dyn AuthenticityScorer>>, ServiceBuildError> {
    let Some(endpoint) = settings.scorer_endpoint()? else {
        return Ok(None);
    };
    let scorer = HttpAuthenticityScorer::new(
        endpoint,
        settings.scorer_model(),
        settings.scorer_api_key.clone(),
        settings.side_channel_timeout(),
    )
    .map_err(|source| ServiceBuildError::Client {
        side_channel: "authenticity scorer",
        source,
    })?;
    Ok(Some(Arc::new(scorer)))
}

/// Certification anchor for the configured endpoint, if any.
///
/// # Errors
///
/// Returns [`ServiceBuildError`] for a malformed endpoint or when the HTTP
/// client cannot be created.
pub fn certification_anchor(
    settings: &RewardsSettings,
) -> Result<Option<Arc<dyn CertificationAnchor>>, ServiceBuildError> {
    let Some(endpoint) = settings.anchor_endpoint()? else {
        return Ok(None);
    };
    let anchor = HttpCertificationAnchor::new(
        endpoint,
        settings.anchor_api_key.clone(),
        settings.side_channel_timeout(),
    )
    .map_err(|source| ServiceBuildError::Client {
        side_channel: "certification anchor",
        source,
    })?;
    Ok(Some(Arc::new(anchor)))
}

/// Award pipeline over `store`, anchoring certifications when configured.
///
/// # Errors
///
/// See [`certification_anchor`].
pub fn award_pipeline<S>(
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    settings: &RewardsSettings,
) -> Result<AwardPipeline<S>, ServiceBuildError> {
    let pipeline = AwardPipeline::new(store, clock);
    Ok(match certification_anchor(settings)? {
        Some(anchor) => pipeline.with_anchor(anchor, settings.best_effort()),
        None => pipeline,
    })
}

/// Submission service over `store`, scoring records when configured.
///
/// # Errors
///
/// See [`authenticity_scorer`].
pub fn tree_submission_service<S>(
    store: Arc<S>,
    clock: Arc<dyn Clock>,
    settings: &RewardsSettings,
) -> Result<TreeSubmissionService<S>, ServiceBuildError> {
    let service = TreeSubmissionService::new(store, clock);
    Ok(match authenticity_scorer(settings)? {
        Some(scorer) => service.with_scorer(scorer, settings.best_effort()),
        None => service,
    })
}
