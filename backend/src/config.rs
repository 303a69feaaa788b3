//! Rewards configuration loaded via OrthoConfig.
//!
//! Values come from `REWARDS_*` environment variables or a configuration
//! file. Everything except the database URL has a default; the side channels
//! stay disabled until an endpoint is configured.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use url::Url;

use crate::domain::{AwardPolicy, BestEffort};
use crate::outbound::persistence::PoolConfig;
use crate::outbound::side_channels::DEFAULT_SCORER_MODEL;

/// Errors raised when configured values cannot be used.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SettingsError {
    /// No database URL was configured.
    #[error("REWARDS_DATABASE_URL must be set")]
    MissingDatabaseUrl,
    /// A side-channel endpoint is not a valid URL.
    #[error("invalid {setting} URL: {message}")]
    InvalidEndpoint {
        /// Name of the offending setting.
        setting: &'static str,
        /// Parser failure.
        message: String,
    },
}

/// Configuration for the rewards backend and its admin tooling.
#[derive(Debug, Clone, Deserialize, OrthoConfig)]
#[ortho_config(prefix = "REWARDS")]
pub struct RewardsSettings {
    /// PostgreSQL connection URL.
    pub database_url: Option<String>,
    /// Maximum pooled database connections.
    pub pool_max_size: Option<u32>,
    /// Points for a verified record before the authenticity bonus.
    #[ortho_config(default = 100)]
    pub base_points: i32,
    /// Points per authenticity score point.
    #[ortho_config(default = 1)]
    pub authenticity_multiplier: i32,
    /// Chat-completions endpoint used to score submissions.
    pub scorer_endpoint: Option<String>,
    /// Model name sent to the scorer.
    pub scorer_model: Option<String>,
    /// Bearer token for the scorer.
    pub scorer_api_key: Option<String>,
    /// Ledger bridge endpoint used to anchor certifications.
    pub anchor_endpoint: Option<String>,
    /// API key for the ledger bridge.
    pub anchor_api_key: Option<String>,
    /// Upper bound for any side-channel call, in milliseconds.
    #[ortho_config(default = 5000)]
    pub side_channel_timeout_ms: u64,
}

fn parse_endpoint(
    setting: &'static str,
    raw: Option<&str>,
) -> Result<Option<Url>, SettingsError> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(|value| {
            Url::parse(value).map_err(|err| SettingsError::InvalidEndpoint {
                setting,
                message: err.to_string(),
            })
        })
        .transpose()
}

impl RewardsSettings {
    /// Pool configuration for the configured database.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::MissingDatabaseUrl`] when no URL is set.
    pub fn pool_config(&self) -> Result<PoolConfig, SettingsError> {
        let url = self
            .database_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .ok_or(SettingsError::MissingDatabaseUrl)?;
        Ok(self.pool_max_size.map_or_else(
            || PoolConfig::new(url),
            |size| PoolConfig::new(url).with_max_size(size),
        ))
    }

    /// Award policy built from the configured points values.
    pub fn award_policy(&self) -> AwardPolicy {
        AwardPolicy {
            base_points: self.base_points,
            authenticity_multiplier: self.authenticity_multiplier,
        }
    }

    /// Upper bound for side-channel calls.
    pub fn side_channel_timeout(&self) -> Duration {
        Duration::from_millis(self.side_channel_timeout_ms)
    }

    /// Best-effort wrapper bounded by [`Self::side_channel_timeout`].
    pub fn best_effort(&self) -> BestEffort {
        BestEffort::new(self.side_channel_timeout())
    }

    /// Scorer endpoint, if scoring is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidEndpoint`] for a malformed URL.
    pub fn scorer_endpoint(&self) -> Result<Option<Url>, SettingsError> {
        parse_endpoint("scorer_endpoint", self.scorer_endpoint.as_deref())
    }

    /// Model name sent to the scorer.
    pub fn scorer_model(&self) -> &str {
        self.scorer_model.as_deref().unwrap_or(DEFAULT_SCORER_MODEL)
    }

    /// Anchor endpoint, if anchoring is enabled.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::InvalidEndpoint`] for a malformed URL.
    pub fn anchor_endpoint(&self) -> Result<Option<Url>, SettingsError> {
        parse_endpoint("anchor_endpoint", self.anchor_endpoint.as_deref())
    }
}
