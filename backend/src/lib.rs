//! Rewards backend library modules.
//!
//! `domain` holds entities, ports and services. `outbound` holds the Diesel,
//! in-memory and HTTP adapters that implement the driven ports.
//! `service_builders` wires configured side channels into the services.

pub mod config;
pub mod domain;
pub mod outbound;
pub mod service_builders;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use config::{RewardsSettings, SettingsError};
