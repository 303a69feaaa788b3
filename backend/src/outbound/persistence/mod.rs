//! PostgreSQL persistence adapters using Diesel ORM.
//!
//! Concrete implementations of the rewards ports backed by PostgreSQL through
//! `diesel-async` and a `bb8` pool.
//!
//! - **Thin adapters**: repositories translate between Diesel rows and domain
//!   types. Award sequencing lives in the domain pipeline, not in database
//!   triggers.
//! - **Internal models**: row structs (`models.rs`) and table definitions
//!   (`schema.rs`) never leave this module.
//! - **Owned transactions**: [`DieselRewardsStore`] hands out a transaction
//!   that owns its pooled connection for the whole award.
//!
//! # Example
//!
//! ```ignore
//! use backend::outbound::persistence::{DbPool, DieselRewardsStore, PoolConfig};
//!
//! let pool = DbPool::new(PoolConfig::new("postgres://localhost/ecokuza")).await?;
//! let store = DieselRewardsStore::new(pool);
//! ```

mod diesel_certification_repository;
mod diesel_error_mapping;
mod diesel_leaderboard_repository;
mod diesel_notification_repository;
mod diesel_rewards_store;
mod diesel_tree_statistics_repository;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_certification_repository::DieselCertificationRepository;
pub use diesel_leaderboard_repository::DieselLeaderboardRepository;
pub use diesel_notification_repository::DieselNotificationRepository;
pub use diesel_rewards_store::{DieselRewardsStore, DieselRewardsTransaction};
pub use diesel_tree_statistics_repository::DieselTreeStatisticsRepository;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
