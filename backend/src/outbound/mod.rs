//! Outbound adapters implementing domain ports for external infrastructure.
//!
//! - **persistence**: PostgreSQL-backed store and repositories using Diesel
//! - **memory**: shared in-memory store for tests and local runs
//! - **side_channels**: reqwest clients for authenticity scoring and
//!   certification anchoring
//!
//! Adapters are thin translators between domain types and infrastructure
//! representations. They contain no business logic.

pub mod memory;
pub mod persistence;
pub mod side_channels;
