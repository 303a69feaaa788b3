//! In-memory adapters for tests and local runs.
//!
//! [`InMemoryRewardsStore`] implements the transactional store and every read
//! repository over one shared state. A transaction holds the state lock for
//! its whole lifetime and works on a staged copy, so writes become visible on
//! `commit` and vanish on `rollback` or drop.

mod rewards_store;

pub use rewards_store::{InMemoryRewardsStore, InMemoryTransaction};
