//! Test utilities for the backend crate.
//!
//! Shared by unit tests (in `src/`) and integration tests (in `tests/`).
//! Compiled for tests and when the `test-support` feature is enabled.

use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Local, TimeDelta, TimeZone, Utc};
use mockable::Clock;

use crate::domain::{CertificationDefinition, CertificationThresholds, CertificationTier};

/// Clock that only moves when told to.
#[derive(Debug)]
pub struct MutableClock(Mutex<DateTime<Utc>>);

impl MutableClock {
    /// Start the clock at `now`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(Mutex::new(now))
    }

    /// Move the clock forward (or back, for negative deltas).
    pub fn advance(&self, delta: TimeDelta) {
        *self.lock_clock() += delta;
    }

    /// Jump to an absolute instant.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.lock_clock() = now;
    }

    fn lock_clock(&self) -> MutexGuard<'_, DateTime<Utc>> {
        match self.0.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl Clock for MutableClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        *self.lock_clock()
    }
}

/// Wednesday 2024-05-08 10:00 UTC; its leaderboard week starts Monday the 6th.
///
/// # Panics
///
/// Never in practice; the literal date is valid.
#[expect(clippy::expect_used, reason = "constant, valid timestamp")]
pub fn midweek() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 8, 10, 0, 0)
        .single()
        .expect("valid timestamp")
}

/// Build a definition with the given thresholds.
///
/// # Panics
///
/// Panics when the thresholds are invalid; tests pass literal values.
#[expect(clippy::expect_used, reason = "test helper with literal inputs")]
pub fn certification(
    name: &str,
    tier: CertificationTier,
    required_points: i64,
    required_trees: u64,
    required_verification_rate: u32,
) -> CertificationDefinition {
    CertificationDefinition::new(
        name,
        format!("{name} description"),
        "award",
        tier,
        CertificationThresholds {
            required_points,
            required_trees,
            required_verification_rate,
        },
    )
    .expect("valid certification")
}
