//! Skip policy for suites that need an embedded PostgreSQL cluster.
//!
//! Setting `SKIP_TEST_CLUSTER` lets environments without PostgreSQL binaries
//! run the rest of the test suite. Without it, a cluster failure fails the
//! test so CI breakage stays visible.

/// True when `SKIP_TEST_CLUSTER` is "1", "true" or "yes" (any case).
pub fn should_skip_test_cluster() -> bool {
    std::env::var("SKIP_TEST_CLUSTER")
        .map(|value| matches!(value.to_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false)
}

/// Return `None` with a skip marker when skipping is enabled, otherwise panic
/// with the setup failure.
pub fn handle_cluster_setup_failure<T>(reason: impl std::fmt::Display) -> Option<T> {
    if should_skip_test_cluster() {
        eprintln!("SKIP-TEST-CLUSTER: {reason}");
        None
    } else {
        panic!("Test cluster setup failed: {reason}. Set SKIP_TEST_CLUSTER=1 to skip.");
    }
}
