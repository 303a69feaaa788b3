//! Shared helpers for the embedded PostgreSQL integration suites.
//!
//! Integration tests compile as separate crates, so helpers shared by the
//! Diesel adapter suites live here rather than in the library.

mod cluster_skip;
mod pg_embed;

use backend::domain::UserId;
use backend::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use pg_embedded_setup_unpriv::TestCluster;
use postgres::{Client, NoTls};
use tokio::runtime::Runtime;

pub use cluster_skip::handle_cluster_setup_failure;
pub use pg_embed::test_cluster;

/// Render a `postgres` error with its SQLSTATE, detail and hint.
///
/// `postgres::Error`'s `Display` collapses server errors to `db error`.
pub fn format_postgres_error(error: &postgres::Error) -> String {
    let Some(db_error) = error.as_db_error() else {
        return error.to_string();
    };
    let mut summary = format!(
        "postgres error {:?}: {}",
        db_error.code(),
        db_error.message()
    );
    if let Some(detail) = db_error.detail() {
        summary.push_str("; detail: ");
        summary.push_str(detail);
    }
    if let Some(hint) = db_error.hint() {
        summary.push_str("; hint: ");
        summary.push_str(hint);
    }
    summary
}

/// Drop and recreate `name` on the cluster.
pub fn reset_database(cluster: &TestCluster, name: &str) -> Result<(), String> {
    let admin_url = cluster.connection().database_url("postgres");
    let mut client =
        Client::connect(&admin_url, NoTls).map_err(|err| format_postgres_error(&err))?;
    // DROP/CREATE DATABASE refuse to run inside a multi-statement batch.
    client
        .batch_execute(&format!("DROP DATABASE IF EXISTS \"{name}\""))
        .map_err(|err| format_postgres_error(&err))?;
    client
        .batch_execute(&format!("CREATE DATABASE \"{name}\""))
        .map_err(|err| format_postgres_error(&err))?;
    Ok(())
}

/// A freshly migrated database on its own cluster.
pub struct MigratedDatabase {
    /// Keeps the cluster alive for the test.
    pub cluster: TestCluster,
    /// Connection URL of the migrated database.
    pub url: String,
    /// Migration versions applied while provisioning.
    pub applied: Vec<String>,
}

/// Start a cluster, recreate `name` and apply the crate's migrations.
pub fn migrated_database(runtime: &Runtime, name: &str) -> Result<MigratedDatabase, String> {
    let cluster = test_cluster()?;
    reset_database(&cluster, name)?;
    let url = cluster.connection().database_url(name);
    let applied = runtime
        .block_on(run_pending_migrations(&url))
        .map_err(|err| err.to_string())?;
    Ok(MigratedDatabase {
        cluster,
        url,
        applied,
    })
}

/// Build a pool of at most `max_size` connections.
pub fn connect(runtime: &Runtime, url: &str, max_size: u32) -> Result<DbPool, String> {
    let config = PoolConfig::new(url)
        .with_max_size(max_size)
        .with_min_idle(Some(1));
    runtime
        .block_on(DbPool::new(config))
        .map_err(|err| err.to_string())
}

/// Insert a user row with a zero points total.
pub fn seed_user(url: &str, display_name: &str) -> Result<UserId, String> {
    let user_id = UserId::random();
    let mut client = Client::connect(url, NoTls).map_err(|err| format_postgres_error(&err))?;
    client
        .execute(
            "INSERT INTO users (id, display_name) VALUES ($1, $2)",
            &[user_id.as_uuid(), &display_name],
        )
        .map_err(|err| format_postgres_error(&err))?;
    Ok(user_id)
}
