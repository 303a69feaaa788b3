//! Shared Diesel error mapping for the rewards adapters.
//!
//! Every driven port in this crate exposes the same two failure kinds,
//! `Connection` and `Query`. The helpers here take the port's constructors so
//! each adapter maps pool, Diesel and row-conversion failures identically.

use tracing::debug;

use super::models::InvalidRow;
use super::pool::PoolError;

/// Map pool errors into a port's connection error.
pub(super) fn map_pool_error<E, C>(error: PoolError, connection: C) -> E
where
    C: FnOnce(String) -> E,
{
    let message = match error {
        PoolError::Checkout { message } | PoolError::Build { message } => message,
    };
    connection(message)
}

/// Map Diesel errors into a port's query or connection error.
///
/// Lost connections and broken transaction state are reported as connection
/// failures so callers surface them as `ServiceUnavailable`.
pub(super) fn map_diesel_error<E, Q, C>(error: diesel::result::Error, query: Q, connection: C) -> E
where
    Q: FnOnce(&'static str) -> E,
    C: FnOnce(&'static str) -> E,
{
    use diesel::result::{DatabaseErrorKind, Error as DieselError};

    match &error {
        DieselError::DatabaseError(kind, info) => {
            debug!(?kind, message = info.message(), "diesel operation failed");
        }
        _ => debug!(error = %error, "diesel operation failed"),
    }

    match error {
        DieselError::NotFound => query("record not found"),
        DieselError::DatabaseError(DatabaseErrorKind::ClosedConnection, _)
        | DieselError::BrokenTransactionManager => connection("database connection error"),
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            query("unique constraint violated")
        }
        DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, _) => {
            query("referenced row does not exist")
        }
        DieselError::QueryBuilderError(_) => query("database query error"),
        _ => query("database error"),
    }
}

/// Map a stored row that failed domain conversion into a port's query error.
pub(super) fn map_row_error<E, Q>(error: &InvalidRow, query: Q) -> E
where
    Q: FnOnce(String) -> E,
{
    debug!(error = %error, "stored row rejected by domain conversion");
    query(error.to_string())
}

/// Convert a SQL count into the unsigned count the ports expose.
pub(super) fn count_to_u64(count: i64) -> u64 {
    u64::try_from(count).unwrap_or_default()
}

/// Convert a caller-supplied limit into a SQL `LIMIT` value.
pub(super) fn limit_to_i64(limit: usize) -> i64 {
    i64::try_from(limit).unwrap_or(i64::MAX)
}
