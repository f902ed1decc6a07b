//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts per aggregate.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes enforce model validation before SQL mutations.
//! - Repository APIs return semantic errors (`*NotFound`) in addition to
//!   DB transport errors.
//! - Busy/locked store errors surface as `TransientConflict`, never as a
//!   generic failure, so callers can retry.

use crate::db::DbError;
use crate::model::conference::{ConferenceId, ConferenceValidationError};
use crate::model::profile::UserId;
use crate::model::session::{SessionId, SessionValidationError};
use chrono::{NaiveDate, NaiveTime};
use rusqlite::{Connection, ErrorCode};
use std::error::Error;
use std::fmt::{Display, Formatter};

pub mod conference_repo;
pub mod profile_repo;
pub mod session_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Repository error shared by all aggregate repositories.
#[derive(Debug)]
pub enum RepoError {
    /// Underlying SQLite/bootstrap error.
    Db(DbError),
    /// Write conflict or lock contention; the caller should retry.
    TransientConflict,
    ProfileNotFound(UserId),
    ConferenceNotFound(ConferenceId),
    SessionNotFound(SessionId),
    /// Conference record failed model validation.
    ConferenceValidation(ConferenceValidationError),
    /// Session record failed model validation.
    SessionValidation(SessionValidationError),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    /// Required table is missing.
    MissingRequiredTable(&'static str),
    /// Required column is missing from expected table.
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Db(err) => write!(f, "{err}"),
            Self::TransientConflict => {
                write!(f, "store write conflict; operation should be retried")
            }
            Self::ProfileNotFound(id) => write!(f, "profile not found: {id}"),
            Self::ConferenceNotFound(id) => write!(f, "conference not found: {id}"),
            Self::SessionNotFound(id) => write!(f, "session not found: {id}"),
            Self::ConferenceValidation(err) => write!(f, "{err}"),
            Self::SessionValidation(err) => write!(f, "{err}"),
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Db(err) => Some(err),
            Self::ConferenceValidation(err) => Some(err),
            Self::SessionValidation(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        if is_busy_error(&value) {
            return Self::TransientConflict;
        }
        Self::Db(DbError::Sqlite(value))
    }
}

impl From<ConferenceValidationError> for RepoError {
    fn from(value: ConferenceValidationError) -> Self {
        Self::ConferenceValidation(value)
    }
}

impl From<SessionValidationError> for RepoError {
    fn from(value: SessionValidationError) -> Self {
        Self::SessionValidation(value)
    }
}

fn is_busy_error(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::DatabaseBusy
                || failure.code == ErrorCode::DatabaseLocked
    )
}

/// Allocates the next child-aggregate id for `kind` ('conference'/'session').
///
/// The sequence row is bumped atomically so concurrent allocators never
/// observe the same id.
pub(crate) fn allocate_id(conn: &Connection, kind: &'static str) -> RepoResult<i64> {
    let next: i64 = conn.query_row(
        "UPDATE id_allocations
         SET next_id = next_id + 1
         WHERE kind = ?1
         RETURNING next_id - 1;",
        [kind],
        |row| row.get(0),
    )?;
    Ok(next)
}

pub(crate) fn date_to_db(value: Option<NaiveDate>) -> Option<String> {
    value.map(|date| date.format("%Y-%m-%d").to_string())
}

pub(crate) fn time_to_db(value: Option<NaiveTime>) -> Option<String> {
    value.map(|time| time.format("%H:%M").to_string())
}

pub(crate) fn parse_db_date(value: &str, column: &'static str) -> RepoResult<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| RepoError::InvalidData(format!("invalid date `{value}` in {column}")))
}

pub(crate) fn parse_db_time(value: &str, column: &'static str) -> RepoResult<NaiveTime> {
    NaiveTime::parse_from_str(value, "%H:%M")
        .map_err(|_| RepoError::InvalidData(format!("invalid time `{value}` in {column}")))
}

/// Verifies the connection is migrated and carries the required schema.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    requirements: &[(&'static str, &[&'static str])],
) -> RepoResult<()> {
    let expected_version = crate::db::migrations::latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for (table, columns) in requirements {
        if !table_exists(conn, table)? {
            return Err(RepoError::MissingRequiredTable(table));
        }
        for column in *columns {
            if !table_has_column(conn, table, column)? {
                return Err(RepoError::MissingRequiredColumn { table, column });
            }
        }
    }

    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
