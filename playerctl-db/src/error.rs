//! Error types for playerctl-db
//!
//! Absence of a row is never an error here; lookups return `Option`.

use std::io;
use std::path::PathBuf;

use sqlx::error::ErrorKind;
use thiserror::Error;

pub type DbResult<T> = Result<T, DbError>;

/// Database error type
#[derive(Error, Debug)]
pub enum DbError {
    /// An environment value could not be interpreted
    #[error("configuration error: {reason}")]
    Config { reason: String },

    /// The CA certificate named by `TIDB_CA_PATH` could not be read
    #[error("failed to read CA certificate {path:?}: {source}")]
    CaCertificate {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Opening, authenticating or pinging the connection failed
    #[error("unable to connect to the database: {0}")]
    Connection(#[source] sqlx::Error),

    /// Dropping or creating the table failed
    #[error("schema error during {statement}: {source}")]
    Schema {
        statement: &'static str,
        #[source]
        source: sqlx::Error,
    },

    /// A write violated a key or nullability constraint
    #[error("constraint violation: {0}")]
    Constraint(#[source] sqlx::Error),

    #[error("database error: {0}")]
    Query(#[from] sqlx::Error),
}

impl DbError {
    pub fn config(reason: impl Into<String>) -> Self {
        Self::Config {
            reason: reason.into(),
        }
    }

    pub fn schema(statement: &'static str, source: sqlx::Error) -> Self {
        Self::Schema { statement, source }
    }

    /// Classify a failed INSERT/UPDATE.
    ///
    /// Constraint violations become [`DbError::Constraint`]; everything
    /// else stays a plain query error.
    pub fn from_write(err: sqlx::Error) -> Self {
        if is_constraint_violation(&err) {
            Self::Constraint(err)
        } else {
            Self::Query(err)
        }
    }

    pub fn is_constraint(&self) -> bool {
        matches!(self, Self::Constraint(_))
    }

    pub fn is_connection(&self) -> bool {
        matches!(self, Self::Connection(_))
    }
}

fn is_constraint_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db) => matches!(
            db.kind(),
            ErrorKind::UniqueViolation
                | ErrorKind::NotNullViolation
                | ErrorKind::CheckViolation
                | ErrorKind::ForeignKeyViolation
        ),
        _ => false,
    }
}
