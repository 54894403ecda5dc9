//! Error types for statement building and execution.

use thiserror::Error;

/// Errors returned while compiling or running a statement.
#[derive(Debug, Error)]
pub enum Error {
    /// An `IN` condition was given no values.
    #[error("IN list for '{0}' is empty")]
    EmptyInList(String),

    /// A condition rendered an empty fragment and cannot join the WHERE clause.
    #[error("condition rendered an empty fragment")]
    EmptyCondition,

    /// An INSERT was compiled before any column was added.
    #[error("INSERT INTO {0} has no columns")]
    NoColumns(String),

    /// The database rejected the statement.
    #[error("query failed: {sql}")]
    Query {
        /// The statement that failed.
        sql: String,
        /// Driver error.
        #[source]
        source: sqlx::Error,
    },

    /// A result row could not be mapped onto the target record.
    #[error("failed to map row {index}: {source}")]
    Materialize {
        /// Zero-based position of the row in the result set.
        index: usize,
        /// Mapping error reported by `FromRow`.
        #[source]
        source: sqlx::Error,
    },

    /// Any other driver error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl Error {
    pub(crate) fn query(sql: &str, source: sqlx::Error) -> Self {
        Self::Query {
            sql: String::from(sql),
            source,
        }
    }
}

/// Result type alias for sqlchain operations.
pub type Result<T> = std::result::Result<T, Error>;
