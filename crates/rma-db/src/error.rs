//! Error types for rma-db.

use thiserror::Error;

/// Result type alias for rma-db operations.
pub type DbResult<T> = Result<T, DbError>;

/// Errors that can occur in rma-db operations.
#[derive(Debug, Error)]
pub enum DbError {
    /// The underlying SQLite call failed.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A row that was expected to exist could not be found.
    #[error("Row not found: {what}")]
    NotFound {
        /// Description of the missing row.
        what: String,
    },

    /// A stored value could not be interpreted.
    #[error("Corrupt row in `{table}`: {message}")]
    CorruptRow {
        /// The table holding the bad row.
        table: String,
        /// Description of the problem.
        message: String,
    },

    /// IO error wrapper.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal error.
    #[error("Internal error: {message}")]
    Internal {
        /// Description of the failure.
        message: String,
    },
}

impl DbError {
    /// Create a not-found error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound { what: what.into() }
    }

    /// Create a corrupt-row error.
    pub fn corrupt_row(table: impl Into<String>, message: impl Into<String>) -> Self {
        Self::CorruptRow {
            table: table.into(),
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}
