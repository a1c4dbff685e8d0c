//! Error types for depot.

use thiserror::Error;

/// Common error type for depot.
#[derive(Error, Debug)]
pub enum DepotError {
    /// An id or a stored path does not resolve.
    #[error("{0} not found")]
    NotFound(String),

    /// Duplicate sibling name, or an existing physical object at the target path.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Directory still has children and no recursive delete was requested.
    #[error("directory not empty: {0}")]
    NotEmpty(String),

    /// Malformed request data.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Filesystem error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Database error.
    ///
    /// Errors from sqlx are converted into this variant. Unique-constraint
    /// violations are mapped to [`DepotError::Conflict`] at the call site.
    #[error("database error: {0}")]
    Database(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl From<sqlx::Error> for DepotError {
    fn from(e: sqlx::Error) -> Self {
        DepotError::Database(e.to_string())
    }
}

impl DepotError {
    /// Map a sqlx error, turning unique-constraint violations into a conflict.
    pub fn from_write(e: sqlx::Error, what: &str) -> Self {
        match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DepotError::Conflict(format!("an item named {what} already exists"))
            }
            _ => DepotError::Database(e.to_string()),
        }
    }

    /// Like [`DepotError::from_write`], for writes keyed by a full path.
    pub fn from_path_write(e: sqlx::Error, path: &str) -> Self {
        match &e {
            sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
                DepotError::Conflict(format!("path {path} already exists"))
            }
            _ => DepotError::Database(e.to_string()),
        }
    }
}

/// Result type alias for depot operations.
pub type Result<T> = std::result::Result<T, DepotError>;
