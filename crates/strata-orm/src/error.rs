//! Error types for the ORM.

use strata_sql::SqlError;
use thiserror::Error;

/// ORM-specific errors.
#[derive(Debug, Error)]
pub enum OrmError {
    /// Query building or compilation error.
    #[error("query error: {0}")]
    Sql(#[from] SqlError),

    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A driver failed or returned an unexpected output.
    #[error("driver error: {0}")]
    Driver(String),

    /// `first_or_fail` found no row.
    #[error("query returned no rows")]
    EmptyResult,

    /// No model registered under this name.
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// The model declares no relation under this name.
    #[error("model {model} has no relation {relation}")]
    UnknownRelation {
        /// Model name.
        model: String,
        /// Requested relation.
        relation: String,
    },

    /// Operation not allowed in the current state.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// A model or relation descriptor is inconsistent.
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),

    /// Rows could not be turned into models.
    #[error("hydration error: {0}")]
    Hydration(String),
}

/// Result type alias for ORM operations.
pub type Result<T> = std::result::Result<T, OrmError>;
