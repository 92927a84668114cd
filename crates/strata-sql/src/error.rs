//! Error types for statement and query building.

use thiserror::Error;

/// Errors raised while building or compiling a query.
///
/// Builder validation happens synchronously, before any I/O.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SqlError {
    /// A fluent call received an argument it cannot accept.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The call is valid on its own but not in the builder's current state.
    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    /// A compiler does not handle this query kind.
    #[error("not implemented: {0}")]
    NotImplemented(String),
}

impl SqlError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    pub(crate) fn invalid_operation(message: impl Into<String>) -> Self {
        Self::InvalidOperation(message.into())
    }
}

/// Result type alias for builder operations.
pub type Result<T> = std::result::Result<T, SqlError>;

/// Rejects empty (or whitespace only) identifiers.
pub(crate) fn require_name(kind: &str, name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(SqlError::invalid_argument(format!(
            "{kind} name is null or empty"
        )));
    }
    Ok(())
}
