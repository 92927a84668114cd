//! Raw SQL fragments.

use super::value::{SqlValue, ToSqlValue};

/// A literal SQL fragment with its own ordered bindings.
///
/// Accepted anywhere a column, a where value, a where condition or a join
/// target is accepted. The text is emitted verbatim; placeholders inside it
/// must match `bindings` in order.
#[derive(Debug, Clone, PartialEq)]
pub struct RawQuery {
    text: String,
    bindings: Vec<SqlValue>,
}

impl RawQuery {
    /// Creates a raw fragment without bindings.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            bindings: Vec::new(),
        }
    }

    /// Creates a raw fragment with bindings.
    #[must_use]
    pub fn with_bindings<T: ToSqlValue>(
        text: impl Into<String>,
        bindings: impl IntoIterator<Item = T>,
    ) -> Self {
        Self {
            text: text.into(),
            bindings: bindings.into_iter().map(ToSqlValue::to_sql_value).collect(),
        }
    }

    /// Returns the SQL text.
    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Returns the bindings.
    #[must_use]
    pub fn bindings(&self) -> &[SqlValue] {
        &self.bindings
    }
}

/// Shorthand for [`RawQuery::new`].
#[must_use]
pub fn raw(text: impl Into<String>) -> RawQuery {
    RawQuery::new(text)
}
