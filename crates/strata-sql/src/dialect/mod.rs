//! SQL dialect support.
//!
//! Statements render identifiers and placeholders through a dialect, so the
//! same AST can be compiled for different databases.

mod generic;

pub use generic::GenericDialect;

/// Trait for SQL dialect-specific behavior.
pub trait Dialect: Send + Sync {
    /// Returns the name of the dialect.
    fn name(&self) -> &'static str;

    /// Returns the identifier quote character (e.g., `"` for standard SQL, `` ` `` for MySQL).
    fn identifier_quote(&self) -> char {
        '"'
    }

    /// Returns the parameter placeholder style.
    fn parameter_placeholder(&self) -> &'static str {
        "?"
    }

    /// Returns whether the dialect supports `WITH RECURSIVE`.
    fn supports_recursive_cte(&self) -> bool {
        true
    }

    /// Quotes a single identifier, doubling embedded quote characters.
    fn quote_identifier(&self, name: &str) -> String {
        let quote = self.identifier_quote();
        let escaped = name.replace(quote, &format!("{quote}{quote}"));
        format!("{quote}{escaped}{quote}")
    }
}
