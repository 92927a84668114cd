//! CREATE INDEX builder.

use crate::compiler::{CompiledQuery, Compiler, QueryBuilder, QueryContext};
use crate::error::{Result, SqlError};

/// A CREATE [UNIQUE] INDEX statement.
///
/// Name, table and columns are checked when compiling.
#[derive(Debug, Clone, Default)]
pub struct IndexQueryBuilder {
    name: Option<String>,
    table: Option<String>,
    columns: Vec<String>,
    unique: bool,
    if_not_exists: bool,
}

impl IndexQueryBuilder {
    /// Creates an empty index statement.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the index name.
    pub fn name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the indexed table.
    pub fn table(&mut self, table: impl Into<String>) -> &mut Self {
        self.table = Some(table.into());
        self
    }

    /// Sets the indexed columns.
    pub fn columns<I, S>(&mut self, columns: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Makes the index unique.
    pub fn unique(&mut self) -> &mut Self {
        self.unique = true;
        self
    }

    /// Adds `IF NOT EXISTS`.
    pub fn if_not_exists(&mut self) -> &mut Self {
        self.if_not_exists = true;
        self
    }

    /// Returns whether the index is unique.
    #[must_use]
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Returns whether `IF NOT EXISTS` is set.
    #[must_use]
    pub fn is_if_not_exists(&self) -> bool {
        self.if_not_exists
    }

    /// Checks that name, table and columns are present and returns them.
    pub fn parts(&self) -> Result<(&str, &str, &[String])> {
        let name = self
            .name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .ok_or_else(|| SqlError::invalid_argument("index name is null or empty"))?;
        let table = self
            .table
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| SqlError::invalid_argument("index table is null or empty"))?;
        if self.columns.is_empty() || self.columns.iter().any(|c| c.trim().is_empty()) {
            return Err(SqlError::invalid_argument(format!(
                "index {name} needs at least one non-empty column"
            )));
        }
        Ok((name, table, &self.columns))
    }
}

impl QueryBuilder for IndexQueryBuilder {
    fn context(&self) -> QueryContext {
        QueryContext::Schema
    }

    fn compile(&self, compiler: &dyn Compiler) -> Result<CompiledQuery> {
        compiler.compile_index(self)
    }
}
