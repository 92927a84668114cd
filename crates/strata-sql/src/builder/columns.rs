//! Selected columns.

use crate::ast::{ColumnMethod, ColumnMethodStatement, ColumnStatement, Statement};
use crate::error::{require_name, Result, SqlError};

use super::raw::RawQuery;

/// Accumulates the column list of a select.
#[derive(Debug, Clone, Default)]
pub struct ColumnsBuilder {
    columns: Vec<Statement>,
    distinct: bool,
    table_alias: Option<String>,
}

impl ColumnsBuilder {
    /// Creates an empty column list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the alias captured by columns appended from now on.
    pub fn set_table_alias(&mut self, alias: Option<String>) {
        self.table_alias = alias;
    }

    /// Returns the column statements.
    #[must_use]
    pub fn statements(&self) -> &[Statement] {
        &self.columns
    }

    /// Returns whether DISTINCT was requested.
    #[must_use]
    pub fn is_distinct(&self) -> bool {
        self.distinct
    }

    /// Returns whether at least one explicit, non-wildcard column is selected.
    #[must_use]
    pub fn has_explicit_columns(&self) -> bool {
        self.columns.iter().any(|statement| !statement.is_wildcard())
    }

    /// Appends a pre-built column statement.
    pub fn push(&mut self, statement: Statement) {
        self.columns.push(statement);
    }

    /// Removes every column and the DISTINCT flag.
    pub fn clear(&mut self) {
        self.columns.clear();
        self.distinct = false;
    }

    fn column(&self, column: &str) -> Result<ColumnStatement> {
        require_name("column", column)?;
        Ok(ColumnStatement::new(column).with_table_alias(self.table_alias.clone()))
    }

    fn method(&mut self, method: ColumnMethod, column: &str, alias: Option<&str>) -> Result<()> {
        require_name("column", column)?;
        if let Some(alias) = alias {
            require_name("alias", alias)?;
        }
        self.columns
            .push(Statement::ColumnMethod(ColumnMethodStatement {
                method,
                column: String::from(column),
                alias: alias.map(String::from),
                table_alias: self.table_alias.clone(),
            }));
        Ok(())
    }
}

/// Column operations shared by select builders.
pub trait ColumnsClause {
    /// Returns the embedded column builder.
    fn columns_builder(&self) -> &ColumnsBuilder;

    /// Returns the embedded column builder mutably.
    fn columns_builder_mut(&mut self) -> &mut ColumnsBuilder;

    /// Selects one column.
    fn select(&mut self, column: &str) -> Result<&mut Self> {
        let builder = self.columns_builder_mut();
        let statement = builder.column(column)?;
        builder.push(Statement::Column(statement));
        Ok(self)
    }

    /// Selects one column under an output alias.
    fn select_as(&mut self, column: &str, alias: &str) -> Result<&mut Self> {
        require_name("alias", alias)?;
        let builder = self.columns_builder_mut();
        let statement = builder.column(column)?.with_alias(alias);
        builder.push(Statement::Column(statement));
        Ok(self)
    }

    /// Selects a raw expression.
    fn select_raw(&mut self, raw: RawQuery) -> &mut Self {
        self.columns_builder_mut().push(Statement::ColumnRaw(raw));
        self
    }

    /// Replaces the column list.
    fn columns<I, S>(&mut self, columns: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let builder = self.columns_builder_mut();
        builder.columns.clear();
        for column in columns {
            let statement = builder.column(column.as_ref())?;
            builder.push(Statement::Column(statement));
        }
        Ok(self)
    }

    /// Removes every selected column.
    fn clear_columns(&mut self) -> &mut Self {
        self.columns_builder_mut().clear();
        self
    }

    /// `COUNT(column)`; `*` counts rows.
    fn count(&mut self, column: &str, alias: Option<&str>) -> Result<&mut Self> {
        self.columns_builder_mut()
            .method(ColumnMethod::Count, column, alias)?;
        Ok(self)
    }

    /// `MIN(column)`.
    fn min(&mut self, column: &str, alias: Option<&str>) -> Result<&mut Self> {
        self.columns_builder_mut()
            .method(ColumnMethod::Min, column, alias)?;
        Ok(self)
    }

    /// `MAX(column)`.
    fn max(&mut self, column: &str, alias: Option<&str>) -> Result<&mut Self> {
        self.columns_builder_mut()
            .method(ColumnMethod::Max, column, alias)?;
        Ok(self)
    }

    /// `SUM(column)`.
    fn sum(&mut self, column: &str, alias: Option<&str>) -> Result<&mut Self> {
        self.columns_builder_mut()
            .method(ColumnMethod::Sum, column, alias)?;
        Ok(self)
    }

    /// `AVG(column)`.
    fn avg(&mut self, column: &str, alias: Option<&str>) -> Result<&mut Self> {
        self.columns_builder_mut()
            .method(ColumnMethod::Avg, column, alias)?;
        Ok(self)
    }

    /// Requests `SELECT DISTINCT`.
    ///
    /// Only valid once an explicit column list exists.
    fn distinct(&mut self) -> Result<&mut Self> {
        let builder = self.columns_builder_mut();
        if !builder.has_explicit_columns() {
            return Err(SqlError::invalid_operation(
                "distinct requires at least one explicit column",
            ));
        }
        builder.distinct = true;
        Ok(self)
    }
}

impl ColumnsClause for ColumnsBuilder {
    fn columns_builder(&self) -> &ColumnsBuilder {
        self
    }

    fn columns_builder_mut(&mut self) -> &mut ColumnsBuilder {
        self
    }
}
