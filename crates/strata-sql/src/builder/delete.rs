//! DELETE query builder.

use crate::compiler::{CompiledQuery, Compiler, QueryBuilder, QueryContext};
use crate::error::{require_name, Result};

use super::where_clause::{WhereBuilder, WhereClause};

/// A DELETE with a where clause.
#[derive(Debug, Clone)]
pub struct DeleteQueryBuilder {
    table: String,
    schema: Option<String>,
    wheres: WhereBuilder,
}

impl DeleteQueryBuilder {
    /// Creates a delete from `table`.
    pub fn new(table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        require_name("table", &table)?;
        Ok(Self {
            table,
            schema: None,
            wheres: WhereBuilder::new(),
        })
    }

    /// Returns the table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the schema (database) name.
    #[must_use]
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Qualifies the table with a schema.
    pub fn set_schema(&mut self, schema: impl Into<String>) -> Result<&mut Self> {
        let schema = schema.into();
        require_name("schema", &schema)?;
        self.schema = Some(schema);
        Ok(self)
    }
}

impl WhereClause for DeleteQueryBuilder {
    fn where_builder(&self) -> &WhereBuilder {
        &self.wheres
    }

    fn where_builder_mut(&mut self) -> &mut WhereBuilder {
        &mut self.wheres
    }
}

impl QueryBuilder for DeleteQueryBuilder {
    fn context(&self) -> QueryContext {
        QueryContext::Delete
    }

    fn compile(&self, compiler: &dyn Compiler) -> Result<CompiledQuery> {
        compiler.compile_delete(self)
    }
}
