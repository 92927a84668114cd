//! SELECT query builder.
//!
//! Composes the clause builders and forwards their operations through the
//! clause traits:
//!
//! ```rust
//! use strata_sql::prelude::*;
//! use strata_sql::{GenericCompiler, SelectQueryBuilder};
//!
//! let mut query = SelectQueryBuilder::new("users").unwrap();
//! query.select("id").unwrap().where_("active", true).unwrap();
//!
//! let compiled = query.compile(&GenericCompiler::new()).unwrap();
//! assert_eq!(
//!     compiled.expression,
//!     "SELECT \"id\" FROM \"users\" WHERE \"active\" = ?"
//! );
//! ```

use crate::compiler::{CompiledQuery, Compiler, QueryBuilder, QueryContext};
use crate::error::{require_name, Result};

use super::columns::{ColumnsBuilder, ColumnsClause};
use super::join::{JoinBuilder, JoinClause};
use super::limit::{LimitBuilder, LimitClause};
use super::order::{OrderByBuilder, OrderByClause};
use super::where_clause::{WhereBuilder, WhereClause};

/// Self-referencing traversal of a select: rows are followed from
/// `foreign_key` to the `primary_key` of the same table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecursiveSpec {
    /// Column pointing at the parent row.
    pub foreign_key: String,
    /// Column identifying a row.
    pub primary_key: String,
}

/// A SELECT query.
#[derive(Debug, Clone)]
pub struct SelectQueryBuilder {
    table: String,
    alias: Option<String>,
    schema: Option<String>,
    columns: ColumnsBuilder,
    wheres: WhereBuilder,
    joins: JoinBuilder,
    order: OrderByBuilder,
    limit: LimitBuilder,
    group_by: Vec<String>,
    recursive: Option<RecursiveSpec>,
}

impl SelectQueryBuilder {
    /// Creates a select over `table`.
    pub fn new(table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        require_name("table", &table)?;
        Ok(Self {
            table,
            alias: None,
            schema: None,
            columns: ColumnsBuilder::new(),
            wheres: WhereBuilder::new(),
            joins: JoinBuilder::new(),
            order: OrderByBuilder::new(),
            limit: LimitBuilder::new(),
            group_by: Vec::new(),
            recursive: None,
        })
    }

    /// Returns the table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the table alias.
    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Aliases the table. Clauses appended afterwards are qualified with it.
    pub fn set_alias(&mut self, alias: impl Into<String>) -> Result<&mut Self> {
        let alias = alias.into();
        require_name("alias", &alias)?;
        self.columns.set_table_alias(Some(alias.clone()));
        self.wheres.set_table_alias(Some(alias.clone()));
        self.joins.set_table_alias(Some(alias.clone()));
        self.order.set_table_alias(Some(alias.clone()));
        self.alias = Some(alias);
        Ok(self)
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

    /// Appends a grouping column.
    pub fn group_by(&mut self, column: &str) -> Result<&mut Self> {
        require_name("group by column", column)?;
        self.group_by.push(String::from(column));
        Ok(self)
    }

    /// Returns the grouping columns.
    #[must_use]
    pub fn group_by_columns(&self) -> &[String] {
        &self.group_by
    }

    /// Turns the select into a recursive traversal of its own table.
    ///
    /// The current where clause selects the anchor rows; each step adds the
    /// rows whose `primary_key` equals a collected row's `foreign_key`.
    pub fn recursive(&mut self, foreign_key: &str, primary_key: &str) -> Result<&mut Self> {
        require_name("foreign key", foreign_key)?;
        require_name("primary key", primary_key)?;
        self.recursive = Some(RecursiveSpec {
            foreign_key: String::from(foreign_key),
            primary_key: String::from(primary_key),
        });
        Ok(self)
    }

    /// Returns the recursive traversal, if any.
    #[must_use]
    pub fn recursive_spec(&self) -> Option<&RecursiveSpec> {
        self.recursive.as_ref()
    }
}

impl WhereClause for SelectQueryBuilder {
    fn where_builder(&self) -> &WhereBuilder {
        &self.wheres
    }

    fn where_builder_mut(&mut self) -> &mut WhereBuilder {
        &mut self.wheres
    }
}

impl ColumnsClause for SelectQueryBuilder {
    fn columns_builder(&self) -> &ColumnsBuilder {
        &self.columns
    }

    fn columns_builder_mut(&mut self) -> &mut ColumnsBuilder {
        &mut self.columns
    }
}

impl JoinClause for SelectQueryBuilder {
    fn join_builder(&self) -> &JoinBuilder {
        &self.joins
    }

    fn join_builder_mut(&mut self) -> &mut JoinBuilder {
        &mut self.joins
    }
}

impl OrderByClause for SelectQueryBuilder {
    fn order_builder(&self) -> &OrderByBuilder {
        &self.order
    }

    fn order_builder_mut(&mut self) -> &mut OrderByBuilder {
        &mut self.order
    }
}

impl LimitClause for SelectQueryBuilder {
    fn limit_builder(&self) -> &LimitBuilder {
        &self.limit
    }

    fn limit_builder_mut(&mut self) -> &mut LimitBuilder {
        &mut self.limit
    }
}

impl QueryBuilder for SelectQueryBuilder {
    fn context(&self) -> QueryContext {
        QueryContext::Select
    }

    fn compile(&self, compiler: &dyn Compiler) -> Result<CompiledQuery> {
        compiler.compile_select(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::limit::ResultArity;
    use crate::error::SqlError;

    #[test]
    fn test_new_rejects_empty_table() {
        assert!(matches!(
            SelectQueryBuilder::new(""),
            Err(SqlError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_alias_propagates_to_clauses() {
        let mut query = SelectQueryBuilder::new("posts").unwrap();
        query.set_alias("p").unwrap();
        query.where_("id", 1).unwrap();
        assert_eq!(query.where_builder().table_alias(), Some("p"));
        assert_eq!(query.alias(), Some("p"));
    }

    #[test]
    fn test_first_forwards_to_limit() {
        let mut query = SelectQueryBuilder::new("posts").unwrap();
        query.first();
        assert_eq!(query.limit_builder().limit(), Some(1));
        assert_eq!(query.limit_builder().arity(), ResultArity::First);
    }

    #[test]
    fn test_recursive_requires_keys() {
        let mut query = SelectQueryBuilder::new("categories").unwrap();
        assert!(query.recursive("", "id").is_err());
        query.recursive("parent_id", "id").unwrap();
        assert_eq!(
            query.recursive_spec().map(|r| r.foreign_key.as_str()),
            Some("parent_id")
        );
    }
}
