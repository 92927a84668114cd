//! Compiler contract.
//!
//! A compiler turns a query builder's accumulated state into an expression
//! and its ordered bindings. Every `compile_*` method has a default that
//! reports the query kind as unsupported, so a compiler only implements the
//! kinds its database handles.

mod generic;

pub use generic::GenericCompiler;

use crate::builder::{
    DeleteQueryBuilder, IndexQueryBuilder, InsertQueryBuilder, SelectQueryBuilder, SqlValue,
    TableQueryBuilder, UpdateQueryBuilder,
};
use crate::dialect::Dialect;
use crate::error::{Result, SqlError};

/// The kind of statement a query builder produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryContext {
    /// Returns rows.
    Select,
    /// Inserts rows.
    Insert,
    /// Updates rows.
    Update,
    /// Deletes rows.
    Delete,
    /// DDL.
    Schema,
}

impl QueryContext {
    /// Returns whether the statement produces rows.
    #[must_use]
    pub const fn returns_rows(self) -> bool {
        matches!(self, Self::Select)
    }
}

/// Compiler output. Bindings appear in placeholder order.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    /// SQL text.
    pub expression: String,
    /// Ordered bindings.
    pub bindings: Vec<SqlValue>,
}

impl CompiledQuery {
    /// Creates a compiled query.
    #[must_use]
    pub fn new(expression: impl Into<String>, bindings: Vec<SqlValue>) -> Self {
        Self {
            expression: expression.into(),
            bindings,
        }
    }
}

fn not_implemented(kind: &str, dialect: &dyn Dialect) -> SqlError {
    SqlError::NotImplemented(format!(
        "{kind} queries are not supported by the {} compiler",
        dialect.name()
    ))
}

/// Turns query builders into SQL for one dialect.
pub trait Compiler: Send + Sync {
    /// Returns the dialect used for quoting and placeholders.
    fn dialect(&self) -> &dyn Dialect;

    /// Compiles a SELECT.
    fn compile_select(&self, query: &SelectQueryBuilder) -> Result<CompiledQuery> {
        let _ = query;
        Err(not_implemented("select", self.dialect()))
    }

    /// Compiles an INSERT.
    fn compile_insert(&self, query: &InsertQueryBuilder) -> Result<CompiledQuery> {
        let _ = query;
        Err(not_implemented("insert", self.dialect()))
    }

    /// Compiles an UPDATE.
    fn compile_update(&self, query: &UpdateQueryBuilder) -> Result<CompiledQuery> {
        let _ = query;
        Err(not_implemented("update", self.dialect()))
    }

    /// Compiles a DELETE.
    fn compile_delete(&self, query: &DeleteQueryBuilder) -> Result<CompiledQuery> {
        let _ = query;
        Err(not_implemented("delete", self.dialect()))
    }

    /// Compiles a CREATE or DROP TABLE.
    fn compile_table(&self, query: &TableQueryBuilder) -> Result<CompiledQuery> {
        let _ = query;
        Err(not_implemented("table", self.dialect()))
    }

    /// Compiles a CREATE INDEX.
    fn compile_index(&self, query: &IndexQueryBuilder) -> Result<CompiledQuery> {
        let _ = query;
        Err(not_implemented("index", self.dialect()))
    }
}

/// A builder that can be compiled and executed.
pub trait QueryBuilder {
    /// Returns the kind of statement produced.
    fn context(&self) -> QueryContext;

    /// Compiles the builder with `compiler`.
    fn compile(&self, compiler: &dyn Compiler) -> Result<CompiledQuery>;
}
