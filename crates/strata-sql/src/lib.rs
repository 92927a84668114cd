//! # strata-sql
//!
//! Query statement model, fluent query builders and the compiler contract.
//!
//! This crate provides:
//! - A statement AST whose nodes render a fragment plus ordered bindings
//! - Clause builders (where, columns, join, order, limit) validating every
//!   fluent call before anything reaches a database
//! - Query builders for select, insert, update, delete, table and index
//!   statements
//! - A [`Compiler`] trait and a [`GenericCompiler`] producing SQL that SQLite
//!   accepts
//!
//! ## Building a query
//!
//! ```rust
//! use strata_sql::prelude::*;
//! use strata_sql::{GenericCompiler, SelectQueryBuilder};
//!
//! let mut query = SelectQueryBuilder::new("users").unwrap();
//! query
//!     .columns(["id", "name"])
//!     .unwrap()
//!     .where_("active", true)
//!     .unwrap()
//!     .or_where(("role", "admin"))
//!     .unwrap()
//!     .order_by_descending("id")
//!     .unwrap()
//!     .take(10)
//!     .unwrap();
//!
//! let compiled = query.compile(&GenericCompiler::new()).unwrap();
//! assert_eq!(
//!     compiled.expression,
//!     "SELECT \"id\", \"name\" FROM \"users\" WHERE \"active\" = ? OR \"role\" = ? \
//!      ORDER BY \"id\" DESC LIMIT 10"
//! );
//! assert_eq!(compiled.bindings.len(), 2);
//! ```
//!
//! ## SQL Injection Prevention
//!
//! Values are never inlined into the expression; they travel as bindings in
//! placeholder order. Only [`RawQuery`] text is emitted verbatim.

pub mod ast;
pub mod builder;
pub mod compiler;
pub mod dialect;
mod error;

pub use ast::{Statement, WhereValue};
pub use builder::{
    raw, DeleteQueryBuilder, IndexQueryBuilder, InsertQueryBuilder, RawQuery, SelectQueryBuilder,
    SqlValue, TableQueryBuilder, ToSqlValue, UpdateQueryBuilder, WhereArg, WhereBuilder,
};
pub use compiler::{CompiledQuery, Compiler, GenericCompiler, QueryBuilder, QueryContext};
pub use dialect::{Dialect, GenericDialect};
pub use error::{Result, SqlError};

/// Clause traits, needed in scope to call the forwarded builder operations.
pub mod prelude {
    pub use crate::builder::{ColumnsClause, JoinClause, LimitClause, OrderByClause, WhereClause};
    pub use crate::compiler::QueryBuilder;
}
