//! Query builders.
//!
//! Clause builders (where, columns, join, order, limit) accumulate statement
//! nodes; query builders own a table and compose the clause builders they
//! need. All values travel as bindings.

mod column_def;
mod columns;
mod delete;
mod index;
mod insert;
mod join;
mod limit;
mod order;
pub mod raw;
mod select;
mod table;
mod update;
pub mod value;
mod where_clause;

pub use column_def::{ColumnDefinition, DefaultValue, ForeignKeyAction, ForeignKeyDefinition};
pub use columns::{ColumnsBuilder, ColumnsClause};
pub use delete::DeleteQueryBuilder;
pub use index::IndexQueryBuilder;
pub use insert::{ConflictAction, InsertQueryBuilder, OnConflict};
pub use join::{JoinBuilder, JoinClause};
pub use limit::{LimitBuilder, LimitClause, ResultArity};
pub use order::{OrderByBuilder, OrderByClause, OrderSpec};
pub use raw::{raw, RawQuery};
pub use select::{RecursiveSpec, SelectQueryBuilder};
pub use table::{TableOperation, TableQueryBuilder};
pub use update::UpdateQueryBuilder;
pub use value::{SqlValue, ToSqlValue};
pub use where_clause::{NestedWhere, WhereArg, WhereBuilder, WhereClause};
