//! Statement AST.
//!
//! Leaf nodes render a fragment plus ordered bindings; composite nodes render
//! their children left to right.

mod statement;
mod types;

pub use statement::{
    build_conditions, BetweenStatement, BuildContext, ColumnMethod, ColumnMethodStatement,
    ColumnStatement, Condition, Connective, ExistsStatement, Fragment, InSetStatement,
    InStatement, JoinMethod, JoinStatement, JoinTarget, Statement, WhereCondition,
    WhereGroupStatement, WhereStatement, WhereValue,
};
pub use types::{ColumnType, SortDirection, SqlOperator};
