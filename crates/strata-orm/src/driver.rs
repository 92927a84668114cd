//! Driver contract.
//!
//! A driver runs one compiled expression with its bindings and reports
//! either the returned rows or the number of affected rows.

use futures::future::BoxFuture;
use strata_sql::{QueryContext, SqlValue};

use crate::error::{OrmError, Result};
use crate::model::Row;

/// What a driver returns for one expression.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryOutput {
    /// Rows of a data-returning statement.
    Rows(Vec<Row>),
    /// Outcome of a statement that returns no rows.
    Affected {
        /// Number of rows changed.
        rows: u64,
        /// Key of the last inserted row, when the database reports one.
        last_insert_id: Option<i64>,
    },
}

impl QueryOutput {
    /// Returns the rows, failing for a non-returning statement.
    pub fn into_rows(self) -> Result<Vec<Row>> {
        match self {
            Self::Rows(rows) => Ok(rows),
            Self::Affected { .. } => Err(OrmError::Driver(String::from(
                "expected rows, the statement returned an affected count",
            ))),
        }
    }

    /// Returns the number of rows returned or changed.
    #[must_use]
    pub fn rows_affected(&self) -> u64 {
        match self {
            Self::Rows(rows) => rows.len() as u64,
            Self::Affected { rows, .. } => *rows,
        }
    }

    /// Returns the key of the last inserted row.
    #[must_use]
    pub fn last_insert_id(&self) -> Option<i64> {
        match self {
            Self::Affected { last_insert_id, .. } => *last_insert_id,
            Self::Rows(_) => None,
        }
    }
}

/// Executes compiled expressions against a database.
///
/// `context` tells the driver whether rows are expected.
pub trait Driver: Send + Sync {
    /// Runs `expression` with `bindings` in placeholder order.
    fn execute<'a>(
        &'a self,
        expression: &'a str,
        bindings: &'a [SqlValue],
        context: QueryContext,
    ) -> BoxFuture<'a, Result<QueryOutput>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_into_rows_rejects_affected() {
        let output = QueryOutput::Affected {
            rows: 2,
            last_insert_id: Some(9),
        };
        assert_eq!(output.rows_affected(), 2);
        assert_eq!(output.last_insert_id(), Some(9));
        assert!(matches!(output.into_rows(), Err(OrmError::Driver(_))));
    }
}
