//! Order by clause.

use crate::ast::SortDirection;
use crate::error::{require_name, Result};

/// A single sort specification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderSpec {
    /// Sort column.
    pub column: String,
    /// Direction.
    pub direction: SortDirection,
    /// Qualifying table alias captured when the sort was set.
    pub table_alias: Option<String>,
}

/// Holds the sort of a select. A new sort replaces the previous one.
#[derive(Debug, Clone, Default)]
pub struct OrderByBuilder {
    order: Option<OrderSpec>,
    table_alias: Option<String>,
}

impl OrderByBuilder {
    /// Creates a builder without sort.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the alias captured by the next sort.
    pub fn set_table_alias(&mut self, alias: Option<String>) {
        self.table_alias = alias;
    }

    /// Returns the current sort.
    #[must_use]
    pub fn spec(&self) -> Option<&OrderSpec> {
        self.order.as_ref()
    }
}

/// Order operations shared by select builders.
pub trait OrderByClause {
    /// Returns the embedded order builder.
    fn order_builder(&self) -> &OrderByBuilder;

    /// Returns the embedded order builder mutably.
    fn order_builder_mut(&mut self) -> &mut OrderByBuilder;

    /// Sorts by `column` in `direction`.
    fn order(&mut self, column: &str, direction: SortDirection) -> Result<&mut Self> {
        require_name("order column", column)?;
        let builder = self.order_builder_mut();
        builder.order = Some(OrderSpec {
            column: String::from(column),
            direction,
            table_alias: builder.table_alias.clone(),
        });
        Ok(self)
    }

    /// Sorts ascending by `column`.
    fn order_by(&mut self, column: &str) -> Result<&mut Self> {
        self.order(column, SortDirection::Asc)
    }

    /// Sorts descending by `column`.
    fn order_by_descending(&mut self, column: &str) -> Result<&mut Self> {
        self.order(column, SortDirection::Desc)
    }

    /// Removes the sort.
    fn clear_order(&mut self) -> &mut Self {
        self.order_builder_mut().order = None;
        self
    }
}

impl OrderByClause for OrderByBuilder {
    fn order_builder(&self) -> &OrderByBuilder {
        self
    }

    fn order_builder_mut(&mut self) -> &mut OrderByBuilder {
        self
    }
}
