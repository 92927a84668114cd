//! Join clauses.

use crate::ast::{JoinMethod, JoinStatement, JoinTarget, Statement};
use crate::error::{require_name, Result, SqlError};

use super::raw::RawQuery;
use super::select::SelectQueryBuilder;

/// Accumulates joins in declaration order.
#[derive(Debug, Clone, Default)]
pub struct JoinBuilder {
    joins: Vec<JoinStatement>,
    table_alias: Option<String>,
}

impl JoinBuilder {
    /// Creates an empty join list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the alias qualifying the foreign key of joins appended from now
    /// on.
    pub fn set_table_alias(&mut self, alias: Option<String>) {
        self.table_alias = alias;
    }

    /// Returns the joins.
    #[must_use]
    pub fn statements(&self) -> &[JoinStatement] {
        &self.joins
    }

    /// Returns whether no join was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.joins.is_empty()
    }

    /// Appends a pre-built join.
    pub fn push(&mut self, join: JoinStatement) {
        self.joins.push(join);
    }

    /// Removes every join.
    pub fn clear(&mut self) {
        self.joins.clear();
    }

    fn keyed(
        &self,
        method: JoinMethod,
        target: JoinTarget,
        alias: Option<&str>,
        foreign_key: &str,
        primary_key: &str,
    ) -> Result<JoinStatement> {
        if let Some(alias) = alias {
            require_name("join alias", alias)?;
        }
        require_name("foreign key", foreign_key)?;
        require_name("primary key", primary_key)?;
        Ok(JoinStatement {
            method,
            target,
            alias: alias.map(String::from),
            source_alias: self.table_alias.clone(),
            foreign_key: Some(String::from(foreign_key)),
            primary_key: Some(String::from(primary_key)),
        })
    }
}

fn table_target(table: &str) -> Result<JoinTarget> {
    require_name("join table", table)?;
    Ok(JoinTarget::Table {
        name: String::from(table),
        schema: None,
    })
}

/// Join operations shared by select builders.
///
/// Keyed joins render `ON target.primary_key = source.foreign_key`.
pub trait JoinClause {
    /// Returns the embedded join builder.
    fn join_builder(&self) -> &JoinBuilder;

    /// Returns the embedded join builder mutably.
    fn join_builder_mut(&mut self) -> &mut JoinBuilder;

    /// Joins `table`, optionally aliased, with any join kind.
    fn join(
        &mut self,
        method: JoinMethod,
        table: &str,
        alias: Option<&str>,
        foreign_key: &str,
        primary_key: &str,
    ) -> Result<&mut Self> {
        let builder = self.join_builder_mut();
        let join = builder.keyed(method, table_target(table)?, alias, foreign_key, primary_key)?;
        builder.push(join);
        Ok(self)
    }

    /// `INNER JOIN`.
    fn inner_join(&mut self, table: &str, foreign_key: &str, primary_key: &str) -> Result<&mut Self> {
        self.join(JoinMethod::Inner, table, None, foreign_key, primary_key)
    }

    /// `LEFT JOIN`.
    fn left_join(&mut self, table: &str, foreign_key: &str, primary_key: &str) -> Result<&mut Self> {
        self.join(JoinMethod::Left, table, None, foreign_key, primary_key)
    }

    /// `LEFT OUTER JOIN`.
    fn left_outer_join(
        &mut self,
        table: &str,
        foreign_key: &str,
        primary_key: &str,
    ) -> Result<&mut Self> {
        self.join(JoinMethod::LeftOuter, table, None, foreign_key, primary_key)
    }

    /// `RIGHT JOIN`.
    fn right_join(&mut self, table: &str, foreign_key: &str, primary_key: &str) -> Result<&mut Self> {
        self.join(JoinMethod::Right, table, None, foreign_key, primary_key)
    }

    /// `RIGHT OUTER JOIN`.
    fn right_outer_join(
        &mut self,
        table: &str,
        foreign_key: &str,
        primary_key: &str,
    ) -> Result<&mut Self> {
        self.join(JoinMethod::RightOuter, table, None, foreign_key, primary_key)
    }

    /// `FULL OUTER JOIN`.
    fn full_outer_join(
        &mut self,
        table: &str,
        foreign_key: &str,
        primary_key: &str,
    ) -> Result<&mut Self> {
        self.join(JoinMethod::FullOuter, table, None, foreign_key, primary_key)
    }

    /// `CROSS JOIN`, which takes no keys.
    fn cross_join(&mut self, table: &str) -> Result<&mut Self> {
        let target = table_target(table)?;
        self.join_builder_mut().push(JoinStatement {
            method: JoinMethod::Cross,
            target,
            alias: None,
            source_alias: None,
            foreign_key: None,
            primary_key: None,
        });
        Ok(self)
    }

    /// Joins a raw fragment; the fragment carries its own ON condition.
    fn join_raw(&mut self, method: JoinMethod, raw: RawQuery) -> &mut Self {
        self.join_builder_mut().push(JoinStatement {
            method,
            target: JoinTarget::Raw(raw),
            alias: None,
            source_alias: None,
            foreign_key: None,
            primary_key: None,
        });
        self
    }

    /// Joins a select subquery, which must be aliased.
    fn join_query(
        &mut self,
        method: JoinMethod,
        query: SelectQueryBuilder,
        alias: &str,
        foreign_key: &str,
        primary_key: &str,
    ) -> Result<&mut Self> {
        if alias.trim().is_empty() {
            return Err(SqlError::invalid_argument(
                "a joined subquery requires an alias",
            ));
        }
        let builder = self.join_builder_mut();
        let join = builder.keyed(
            method,
            JoinTarget::Query(Box::new(query)),
            Some(alias),
            foreign_key,
            primary_key,
        )?;
        builder.push(join);
        Ok(self)
    }

    /// Appends a pre-built join.
    fn join_statement(&mut self, join: JoinStatement) -> &mut Self {
        self.join_builder_mut().push(join);
        self
    }

    /// Removes every join.
    fn clear_joins(&mut self) -> &mut Self {
        self.join_builder_mut().clear();
        self
    }
}

impl JoinClause for JoinBuilder {
    fn join_builder(&self) -> &JoinBuilder {
        self
    }

    fn join_builder_mut(&mut self) -> &mut JoinBuilder {
        self
    }
}

/// Converts a join statement back into a [`Statement`].
impl From<JoinStatement> for Statement {
    fn from(join: JoinStatement) -> Self {
        Self::Join(join)
    }
}
