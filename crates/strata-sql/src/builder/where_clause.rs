//! Where clause accumulation.
//!
//! The builder resolves every fluent call into [`Statement`] nodes and joins
//! them with the connective that was pending when the call was made.

use std::mem;

use crate::ast::{
    BetweenStatement, Condition, Connective, ExistsStatement, InSetStatement, InStatement,
    SqlOperator, Statement, WhereCondition, WhereGroupStatement, WhereStatement, WhereValue,
};
use crate::error::{require_name, Result};

use super::raw::RawQuery;
use super::select::SelectQueryBuilder;
use super::value::{SqlValue, ToSqlValue};

/// Callback filling a nested where builder.
pub type NestedWhere<'a> = Box<dyn FnOnce(&mut WhereBuilder) -> Result<()> + 'a>;

/// The argument shapes accepted by [`WhereClause::where_args`].
pub enum WhereArg<'a> {
    /// `TRUE` / `FALSE`.
    Bool(bool),
    /// A raw condition with its own bindings.
    Raw(RawQuery),
    /// A nested builder rendered as a parenthesized group.
    Nested(NestedWhere<'a>),
    /// `column = value` for each entry, AND-combined.
    Map(Vec<(String, SqlValue)>),
    /// `column = value`.
    Pair(String, WhereValue),
    /// `column <operator> value`.
    Triple(String, String, WhereValue),
}

impl<'a> WhereArg<'a> {
    /// Wraps a nested builder callback.
    pub fn nested<F>(f: F) -> Self
    where
        F: FnOnce(&mut WhereBuilder) -> Result<()> + 'a,
    {
        Self::Nested(Box::new(f))
    }

    /// Collects a key/value mapping, keeping its iteration order.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToSqlValue,
    {
        Self::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.to_sql_value()))
                .collect(),
        )
    }
}

impl std::fmt::Debug for WhereArg<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => f.debug_tuple("Bool").field(b).finish(),
            Self::Raw(raw) => f.debug_tuple("Raw").field(raw).finish(),
            Self::Nested(_) => f.write_str("Nested(..)"),
            Self::Map(entries) => f.debug_tuple("Map").field(entries).finish(),
            Self::Pair(c, v) => f.debug_tuple("Pair").field(c).field(v).finish(),
            Self::Triple(c, o, v) => f.debug_tuple("Triple").field(c).field(o).field(v).finish(),
        }
    }
}

impl From<bool> for WhereArg<'_> {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<RawQuery> for WhereArg<'_> {
    fn from(raw: RawQuery) -> Self {
        Self::Raw(raw)
    }
}

impl<C: Into<String>, V: Into<WhereValue>> From<(C, V)> for WhereArg<'_> {
    fn from((column, value): (C, V)) -> Self {
        Self::Pair(column.into(), value.into())
    }
}

impl<C: Into<String>, O: Into<String>, V: Into<WhereValue>> From<(C, O, V)> for WhereArg<'_> {
    fn from((column, operator, value): (C, O, V)) -> Self {
        Self::Triple(column.into(), operator.into(), value.into())
    }
}

/// Accumulates where conditions.
#[derive(Debug, Clone, Default)]
pub struct WhereBuilder {
    conditions: Vec<Condition>,
    pending: Connective,
    table_alias: Option<String>,
}

impl WhereBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty builder qualifying new columns with `alias`.
    #[must_use]
    pub fn with_table_alias(alias: Option<String>) -> Self {
        Self {
            table_alias: alias,
            ..Self::default()
        }
    }

    /// Sets the alias captured by statements appended from now on.
    pub fn set_table_alias(&mut self, alias: Option<String>) {
        self.table_alias = alias;
    }

    /// Returns the alias captured by new statements.
    #[must_use]
    pub fn table_alias(&self) -> Option<&str> {
        self.table_alias.as_deref()
    }

    /// Returns the accumulated conditions.
    #[must_use]
    pub fn conditions(&self) -> &[Condition] {
        &self.conditions
    }

    /// Returns whether no condition was appended.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    /// Consumes the builder, returning its conditions.
    #[must_use]
    pub fn into_conditions(self) -> Vec<Condition> {
        self.conditions
    }

    /// Sets the connective of the next appended statement.
    pub fn set_connective(&mut self, connective: Connective) {
        self.pending = connective;
    }

    /// Removes every condition and resets the connective.
    pub fn clear(&mut self) {
        self.conditions.clear();
        self.pending = Connective::And;
    }

    /// Appends resolved statements. The pending connective is consumed even
    /// when resolution failed.
    pub(crate) fn push_resolved(&mut self, resolved: Result<Vec<Statement>>) -> Result<()> {
        let connective = mem::take(&mut self.pending);
        for (index, statement) in resolved?.into_iter().enumerate() {
            let connective = if index == 0 {
                connective
            } else {
                Connective::And
            };
            self.conditions.push(Condition {
                connective,
                statement,
            });
        }
        Ok(())
    }

    fn single(&self, column: &str, condition: WhereCondition) -> Result<Statement> {
        require_name("column", column)?;
        Ok(Statement::Where(WhereStatement {
            column: String::from(column),
            table_alias: self.table_alias.clone(),
            condition,
        }))
    }

    fn equals(&self, column: &str, value: WhereValue) -> Result<Statement> {
        if value.is_null() {
            return self.single(column, WhereCondition::IsNull);
        }
        self.single(
            column,
            WhereCondition::Compare {
                operator: SqlOperator::Eq,
                value,
            },
        )
    }

    pub(crate) fn resolve(&self, arg: WhereArg<'_>) -> Result<Vec<Statement>> {
        match arg {
            WhereArg::Bool(value) => Ok(vec![Statement::Raw(RawQuery::new(if value {
                "TRUE"
            } else {
                "FALSE"
            }))]),
            WhereArg::Raw(raw) => Ok(vec![Statement::Raw(raw)]),
            WhereArg::Nested(fill) => {
                let mut nested = Self::with_table_alias(self.table_alias.clone());
                fill(&mut nested)?;
                if nested.is_empty() {
                    return Ok(Vec::new());
                }
                Ok(vec![Statement::WhereGroup(WhereGroupStatement {
                    conditions: nested.into_conditions(),
                })])
            }
            WhereArg::Map(entries) => entries
                .into_iter()
                .map(|(column, value)| self.equals(&column, WhereValue::Value(value)))
                .collect(),
            WhereArg::Pair(column, value) => Ok(vec![self.equals(&column, value)?]),
            WhereArg::Triple(column, operator, value) => {
                let operator: SqlOperator = operator.parse()?;
                let condition = match operator {
                    SqlOperator::IsNull => WhereCondition::IsNull,
                    SqlOperator::IsNotNull => WhereCondition::IsNotNull,
                    _ if value.is_null() => WhereCondition::IsNull,
                    _ => WhereCondition::Compare { operator, value },
                };
                Ok(vec![self.single(&column, condition)?])
            }
        }
    }

    fn membership<I, V>(&self, column: &str, values: I, negated: bool) -> Result<Statement>
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        require_name("column", column)?;
        Ok(Statement::In(InStatement {
            column: String::from(column),
            table_alias: self.table_alias.clone(),
            values: values.into_iter().map(ToSqlValue::to_sql_value).collect(),
            negated,
        }))
    }

    fn set_membership<I, V>(&self, column: &str, values: I, negated: bool) -> Result<Statement>
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        require_name("column", column)?;
        Ok(Statement::InSet(InSetStatement {
            column: String::from(column),
            table_alias: self.table_alias.clone(),
            values: values.into_iter().map(ToSqlValue::to_sql_value).collect(),
            negated,
        }))
    }

    fn between<L, H>(&self, column: &str, low: L, high: H, negated: bool) -> Result<Statement>
    where
        L: ToSqlValue,
        H: ToSqlValue,
    {
        require_name("column", column)?;
        Ok(Statement::Between(BetweenStatement {
            column: String::from(column),
            table_alias: self.table_alias.clone(),
            low: low.to_sql_value(),
            high: high.to_sql_value(),
            negated,
        }))
    }
}

/// Where operations shared by every builder that has a where clause.
///
/// Each call appends statements joined to the previous ones with the pending
/// connective (AND unless [`or_where`](Self::or_where) set OR).
pub trait WhereClause {
    /// Returns the embedded where builder.
    fn where_builder(&self) -> &WhereBuilder;

    /// Returns the embedded where builder mutably.
    fn where_builder_mut(&mut self) -> &mut WhereBuilder;

    /// Resolves any accepted argument shape.
    fn where_args<'a>(&mut self, arg: impl Into<WhereArg<'a>>) -> Result<&mut Self> {
        let builder = self.where_builder_mut();
        let resolved = builder.resolve(arg.into());
        builder.push_resolved(resolved)?;
        Ok(self)
    }

    /// `column = value`, or `column IS NULL` for a null value.
    fn where_<V: Into<WhereValue>>(&mut self, column: &str, value: V) -> Result<&mut Self> {
        self.where_args(WhereArg::Pair(String::from(column), value.into()))
    }

    /// `column <operator> value`.
    fn where_op<V: Into<WhereValue>>(
        &mut self,
        column: &str,
        operator: &str,
        value: V,
    ) -> Result<&mut Self> {
        self.where_args(WhereArg::Triple(
            String::from(column),
            String::from(operator),
            value.into(),
        ))
    }

    /// A parenthesized group filled by `f`.
    fn where_nested<F>(&mut self, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut WhereBuilder) -> Result<()>,
    {
        self.where_args(WhereArg::nested(f))
    }

    /// `column = value` for each entry.
    fn where_map<I, K, V>(&mut self, entries: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToSqlValue,
    {
        self.where_args(WhereArg::map(entries))
    }

    /// A raw condition.
    fn where_raw(&mut self, raw: RawQuery) -> Result<&mut Self> {
        self.where_args(WhereArg::Raw(raw))
    }

    /// A literal `TRUE` or `FALSE` condition.
    fn where_bool(&mut self, value: bool) -> Result<&mut Self> {
        self.where_args(WhereArg::Bool(value))
    }

    /// Sets OR for the next statement, then resolves `arg`.
    fn or_where<'a>(&mut self, arg: impl Into<WhereArg<'a>>) -> Result<&mut Self> {
        self.where_builder_mut().set_connective(Connective::Or);
        self.where_args(arg)
    }

    /// Sets AND for the next statement, then resolves `arg`.
    fn and_where<'a>(&mut self, arg: impl Into<WhereArg<'a>>) -> Result<&mut Self> {
        self.where_builder_mut().set_connective(Connective::And);
        self.where_args(arg)
    }

    /// `column IS NULL`.
    fn where_null(&mut self, column: &str) -> Result<&mut Self> {
        let builder = self.where_builder_mut();
        let statement = builder.single(column, WhereCondition::IsNull);
        builder.push_resolved(statement.map(|s| vec![s]))?;
        Ok(self)
    }

    /// `column IS NOT NULL`.
    fn where_not_null(&mut self, column: &str) -> Result<&mut Self> {
        let builder = self.where_builder_mut();
        let statement = builder.single(column, WhereCondition::IsNotNull);
        builder.push_resolved(statement.map(|s| vec![s]))?;
        Ok(self)
    }

    /// `column IN (values)`.
    fn where_in<I, V>(&mut self, column: &str, values: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        let builder = self.where_builder_mut();
        let statement = builder.membership(column, values, false);
        builder.push_resolved(statement.map(|s| vec![s]))?;
        Ok(self)
    }

    /// `column NOT IN (values)`.
    fn where_not_in<I, V>(&mut self, column: &str, values: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        let builder = self.where_builder_mut();
        let statement = builder.membership(column, values, true);
        builder.push_resolved(statement.map(|s| vec![s]))?;
        Ok(self)
    }

    /// Any of `values` is an element of the comma-separated set in `column`.
    fn where_in_set<I, V>(&mut self, column: &str, values: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        let builder = self.where_builder_mut();
        let statement = builder.set_membership(column, values, false);
        builder.push_resolved(statement.map(|s| vec![s]))?;
        Ok(self)
    }

    /// None of `values` is an element of the comma-separated set in `column`.
    fn where_not_in_set<I, V>(&mut self, column: &str, values: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = V>,
        V: ToSqlValue,
    {
        let builder = self.where_builder_mut();
        let statement = builder.set_membership(column, values, true);
        builder.push_resolved(statement.map(|s| vec![s]))?;
        Ok(self)
    }

    /// `column BETWEEN low AND high`.
    fn where_between<L, H>(&mut self, column: &str, low: L, high: H) -> Result<&mut Self>
    where
        L: ToSqlValue,
        H: ToSqlValue,
    {
        let builder = self.where_builder_mut();
        let statement = builder.between(column, low, high, false);
        builder.push_resolved(statement.map(|s| vec![s]))?;
        Ok(self)
    }

    /// `column NOT BETWEEN low AND high`.
    fn where_not_between<L, H>(&mut self, column: &str, low: L, high: H) -> Result<&mut Self>
    where
        L: ToSqlValue,
        H: ToSqlValue,
    {
        let builder = self.where_builder_mut();
        let statement = builder.between(column, low, high, true);
        builder.push_resolved(statement.map(|s| vec![s]))?;
        Ok(self)
    }

    /// `EXISTS (query)`.
    fn where_exists(&mut self, query: SelectQueryBuilder) -> Result<&mut Self> {
        self.where_statement(Statement::Exists(ExistsStatement {
            query: Box::new(query),
            negated: false,
        }))
    }

    /// `NOT EXISTS (query)`.
    fn where_not_exists(&mut self, query: SelectQueryBuilder) -> Result<&mut Self> {
        self.where_statement(Statement::Exists(ExistsStatement {
            query: Box::new(query),
            negated: true,
        }))
    }

    /// Appends a pre-built statement.
    fn where_statement(&mut self, statement: Statement) -> Result<&mut Self> {
        self.where_builder_mut().push_resolved(Ok(vec![statement]))?;
        Ok(self)
    }

    /// Removes every where condition.
    fn clear_where(&mut self) -> &mut Self {
        self.where_builder_mut().clear();
        self
    }
}

impl WhereClause for WhereBuilder {
    fn where_builder(&self) -> &WhereBuilder {
        self
    }

    fn where_builder_mut(&mut self) -> &mut WhereBuilder {
        self
    }
}
