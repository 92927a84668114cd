//! Statement nodes.
//!
//! Each node renders one clause fragment plus its ordered bindings. Nodes are
//! built from already-validated input; validation belongs to the builders.

use crate::builder::raw::RawQuery;
use crate::builder::value::SqlValue;
use crate::builder::SelectQueryBuilder;
use crate::compiler::Compiler;
use crate::error::{Result, SqlError};

use super::types::SqlOperator;

/// A rendered SQL fragment and its bindings, in placeholder order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Fragment {
    /// SQL text.
    pub sql: String,
    /// Ordered bindings.
    pub bindings: Vec<SqlValue>,
}

impl Fragment {
    /// Creates a fragment.
    #[must_use]
    pub fn new(sql: impl Into<String>, bindings: Vec<SqlValue>) -> Self {
        Self {
            sql: sql.into(),
            bindings,
        }
    }

    /// Creates a fragment without bindings.
    #[must_use]
    pub fn text(sql: impl Into<String>) -> Self {
        Self::new(sql, Vec::new())
    }
}

/// Rendering context shared by all nodes of one query.
#[derive(Clone, Copy)]
pub struct BuildContext<'a> {
    compiler: &'a dyn Compiler,
    table_alias: Option<&'a str>,
}

impl<'a> BuildContext<'a> {
    /// Creates a context rendering through `compiler`.
    #[must_use]
    pub fn new(compiler: &'a dyn Compiler) -> Self {
        Self {
            compiler,
            table_alias: None,
        }
    }

    /// Sets the alias used to qualify columns that did not capture one.
    #[must_use]
    pub fn with_table_alias(mut self, alias: Option<&'a str>) -> Self {
        self.table_alias = alias;
        self
    }

    /// Returns the compiler, for nodes embedding subqueries.
    #[must_use]
    pub fn compiler(&self) -> &'a dyn Compiler {
        self.compiler
    }

    /// Returns the owning query's alias.
    #[must_use]
    pub fn table_alias(&self) -> Option<&'a str> {
        self.table_alias
    }

    /// Quotes one identifier.
    #[must_use]
    pub fn quote(&self, identifier: &str) -> String {
        self.compiler.dialect().quote_identifier(identifier)
    }

    /// Returns the placeholder for one binding.
    #[must_use]
    pub fn placeholder(&self) -> &'static str {
        self.compiler.dialect().parameter_placeholder()
    }

    /// Renders a column reference, qualified with `explicit` or else the
    /// context alias.
    #[must_use]
    pub fn column(&self, explicit: Option<&str>, column: &str) -> String {
        self.column_exact(explicit.or(self.table_alias), column)
    }

    /// Renders a column reference qualified with `qualifier` only.
    ///
    /// Names that already contain a `.` are taken as qualified; every part is
    /// quoted separately.
    #[must_use]
    pub fn column_exact(&self, qualifier: Option<&str>, column: &str) -> String {
        if column.contains('.') {
            return column
                .split('.')
                .map(|part| {
                    if part == "*" {
                        String::from("*")
                    } else {
                        self.quote(part)
                    }
                })
                .collect::<Vec<_>>()
                .join(".");
        }

        let name = if column == "*" {
            String::from("*")
        } else {
            self.quote(column)
        };

        match qualifier {
            Some(alias) => format!("{}.{name}", self.quote(alias)),
            None => name,
        }
    }
}

/// Boolean connective between two where conditions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Connective {
    /// AND
    #[default]
    And,
    /// OR
    Or,
}

impl Connective {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::And => "AND",
            Self::Or => "OR",
        }
    }
}

/// One where entry: the connective joining it to the previous entry, and the
/// statement itself. The connective of the first entry is not rendered.
#[derive(Debug, Clone)]
pub struct Condition {
    /// Connective to the previous condition.
    pub connective: Connective,
    /// The condition statement.
    pub statement: Statement,
}

/// Renders a list of conditions joined by their connectives.
pub fn build_conditions(conditions: &[Condition], ctx: &BuildContext<'_>) -> Result<Fragment> {
    let mut sql = String::new();
    let mut bindings = Vec::new();

    for (index, condition) in conditions.iter().enumerate() {
        let fragment = condition.statement.build(ctx)?;
        if index > 0 {
            sql.push(' ');
            sql.push_str(condition.connective.as_sql());
            sql.push(' ');
        }
        sql.push_str(&fragment.sql);
        bindings.extend(fragment.bindings);
    }

    Ok(Fragment { sql, bindings })
}

/// A selected column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnStatement {
    column: String,
    alias: Option<String>,
    table_alias: Option<String>,
}

impl ColumnStatement {
    /// Creates a column statement.
    #[must_use]
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            alias: None,
            table_alias: None,
        }
    }

    /// Sets the output alias (`AS`).
    #[must_use]
    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    /// Sets the table alias qualifying the column.
    #[must_use]
    pub fn with_table_alias(mut self, table_alias: Option<String>) -> Self {
        self.table_alias = table_alias;
        self
    }

    /// Returns the column name.
    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Returns the output alias.
    #[must_use]
    pub fn alias(&self) -> Option<&str> {
        self.alias.as_deref()
    }

    /// Returns the qualifying table alias.
    #[must_use]
    pub fn table_alias(&self) -> Option<&str> {
        self.table_alias.as_deref()
    }

    /// Returns whether this selects every column.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        self.column == "*"
    }

    fn build(&self, ctx: &BuildContext<'_>) -> Fragment {
        let mut sql = ctx.column(self.table_alias(), &self.column);
        if let Some(alias) = &self.alias {
            sql.push_str(" AS ");
            sql.push_str(&ctx.quote(alias));
        }
        Fragment::text(sql)
    }
}

/// Aggregate functions usable as columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnMethod {
    /// COUNT
    Count,
    /// MIN
    Min,
    /// MAX
    Max,
    /// SUM
    Sum,
    /// AVG
    Avg,
}

impl ColumnMethod {
    /// Returns the SQL function name.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Count => "COUNT",
            Self::Min => "MIN",
            Self::Max => "MAX",
            Self::Sum => "SUM",
            Self::Avg => "AVG",
        }
    }
}

/// An aggregate over one column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnMethodStatement {
    /// Aggregate function.
    pub method: ColumnMethod,
    /// Column argument (`*` allowed).
    pub column: String,
    /// Output alias.
    pub alias: Option<String>,
    /// Qualifying table alias.
    pub table_alias: Option<String>,
}

impl ColumnMethodStatement {
    fn build(&self, ctx: &BuildContext<'_>) -> Fragment {
        let argument = if self.column == "*" {
            String::from("*")
        } else {
            ctx.column(self.table_alias.as_deref(), &self.column)
        };
        let mut sql = format!("{}({argument})", self.method.as_sql());
        if let Some(alias) = &self.alias {
            sql.push_str(" AS ");
            sql.push_str(&ctx.quote(alias));
        }
        Fragment::text(sql)
    }
}

/// Right-hand side of a comparison.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereValue {
    /// A bound value.
    Value(SqlValue),
    /// A raw fragment emitted verbatim.
    Raw(RawQuery),
}

impl WhereValue {
    /// Returns whether this is a NULL value.
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Value(v) if v.is_null())
    }
}

impl<T: crate::builder::value::ToSqlValue> From<T> for WhereValue {
    fn from(value: T) -> Self {
        Self::Value(value.to_sql_value())
    }
}

impl From<RawQuery> for WhereValue {
    fn from(raw: RawQuery) -> Self {
        Self::Raw(raw)
    }
}

/// Predicate carried by a [`WhereStatement`].
#[derive(Debug, Clone, PartialEq)]
pub enum WhereCondition {
    /// `column <op> value`
    Compare {
        /// Comparison operator.
        operator: SqlOperator,
        /// Right-hand side.
        value: WhereValue,
    },
    /// `column IS NULL`
    IsNull,
    /// `column IS NOT NULL`
    IsNotNull,
}

/// A single-column predicate.
#[derive(Debug, Clone, PartialEq)]
pub struct WhereStatement {
    /// Column name.
    pub column: String,
    /// Qualifying table alias captured when the statement was created.
    pub table_alias: Option<String>,
    /// The predicate.
    pub condition: WhereCondition,
}

impl WhereStatement {
    fn build(&self, ctx: &BuildContext<'_>) -> Fragment {
        let column = ctx.column(self.table_alias.as_deref(), &self.column);
        match &self.condition {
            WhereCondition::IsNull => Fragment::text(format!("{column} IS NULL")),
            WhereCondition::IsNotNull => Fragment::text(format!("{column} IS NOT NULL")),
            WhereCondition::Compare {
                operator,
                value: WhereValue::Value(value),
            } => Fragment::new(
                format!("{column} {} {}", operator.as_sql(), ctx.placeholder()),
                vec![value.clone()],
            ),
            WhereCondition::Compare {
                operator,
                value: WhereValue::Raw(raw),
            } => Fragment::new(
                format!("{column} {} {}", operator.as_sql(), raw.text()),
                raw.bindings().to_vec(),
            ),
        }
    }
}

/// A parenthesized group of conditions from a nested where builder.
#[derive(Debug, Clone)]
pub struct WhereGroupStatement {
    /// Grouped conditions.
    pub conditions: Vec<Condition>,
}

impl WhereGroupStatement {
    fn build(&self, ctx: &BuildContext<'_>) -> Result<Fragment> {
        let inner = build_conditions(&self.conditions, ctx)?;
        Ok(Fragment::new(format!("({})", inner.sql), inner.bindings))
    }
}

/// `column [NOT] IN (...)`
#[derive(Debug, Clone, PartialEq)]
pub struct InStatement {
    /// Column name.
    pub column: String,
    /// Qualifying table alias.
    pub table_alias: Option<String>,
    /// Candidate values.
    pub values: Vec<SqlValue>,
    /// Whether this is `NOT IN`.
    pub negated: bool,
}

impl InStatement {
    fn build(&self, ctx: &BuildContext<'_>) -> Fragment {
        if self.values.is_empty() {
            // Nothing can be IN an empty set.
            return Fragment::text(if self.negated { "1 = 1" } else { "1 = 0" });
        }
        let column = ctx.column(self.table_alias.as_deref(), &self.column);
        let keyword = if self.negated { "NOT IN" } else { "IN" };
        let placeholders = vec![ctx.placeholder(); self.values.len()].join(", ");
        Fragment::new(
            format!("{column} {keyword} ({placeholders})"),
            self.values.clone(),
        )
    }
}

/// Membership of values in a comma-separated set column.
#[derive(Debug, Clone, PartialEq)]
pub struct InSetStatement {
    /// Column name.
    pub column: String,
    /// Qualifying table alias.
    pub table_alias: Option<String>,
    /// Values looked up in the set.
    pub values: Vec<SqlValue>,
    /// Whether the whole test is negated.
    pub negated: bool,
}

impl InSetStatement {
    fn build(&self, ctx: &BuildContext<'_>) -> Fragment {
        if self.values.is_empty() {
            return Fragment::text(if self.negated { "1 = 1" } else { "1 = 0" });
        }
        let column = ctx.column(self.table_alias.as_deref(), &self.column);
        let tests: Vec<String> = self
            .values
            .iter()
            .map(|_| format!("(',' || {column} || ',') LIKE {}", ctx.placeholder()))
            .collect();
        let bindings = self
            .values
            .iter()
            .map(|value| {
                let needle = match value {
                    SqlValue::Text(s) => s.clone(),
                    other => other.to_sql_inline(),
                };
                SqlValue::Text(format!("%,{needle},%"))
            })
            .collect();
        let body = format!("({})", tests.join(" OR "));
        let sql = if self.negated {
            format!("NOT {body}")
        } else {
            body
        };
        Fragment::new(sql, bindings)
    }
}

/// `column [NOT] BETWEEN low AND high`
#[derive(Debug, Clone, PartialEq)]
pub struct BetweenStatement {
    /// Column name.
    pub column: String,
    /// Qualifying table alias.
    pub table_alias: Option<String>,
    /// Lower bound.
    pub low: SqlValue,
    /// Upper bound.
    pub high: SqlValue,
    /// Whether this is `NOT BETWEEN`.
    pub negated: bool,
}

impl BetweenStatement {
    fn build(&self, ctx: &BuildContext<'_>) -> Fragment {
        let column = ctx.column(self.table_alias.as_deref(), &self.column);
        let keyword = if self.negated { "NOT BETWEEN" } else { "BETWEEN" };
        let placeholder = ctx.placeholder();
        Fragment::new(
            format!("{column} {keyword} {placeholder} AND {placeholder}"),
            vec![self.low.clone(), self.high.clone()],
        )
    }
}

/// `[NOT] EXISTS (subquery)`
#[derive(Debug, Clone)]
pub struct ExistsStatement {
    /// The subquery.
    pub query: Box<SelectQueryBuilder>,
    /// Whether this is `NOT EXISTS`.
    pub negated: bool,
}

impl ExistsStatement {
    fn build(&self, ctx: &BuildContext<'_>) -> Result<Fragment> {
        let compiled = ctx.compiler().compile_select(&self.query)?;
        let keyword = if self.negated { "NOT EXISTS" } else { "EXISTS" };
        Ok(Fragment::new(
            format!("{keyword} ({})", compiled.expression),
            compiled.bindings,
        ))
    }
}

/// Join kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinMethod {
    /// INNER JOIN
    Inner,
    /// LEFT JOIN
    Left,
    /// LEFT OUTER JOIN
    LeftOuter,
    /// RIGHT JOIN
    Right,
    /// RIGHT OUTER JOIN
    RightOuter,
    /// FULL OUTER JOIN
    FullOuter,
    /// CROSS JOIN
    Cross,
}

impl JoinMethod {
    /// Returns the SQL keywords.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Inner => "INNER JOIN",
            Self::Left => "LEFT JOIN",
            Self::LeftOuter => "LEFT OUTER JOIN",
            Self::Right => "RIGHT JOIN",
            Self::RightOuter => "RIGHT OUTER JOIN",
            Self::FullOuter => "FULL OUTER JOIN",
            Self::Cross => "CROSS JOIN",
        }
    }
}

/// What a join brings in.
#[derive(Debug, Clone)]
pub enum JoinTarget {
    /// A table, optionally schema-qualified.
    Table {
        /// Table name.
        name: String,
        /// Schema or database name.
        schema: Option<String>,
    },
    /// A raw fragment.
    Raw(RawQuery),
    /// A select subquery.
    Query(Box<SelectQueryBuilder>),
}

/// A join clause.
#[derive(Debug, Clone)]
pub struct JoinStatement {
    /// Join kind.
    pub method: JoinMethod,
    /// Joined source.
    pub target: JoinTarget,
    /// Alias of the joined source.
    pub alias: Option<String>,
    /// Alias qualifying the foreign key; falls back to the query alias.
    pub source_alias: Option<String>,
    /// Key on the owning side.
    pub foreign_key: Option<String>,
    /// Key on the joined side.
    pub primary_key: Option<String>,
}

impl JoinStatement {
    pub(crate) fn build(&self, ctx: &BuildContext<'_>) -> Result<Fragment> {
        let mut bindings = Vec::new();
        let mut sql = String::from(self.method.as_sql());
        sql.push(' ');

        let target_qualifier = match &self.target {
            JoinTarget::Table { name, schema } => {
                if let Some(schema) = schema {
                    sql.push_str(&ctx.quote(schema));
                    sql.push('.');
                }
                sql.push_str(&ctx.quote(name));
                Some(self.alias.as_deref().unwrap_or(name))
            }
            JoinTarget::Raw(raw) => {
                sql.push_str(raw.text());
                bindings.extend(raw.bindings().iter().cloned());
                self.alias.as_deref()
            }
            JoinTarget::Query(query) => {
                let compiled = ctx.compiler().compile_select(query)?;
                sql.push('(');
                sql.push_str(&compiled.expression);
                sql.push(')');
                bindings.extend(compiled.bindings);
                self.alias.as_deref()
            }
        };

        if let Some(alias) = &self.alias {
            sql.push_str(" AS ");
            sql.push_str(&ctx.quote(alias));
        }

        if self.method != JoinMethod::Cross {
            if let (Some(foreign_key), Some(primary_key)) = (&self.foreign_key, &self.primary_key)
            {
                sql.push_str(" ON ");
                sql.push_str(&ctx.column_exact(target_qualifier, primary_key));
                sql.push_str(" = ");
                sql.push_str(&ctx.column(self.source_alias.as_deref(), foreign_key));
            }
        }

        Ok(Fragment { sql, bindings })
    }
}

/// A query clause node.
#[derive(Debug, Clone)]
pub enum Statement {
    /// Selected column.
    Column(ColumnStatement),
    /// Aggregate column.
    ColumnMethod(ColumnMethodStatement),
    /// Raw column expression.
    ColumnRaw(RawQuery),
    /// Single-column predicate.
    Where(WhereStatement),
    /// Parenthesized predicate group.
    WhereGroup(WhereGroupStatement),
    /// IN list.
    In(InStatement),
    /// Set membership.
    InSet(InSetStatement),
    /// BETWEEN range.
    Between(BetweenStatement),
    /// EXISTS subquery.
    Exists(ExistsStatement),
    /// Join clause.
    Join(JoinStatement),
    /// Raw predicate.
    Raw(RawQuery),
}

impl Statement {
    /// Renders the node.
    pub fn build(&self, ctx: &BuildContext<'_>) -> Result<Fragment> {
        match self {
            Self::Column(column) => Ok(column.build(ctx)),
            Self::ColumnMethod(method) => Ok(method.build(ctx)),
            Self::ColumnRaw(raw) | Self::Raw(raw) => {
                Ok(Fragment::new(raw.text(), raw.bindings().to_vec()))
            }
            Self::Where(statement) => Ok(statement.build(ctx)),
            Self::WhereGroup(group) => group.build(ctx),
            Self::In(statement) => Ok(statement.build(ctx)),
            Self::InSet(statement) => Ok(statement.build(ctx)),
            Self::Between(statement) => Ok(statement.build(ctx)),
            Self::Exists(statement) => statement.build(ctx),
            Self::Join(statement) => statement.build(ctx),
        }
    }

    /// Returns whether this is a `*` column.
    #[must_use]
    pub fn is_wildcard(&self) -> bool {
        matches!(self, Self::Column(column) if column.is_wildcard())
    }

    /// Returns the column statement, if this is one.
    #[must_use]
    pub fn as_column(&self) -> Option<&ColumnStatement> {
        match self {
            Self::Column(column) => Some(column),
            _ => None,
        }
    }

    /// Returns the join statement, if this is one.
    pub fn into_join(self) -> Result<JoinStatement> {
        match self {
            Self::Join(join) => Ok(join),
            other => Err(SqlError::invalid_operation(format!(
                "expected a join statement, got {other:?}"
            ))),
        }
    }
}
