//! Generic compiler.
//!
//! Emits ANSI-style SQL with `?` placeholders that SQLite accepts as is.

use std::sync::Arc;

use tracing::trace;

use crate::ast::{build_conditions, BuildContext, ColumnType, Fragment};
use crate::builder::{
    ColumnDefinition, ColumnsClause, ConflictAction, DeleteQueryBuilder, ForeignKeyDefinition,
    IndexQueryBuilder, InsertQueryBuilder, JoinClause, LimitClause, OrderByClause,
    RecursiveSpec, SelectQueryBuilder, SqlValue, TableOperation, TableQueryBuilder,
    UpdateQueryBuilder, WhereBuilder, WhereClause,
};
use crate::dialect::{Dialect, GenericDialect};
use crate::error::{Result, SqlError};

use super::{CompiledQuery, Compiler};

const RECURSIVE_CTE: &str = "recursive_cte";
const RECURSIVE_STEP: &str = "recursive_step";

/// Compiler for every query kind, rendering through a [`Dialect`].
#[derive(Clone)]
pub struct GenericCompiler {
    dialect: Arc<dyn Dialect>,
}

impl std::fmt::Debug for GenericCompiler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GenericCompiler")
            .field("dialect", &self.dialect.name())
            .finish()
    }
}

impl Default for GenericCompiler {
    fn default() -> Self {
        Self::new()
    }
}

impl GenericCompiler {
    /// Creates a compiler using the generic dialect.
    #[must_use]
    pub fn new() -> Self {
        Self::with_dialect(GenericDialect::new())
    }

    /// Creates a compiler using `dialect`.
    #[must_use]
    pub fn with_dialect(dialect: impl Dialect + 'static) -> Self {
        Self {
            dialect: Arc::new(dialect),
        }
    }

    fn table_ref(&self, schema: Option<&str>, table: &str) -> String {
        match schema {
            Some(schema) => format!(
                "{}.{}",
                self.dialect.quote_identifier(schema),
                self.dialect.quote_identifier(table)
            ),
            None => self.dialect.quote_identifier(table),
        }
    }

    fn where_clause(
        &self,
        wheres: &WhereBuilder,
        ctx: &BuildContext<'_>,
        sql: &mut String,
        bindings: &mut Vec<SqlValue>,
    ) -> Result<()> {
        if wheres.is_empty() {
            return Ok(());
        }
        let fragment = build_conditions(wheres.conditions(), ctx)?;
        sql.push_str(" WHERE ");
        sql.push_str(&fragment.sql);
        bindings.extend(fragment.bindings);
        Ok(())
    }

    fn column_list(&self, query: &SelectQueryBuilder, ctx: &BuildContext<'_>) -> Result<Fragment> {
        let columns = query.columns_builder();
        let mut sql = String::new();
        let mut bindings = Vec::new();

        if columns.is_distinct() {
            sql.push_str("DISTINCT ");
        }

        if columns.statements().is_empty() {
            sql.push_str(&ctx.column(None, "*"));
            return Ok(Fragment { sql, bindings });
        }

        let mut parts = Vec::with_capacity(columns.statements().len());
        for statement in columns.statements() {
            let fragment = statement.build(ctx)?;
            parts.push(fragment.sql);
            bindings.extend(fragment.bindings);
        }
        sql.push_str(&parts.join(", "));
        Ok(Fragment { sql, bindings })
    }

    fn joins(
        &self,
        query: &SelectQueryBuilder,
        ctx: &BuildContext<'_>,
        sql: &mut String,
        bindings: &mut Vec<SqlValue>,
    ) -> Result<()> {
        for join in query.join_builder().statements() {
            let fragment = join.build(ctx)?;
            sql.push(' ');
            sql.push_str(&fragment.sql);
            bindings.extend(fragment.bindings);
        }
        Ok(())
    }

    /// GROUP BY, ORDER BY and LIMIT, which never carry bindings.
    fn tail(&self, query: &SelectQueryBuilder, ctx: &BuildContext<'_>, sql: &mut String) {
        if !query.group_by_columns().is_empty() {
            let columns: Vec<String> = query
                .group_by_columns()
                .iter()
                .map(|column| ctx.column(None, column))
                .collect();
            sql.push_str(" GROUP BY ");
            sql.push_str(&columns.join(", "));
        }

        if let Some(order) = query.order_builder().spec() {
            sql.push_str(" ORDER BY ");
            sql.push_str(&ctx.column(order.table_alias.as_deref(), &order.column));
            sql.push(' ');
            sql.push_str(order.direction.as_sql());
        }

        let limits = query.limit_builder();
        match (limits.limit(), limits.offset()) {
            (Some(limit), Some(offset)) => {
                sql.push_str(&format!(" LIMIT {limit} OFFSET {offset}"));
            }
            (Some(limit), None) => sql.push_str(&format!(" LIMIT {limit}")),
            // An offset needs a limit; -1 means unbounded.
            (None, Some(offset)) => sql.push_str(&format!(" LIMIT -1 OFFSET {offset}")),
            (None, None) => {}
        }
    }

    fn from_clause(&self, query: &SelectQueryBuilder) -> String {
        let mut sql = self.table_ref(query.schema(), query.table());
        if let Some(alias) = query.alias() {
            sql.push_str(" AS ");
            sql.push_str(&self.dialect.quote_identifier(alias));
        }
        sql
    }

    fn compile_plain_select(&self, query: &SelectQueryBuilder) -> Result<CompiledQuery> {
        let ctx = BuildContext::new(self).with_table_alias(query.alias());
        let columns = self.column_list(query, &ctx)?;

        let mut sql = format!("SELECT {} FROM {}", columns.sql, self.from_clause(query));
        let mut bindings = columns.bindings;
        self.joins(query, &ctx, &mut sql, &mut bindings)?;
        self.where_clause(query.where_builder(), &ctx, &mut sql, &mut bindings)?;
        self.tail(query, &ctx, &mut sql);

        Ok(CompiledQuery::new(sql, bindings))
    }

    /// The where clause selects the anchor rows; each step adds the rows the
    /// collected ones point at. Columns, joins, sort and limit apply to the
    /// collected set, which keeps the query's alias.
    fn compile_recursive_select(
        &self,
        query: &SelectQueryBuilder,
        spec: &RecursiveSpec,
    ) -> Result<CompiledQuery> {
        if !self.dialect.supports_recursive_cte() {
            return Err(SqlError::NotImplemented(format!(
                "the {} dialect has no recursive queries",
                self.dialect.name()
            )));
        }

        let ctx = BuildContext::new(self).with_table_alias(query.alias());
        let cte = self.dialect.quote_identifier(RECURSIVE_CTE);
        let step = self.dialect.quote_identifier(RECURSIVE_STEP);
        let table = self.table_ref(query.schema(), query.table());

        let mut sql = format!(
            "WITH RECURSIVE {cte} AS (SELECT {} FROM {}",
            ctx.column(None, "*"),
            self.from_clause(query)
        );
        let mut bindings = Vec::new();
        self.where_clause(query.where_builder(), &ctx, &mut sql, &mut bindings)?;
        sql.push_str(&format!(
            " UNION SELECT {step}.* FROM {table} AS {step} INNER JOIN {cte} ON {step}.{} = {cte}.{})",
            self.dialect.quote_identifier(&spec.primary_key),
            self.dialect.quote_identifier(&spec.foreign_key),
        ));

        let columns = self.column_list(query, &ctx)?;
        sql.push_str(&format!(" SELECT {} FROM {cte}", columns.sql));
        bindings.extend(columns.bindings);
        if let Some(alias) = query.alias() {
            sql.push_str(" AS ");
            sql.push_str(&self.dialect.quote_identifier(alias));
        }
        self.joins(query, &ctx, &mut sql, &mut bindings)?;
        self.tail(query, &ctx, &mut sql);

        Ok(CompiledQuery::new(sql, bindings))
    }

    fn column_definition(&self, column: &ColumnDefinition) -> String {
        let name = self.dialect.quote_identifier(column.name());
        let mut sql = format!("{name} {}", column.column_type().to_sql());

        if column.is_primary_key() {
            sql.push_str(" PRIMARY KEY");
            if column.is_auto_increment() {
                sql.push_str(" AUTOINCREMENT");
            }
        }
        if !column.is_nullable() {
            sql.push_str(" NOT NULL");
        }
        if column.is_unique() {
            sql.push_str(" UNIQUE");
        }
        if let Some(default) = column.default_value() {
            sql.push_str(" DEFAULT ");
            sql.push_str(&default.to_sql());
        }
        if let Some(collation) = column.collation_name() {
            sql.push_str(" COLLATE ");
            sql.push_str(collation);
        }
        if let ColumnType::Enum(values) = column.column_type() {
            let values: Vec<String> = values
                .iter()
                .map(|v| SqlValue::Text(v.clone()).to_sql_inline())
                .collect();
            sql.push_str(&format!(" CHECK ({name} IN ({}))", values.join(", ")));
        }
        sql
    }

    fn foreign_key_definition(&self, key: &ForeignKeyDefinition) -> Result<String> {
        let Some((table, column)) = key.referenced() else {
            return Err(SqlError::invalid_operation(format!(
                "foreign key on {} references nothing",
                key.column()
            )));
        };
        let mut sql = format!(
            "FOREIGN KEY ({}) REFERENCES {}({})",
            self.dialect.quote_identifier(key.column()),
            self.dialect.quote_identifier(table),
            self.dialect.quote_identifier(column)
        );
        if let Some(action) = key.delete_action() {
            sql.push_str(" ON DELETE ");
            sql.push_str(action.as_sql());
        }
        if let Some(action) = key.update_action() {
            sql.push_str(" ON UPDATE ");
            sql.push_str(action.as_sql());
        }
        Ok(sql)
    }
}

impl Compiler for GenericCompiler {
    fn dialect(&self) -> &dyn Dialect {
        self.dialect.as_ref()
    }

    fn compile_select(&self, query: &SelectQueryBuilder) -> Result<CompiledQuery> {
        let compiled = match query.recursive_spec() {
            Some(spec) => self.compile_recursive_select(query, spec)?,
            None => self.compile_plain_select(query)?,
        };
        trace!(expression = %compiled.expression, "compiled select");
        Ok(compiled)
    }

    fn compile_insert(&self, query: &InsertQueryBuilder) -> Result<CompiledQuery> {
        if query.is_empty() {
            return Err(SqlError::invalid_operation(format!(
                "insert into {} has no record",
                query.table()
            )));
        }

        let columns = query.column_names();
        let rows = query.rows();
        let mut sql = String::from(if query.is_or_ignore() {
            "INSERT OR IGNORE INTO "
        } else {
            "INSERT INTO "
        });
        sql.push_str(&self.table_ref(query.schema(), query.table()));

        let mut bindings = Vec::new();
        if columns.is_empty() {
            if rows.len() > 1 {
                return Err(SqlError::invalid_operation(
                    "several records without columns cannot be inserted at once",
                ));
            }
            sql.push_str(" DEFAULT VALUES");
        } else {
            let quoted: Vec<String> = columns
                .iter()
                .map(|c| self.dialect.quote_identifier(c))
                .collect();
            let placeholders = vec![self.dialect.parameter_placeholder(); columns.len()].join(", ");
            let tuples = vec![format!("({placeholders})"); rows.len()].join(", ");
            sql.push_str(&format!(" ({}) VALUES {tuples}", quoted.join(", ")));
            bindings.extend(rows.into_iter().flatten());
        }

        if let Some(conflict) = query.conflict() {
            let target: Vec<String> = conflict
                .columns
                .iter()
                .map(|c| self.dialect.quote_identifier(c))
                .collect();
            sql.push_str(&format!(" ON CONFLICT ({})", target.join(", ")));
            match &conflict.action {
                ConflictAction::Nothing => sql.push_str(" DO NOTHING"),
                ConflictAction::Update(columns) if columns.is_empty() => {
                    sql.push_str(" DO NOTHING");
                }
                ConflictAction::Update(columns) => {
                    let updates: Vec<String> = columns
                        .iter()
                        .map(|c| {
                            let c = self.dialect.quote_identifier(c);
                            format!("{c} = excluded.{c}")
                        })
                        .collect();
                    sql.push_str(" DO UPDATE SET ");
                    sql.push_str(&updates.join(", "));
                }
            }
        }

        trace!(expression = %sql, "compiled insert");
        Ok(CompiledQuery::new(sql, bindings))
    }

    fn compile_update(&self, query: &UpdateQueryBuilder) -> Result<CompiledQuery> {
        if query.assignments().is_empty() {
            return Err(SqlError::invalid_operation(format!(
                "update of {} has no assignment",
                query.table()
            )));
        }

        let ctx = BuildContext::new(self);
        let placeholder = self.dialect.parameter_placeholder();
        let assignments: Vec<String> = query
            .assignments()
            .iter()
            .map(|(column, _)| format!("{} = {placeholder}", self.dialect.quote_identifier(column)))
            .collect();
        let mut bindings: Vec<SqlValue> =
            query.assignments().iter().map(|(_, v)| v.clone()).collect();

        let mut sql = format!(
            "UPDATE {} SET {}",
            self.table_ref(query.schema(), query.table()),
            assignments.join(", ")
        );
        self.where_clause(query.where_builder(), &ctx, &mut sql, &mut bindings)?;

        trace!(expression = %sql, "compiled update");
        Ok(CompiledQuery::new(sql, bindings))
    }

    fn compile_delete(&self, query: &DeleteQueryBuilder) -> Result<CompiledQuery> {
        let ctx = BuildContext::new(self);
        let mut sql = format!(
            "DELETE FROM {}",
            self.table_ref(query.schema(), query.table())
        );
        let mut bindings = Vec::new();
        self.where_clause(query.where_builder(), &ctx, &mut sql, &mut bindings)?;

        trace!(expression = %sql, "compiled delete");
        Ok(CompiledQuery::new(sql, bindings))
    }

    fn compile_table(&self, query: &TableQueryBuilder) -> Result<CompiledQuery> {
        let table = self.table_ref(query.schema(), query.table());

        let sql = match query.operation() {
            TableOperation::Drop => {
                let if_exists = if query.is_if_exists() { "IF EXISTS " } else { "" };
                format!("DROP TABLE {if_exists}{table}")
            }
            TableOperation::Create => {
                if query.columns().is_empty() {
                    return Err(SqlError::invalid_operation(format!(
                        "table {} has no column",
                        query.table()
                    )));
                }
                let mut definitions: Vec<String> = query
                    .columns()
                    .iter()
                    .map(|column| self.column_definition(column))
                    .collect();
                for key in query.foreign_keys() {
                    definitions.push(self.foreign_key_definition(key)?);
                }
                let temporary = if query.is_temporary() { "TEMPORARY " } else { "" };
                let if_not_exists = if query.is_if_not_exists() {
                    "IF NOT EXISTS "
                } else {
                    ""
                };
                format!(
                    "CREATE {temporary}TABLE {if_not_exists}{table} ({})",
                    definitions.join(", ")
                )
            }
        };

        trace!(expression = %sql, "compiled table");
        Ok(CompiledQuery::new(sql, Vec::new()))
    }

    fn compile_index(&self, query: &IndexQueryBuilder) -> Result<CompiledQuery> {
        let (name, table, columns) = query.parts()?;
        let columns: Vec<String> = columns
            .iter()
            .map(|c| self.dialect.quote_identifier(c))
            .collect();
        let sql = format!(
            "CREATE {}INDEX {}{} ON {} ({})",
            if query.is_unique() { "UNIQUE " } else { "" },
            if query.is_if_not_exists() {
                "IF NOT EXISTS "
            } else {
                ""
            },
            self.dialect.quote_identifier(name),
            self.dialect.quote_identifier(table),
            columns.join(", ")
        );

        trace!(expression = %sql, "compiled index");
        Ok(CompiledQuery::new(sql, Vec::new()))
    }
}
