//! CREATE TABLE / DROP TABLE builder.

use crate::ast::ColumnType;
use crate::compiler::{CompiledQuery, Compiler, QueryBuilder, QueryContext};
use crate::error::{require_name, Result, SqlError};

use super::column_def::{ColumnDefinition, ForeignKeyDefinition};

/// Which DDL statement the builder produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableOperation {
    /// CREATE TABLE
    Create,
    /// DROP TABLE
    Drop,
}

/// A table DDL statement.
///
/// Column methods append a definition and return it for chaining:
///
/// ```rust
/// use strata_sql::TableQueryBuilder;
///
/// let mut table = TableQueryBuilder::create("users").unwrap();
/// table.int("id").unwrap().primary_key().auto_increment();
/// table.string("email", 255).unwrap().not_null().unique();
/// ```
#[derive(Debug, Clone)]
pub struct TableQueryBuilder {
    table: String,
    schema: Option<String>,
    operation: TableOperation,
    columns: Vec<ColumnDefinition>,
    foreign_keys: Vec<ForeignKeyDefinition>,
    if_not_exists: bool,
    if_exists: bool,
    temporary: bool,
}

impl TableQueryBuilder {
    fn with_operation(table: impl Into<String>, operation: TableOperation) -> Result<Self> {
        let table = table.into();
        require_name("table", &table)?;
        Ok(Self {
            table,
            schema: None,
            operation,
            columns: Vec::new(),
            foreign_keys: Vec::new(),
            if_not_exists: false,
            if_exists: false,
            temporary: false,
        })
    }

    /// Starts a CREATE TABLE.
    pub fn create(table: impl Into<String>) -> Result<Self> {
        Self::with_operation(table, TableOperation::Create)
    }

    /// Starts a DROP TABLE.
    pub fn drop(table: impl Into<String>) -> Result<Self> {
        Self::with_operation(table, TableOperation::Drop)
    }

    /// Returns the table name.
    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Returns the schema (database) name.
    #[must_use]
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Qualifies the table with a schema.
    pub fn set_schema(&mut self, schema: impl Into<String>) -> Result<&mut Self> {
        let schema = schema.into();
        require_name("schema", &schema)?;
        self.schema = Some(schema);
        Ok(self)
    }

    /// Returns the statement kind.
    #[must_use]
    pub fn operation(&self) -> TableOperation {
        self.operation
    }

    /// Returns the column definitions.
    #[must_use]
    pub fn columns(&self) -> &[ColumnDefinition] {
        &self.columns
    }

    /// Returns the table-level foreign keys.
    #[must_use]
    pub fn foreign_keys(&self) -> &[ForeignKeyDefinition] {
        &self.foreign_keys
    }

    /// Adds `IF NOT EXISTS` to a create.
    pub fn if_not_exists(&mut self) -> &mut Self {
        self.if_not_exists = true;
        self
    }

    /// Adds `IF EXISTS` to a drop.
    pub fn if_exists(&mut self) -> &mut Self {
        self.if_exists = true;
        self
    }

    /// Creates a temporary table.
    pub fn temporary(&mut self) -> &mut Self {
        self.temporary = true;
        self
    }

    /// Returns whether `IF NOT EXISTS` is set.
    #[must_use]
    pub fn is_if_not_exists(&self) -> bool {
        self.if_not_exists
    }

    /// Returns whether `IF EXISTS` is set.
    #[must_use]
    pub fn is_if_exists(&self) -> bool {
        self.if_exists
    }

    /// Returns whether the table is temporary.
    #[must_use]
    pub fn is_temporary(&self) -> bool {
        self.temporary
    }

    fn require_create(&self, what: &str) -> Result<()> {
        if self.operation != TableOperation::Create {
            return Err(SqlError::invalid_operation(format!(
                "cannot add a {what} to a drop table statement"
            )));
        }
        Ok(())
    }

    /// Appends a column of any type.
    pub fn column(&mut self, name: &str, column_type: ColumnType) -> Result<&mut ColumnDefinition> {
        require_name("column", name)?;
        self.require_create("column")?;
        if self.columns.iter().any(|c| c.name() == name) {
            return Err(SqlError::invalid_argument(format!(
                "column {name} is defined twice"
            )));
        }
        let index = self.columns.len();
        self.columns.push(ColumnDefinition::new(name, column_type));
        Ok(&mut self.columns[index])
    }

    /// Adds a table-level foreign key on `column`.
    pub fn foreign_key(&mut self, column: &str) -> Result<&mut ForeignKeyDefinition> {
        require_name("foreign key column", column)?;
        self.require_create("foreign key")?;
        let index = self.foreign_keys.len();
        self.foreign_keys
            .push(ForeignKeyDefinition::new(String::from(column)));
        Ok(&mut self.foreign_keys[index])
    }

    /// `TINYINT`
    pub fn tiny_int(&mut self, name: &str) -> Result<&mut ColumnDefinition> {
        self.column(name, ColumnType::TinyInt)
    }

    /// `SMALLINT`
    pub fn small_int(&mut self, name: &str) -> Result<&mut ColumnDefinition> {
        self.column(name, ColumnType::SmallInt)
    }

    /// `MEDIUMINT`
    pub fn medium_int(&mut self, name: &str) -> Result<&mut ColumnDefinition> {
        self.column(name, ColumnType::MediumInt)
    }

    /// `INTEGER`
    pub fn int(&mut self, name: &str) -> Result<&mut ColumnDefinition> {
        self.column(name, ColumnType::Int)
    }

    /// `BIGINT`
    pub fn big_int(&mut self, name: &str) -> Result<&mut ColumnDefinition> {
        self.column(name, ColumnType::BigInt)
    }

    /// `VARCHAR(length)`
    pub fn string(&mut self, name: &str, length: u32) -> Result<&mut ColumnDefinition> {
        if length == 0 {
            return Err(SqlError::invalid_argument(format!(
                "string column {name} needs a positive length"
            )));
        }
        self.column(name, ColumnType::String(length))
    }

    /// `TEXT`
    pub fn text(&mut self, name: &str) -> Result<&mut ColumnDefinition> {
        self.column(name, ColumnType::Text)
    }

    /// `TINYTEXT`
    pub fn tiny_text(&mut self, name: &str) -> Result<&mut ColumnDefinition> {
        self.column(name, ColumnType::TinyText)
    }

    /// `MEDIUMTEXT`
    pub fn medium_text(&mut self, name: &str) -> Result<&mut ColumnDefinition> {
        self.column(name, ColumnType::MediumText)
    }

    /// `LONGTEXT`
    pub fn long_text(&mut self, name: &str) -> Result<&mut ColumnDefinition> {
        self.column(name, ColumnType::LongText)
    }

    /// `FLOAT`
    pub fn float(&mut self, name: &str) -> Result<&mut ColumnDefinition> {
        self.column(name, ColumnType::Float)
    }

    /// `DOUBLE`
    pub fn double(&mut self, name: &str) -> Result<&mut ColumnDefinition> {
        self.column(name, ColumnType::Double)
    }

    /// `DECIMAL(precision, scale)`
    pub fn decimal(
        &mut self,
        name: &str,
        precision: u16,
        scale: u16,
    ) -> Result<&mut ColumnDefinition> {
        if precision == 0 || scale > precision {
            return Err(SqlError::invalid_argument(format!(
                "decimal column {name} has invalid precision {precision} and scale {scale}"
            )));
        }
        self.column(name, ColumnType::Decimal { precision, scale })
    }

    /// `BOOLEAN`
    pub fn boolean(&mut self, name: &str) -> Result<&mut ColumnDefinition> {
        self.column(name, ColumnType::Boolean)
    }

    /// `DATE`
    pub fn date(&mut self, name: &str) -> Result<&mut ColumnDefinition> {
        self.column(name, ColumnType::Date)
    }

    /// `TIME`
    pub fn time(&mut self, name: &str) -> Result<&mut ColumnDefinition> {
        self.column(name, ColumnType::Time)
    }

    /// `DATETIME`
    pub fn date_time(&mut self, name: &str) -> Result<&mut ColumnDefinition> {
        self.column(name, ColumnType::DateTime)
    }

    /// `TIMESTAMP`
    pub fn timestamp(&mut self, name: &str) -> Result<&mut ColumnDefinition> {
        self.column(name, ColumnType::Timestamp)
    }

    /// A column restricted to `values`.
    pub fn enumeration<I, S>(&mut self, name: &str, values: I) -> Result<&mut ColumnDefinition>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(SqlError::invalid_argument(format!(
                "enum column {name} has no values"
            )));
        }
        self.column(name, ColumnType::Enum(values))
    }

    /// `JSON`
    pub fn json(&mut self, name: &str) -> Result<&mut ColumnDefinition> {
        self.column(name, ColumnType::Json)
    }
}

impl QueryBuilder for TableQueryBuilder {
    fn context(&self) -> QueryContext {
        QueryContext::Schema
    }

    fn compile(&self, compiler: &dyn Compiler) -> Result<CompiledQuery> {
        compiler.compile_table(self)
    }
}
