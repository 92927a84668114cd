//! INSERT query builder.

use crate::compiler::{CompiledQuery, Compiler, QueryBuilder, QueryContext};
use crate::error::{require_name, Result, SqlError};

use super::value::{SqlValue, ToSqlValue};

/// What an upsert does with a conflicting row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictAction {
    /// `DO NOTHING`
    Nothing,
    /// `DO UPDATE SET col = excluded.col` for each column.
    Update(Vec<String>),
}

/// `ON CONFLICT (columns) <action>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OnConflict {
    /// Conflict target columns.
    pub columns: Vec<String>,
    /// Action taken on conflict.
    pub action: ConflictAction,
}

/// An INSERT of one or more records.
///
/// Records may carry different keys; the column list is the union of all keys
/// in first-seen order and missing values are NULL.
#[derive(Debug, Clone)]
pub struct InsertQueryBuilder {
    table: String,
    schema: Option<String>,
    records: Vec<Vec<(String, SqlValue)>>,
    or_ignore: bool,
    on_conflict: Option<OnConflict>,
}

impl InsertQueryBuilder {
    /// Creates an insert into `table`.
    pub fn new(table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        require_name("table", &table)?;
        Ok(Self {
            table,
            schema: None,
            records: Vec::new(),
            or_ignore: false,
            on_conflict: None,
        })
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

    /// Adds one record.
    pub fn values<I, K, V>(&mut self, record: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToSqlValue,
    {
        let mut entries = Vec::new();
        for (key, value) in record {
            let key = key.into();
            require_name("column", &key)?;
            entries.push((key, value.to_sql_value()));
        }
        self.records.push(entries);
        Ok(self)
    }

    /// Adds several records.
    pub fn values_many<R, I, K, V>(&mut self, records: R) -> Result<&mut Self>
    where
        R: IntoIterator<Item = I>,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: ToSqlValue,
    {
        for record in records {
            self.values(record)?;
        }
        Ok(self)
    }

    /// Skips rows that violate a constraint (`INSERT OR IGNORE`).
    pub fn or_ignore(&mut self) -> &mut Self {
        self.or_ignore = true;
        self
    }

    /// Returns whether constraint violations are ignored.
    #[must_use]
    pub fn is_or_ignore(&self) -> bool {
        self.or_ignore
    }

    /// Sets the conflict target; the action defaults to `DO NOTHING`.
    pub fn on_conflict<I, S>(&mut self, columns: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let columns = collect_names(columns)?;
        if columns.is_empty() {
            return Err(SqlError::invalid_argument("conflict target has no column"));
        }
        self.on_conflict = Some(OnConflict {
            columns,
            action: ConflictAction::Nothing,
        });
        Ok(self)
    }

    /// Updates `columns` from the conflicting row.
    pub fn do_update<I, S>(&mut self, columns: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let columns = collect_names(columns)?;
        let Some(conflict) = self.on_conflict.as_mut() else {
            return Err(SqlError::invalid_operation(
                "do_update requires on_conflict first",
            ));
        };
        conflict.action = ConflictAction::Update(columns);
        Ok(self)
    }

    /// Returns the upsert clause.
    #[must_use]
    pub fn conflict(&self) -> Option<&OnConflict> {
        self.on_conflict.as_ref()
    }

    /// Returns whether no record was added.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Returns the union of record keys in first-seen order.
    #[must_use]
    pub fn column_names(&self) -> Vec<String> {
        let mut columns: Vec<String> = Vec::new();
        for (key, _) in self.records.iter().flatten() {
            if !columns.contains(key) {
                columns.push(key.clone());
            }
        }
        columns
    }

    /// Returns one value row per record, in [`column_names`](Self::column_names)
    /// order.
    #[must_use]
    pub fn rows(&self) -> Vec<Vec<SqlValue>> {
        let columns = self.column_names();
        self.records
            .iter()
            .map(|record| {
                columns
                    .iter()
                    .map(|column| {
                        record
                            .iter()
                            .find(|(key, _)| key == column)
                            .map_or(SqlValue::Null, |(_, value)| value.clone())
                    })
                    .collect()
            })
            .collect()
    }
}

fn collect_names<I, S>(columns: I) -> Result<Vec<String>>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    columns
        .into_iter()
        .map(|column| {
            let column = column.as_ref();
            require_name("column", column)?;
            Ok(String::from(column))
        })
        .collect()
}

impl QueryBuilder for InsertQueryBuilder {
    fn context(&self) -> QueryContext {
        QueryContext::Insert
    }

    fn compile(&self, compiler: &dyn Compiler) -> Result<CompiledQuery> {
        compiler.compile_insert(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> SqlValue {
        SqlValue::Text(String::from(s))
    }

    #[test]
    fn test_union_of_keys() {
        let mut insert = InsertQueryBuilder::new("users").unwrap();
        insert
            .values([("name", "ann")])
            .unwrap()
            .values([("email", "bob@example.com"), ("name", "bob")])
            .unwrap();

        assert_eq!(insert.column_names(), vec!["name", "email"]);
        assert_eq!(
            insert.rows(),
            vec![
                vec![text("ann"), SqlValue::Null],
                vec![text("bob"), text("bob@example.com")],
            ]
        );
    }

    #[test]
    fn test_do_update_requires_conflict_target() {
        let mut insert = InsertQueryBuilder::new("users").unwrap();
        assert!(matches!(
            insert.do_update(["name"]),
            Err(SqlError::InvalidOperation(_))
        ));
        insert.on_conflict(["id"]).unwrap().do_update(["name"]).unwrap();
        assert_eq!(
            insert.conflict().map(|c| &c.action),
            Some(&ConflictAction::Update(vec![String::from("name")]))
        );
    }

    #[test]
    fn test_empty_key_rejected() {
        let mut insert = InsertQueryBuilder::new("users").unwrap();
        assert!(insert.values([("", 1)]).is_err());
    }
}
