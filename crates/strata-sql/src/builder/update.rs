//! UPDATE query builder.

use crate::compiler::{CompiledQuery, Compiler, QueryBuilder, QueryContext};
use crate::error::{require_name, Result};

use super::value::{SqlValue, ToSqlValue};
use super::where_clause::{WhereBuilder, WhereClause};

/// An UPDATE with a where clause.
#[derive(Debug, Clone)]
pub struct UpdateQueryBuilder {
    table: String,
    schema: Option<String>,
    assignments: Vec<(String, SqlValue)>,
    wheres: WhereBuilder,
}

impl UpdateQueryBuilder {
    /// Creates an update of `table`.
    pub fn new(table: impl Into<String>) -> Result<Self> {
        let table = table.into();
        require_name("table", &table)?;
        Ok(Self {
            table,
            schema: None,
            assignments: Vec::new(),
            wheres: WhereBuilder::new(),
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

    /// Assigns `value` to `column`. Assigning the same column twice keeps the
    /// last value.
    pub fn set<V: ToSqlValue>(&mut self, column: &str, value: V) -> Result<&mut Self> {
        require_name("column", column)?;
        let value = value.to_sql_value();
        match self.assignments.iter_mut().find(|(c, _)| c == column) {
            Some((_, existing)) => *existing = value,
            None => self.assignments.push((String::from(column), value)),
        }
        Ok(self)
    }

    /// Assigns every entry of `values`.
    pub fn set_many<I, K, V>(&mut self, values: I) -> Result<&mut Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: ToSqlValue,
    {
        for (column, value) in values {
            self.set(column.as_ref(), value)?;
        }
        Ok(self)
    }

    /// Returns the assignments in insertion order.
    #[must_use]
    pub fn assignments(&self) -> &[(String, SqlValue)] {
        &self.assignments
    }
}

impl WhereClause for UpdateQueryBuilder {
    fn where_builder(&self) -> &WhereBuilder {
        &self.wheres
    }

    fn where_builder_mut(&mut self) -> &mut WhereBuilder {
        &mut self.wheres
    }
}

impl QueryBuilder for UpdateQueryBuilder {
    fn context(&self) -> QueryContext {
        QueryContext::Update
    }

    fn compile(&self, compiler: &dyn Compiler) -> Result<CompiledQuery> {
        compiler.compile_update(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_overwrites_same_column() {
        let mut update = UpdateQueryBuilder::new("users").unwrap();
        update.set("name", "a").unwrap().set("name", "b").unwrap();
        assert_eq!(
            update.assignments(),
            &[(String::from("name"), SqlValue::Text(String::from("b")))]
        );
    }

    #[test]
    fn test_set_many_keeps_order() {
        let mut update = UpdateQueryBuilder::new("users").unwrap();
        update
            .set_many([("b", SqlValue::Int(2)), ("a", SqlValue::Int(1))])
            .unwrap();
        let columns: Vec<&str> = update.assignments().iter().map(|(c, _)| c.as_str()).collect();
        assert_eq!(columns, vec!["b", "a"]);
    }
}
