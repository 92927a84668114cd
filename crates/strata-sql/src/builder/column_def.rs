//! Column definitions for the table builder.

use crate::ast::ColumnType;

use super::value::{SqlValue, ToSqlValue};

/// Action taken on a referenced row's delete or update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForeignKeyAction {
    /// No action.
    NoAction,
    /// Restrict deletion/update.
    Restrict,
    /// Cascade the operation.
    Cascade,
    /// Set to NULL.
    SetNull,
    /// Set to default value.
    SetDefault,
}

impl ForeignKeyAction {
    /// Returns the SQL representation of the action.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::NoAction => "NO ACTION",
            Self::Restrict => "RESTRICT",
            Self::Cascade => "CASCADE",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

/// Default value of a column.
#[derive(Debug, Clone, PartialEq)]
pub enum DefaultValue {
    /// A literal, rendered inline.
    Value(SqlValue),
    /// Raw SQL expression (e.g., CURRENT_TIMESTAMP).
    Expression(String),
}

impl DefaultValue {
    /// Returns the SQL representation of the default value.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::Value(value) => value.to_sql_inline(),
            Self::Expression(expr) => expr.clone(),
        }
    }
}

/// One column of a CREATE TABLE, configured through chained modifiers.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnDefinition {
    name: String,
    column_type: ColumnType,
    nullable: bool,
    unique: bool,
    unsigned: bool,
    auto_increment: bool,
    primary_key: bool,
    default: Option<DefaultValue>,
    comment: Option<String>,
    charset: Option<String>,
    collation: Option<String>,
}

impl ColumnDefinition {
    /// Creates a nullable column.
    #[must_use]
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
            unique: false,
            unsigned: false,
            auto_increment: false,
            primary_key: false,
            default: None,
            comment: None,
            charset: None,
            collation: None,
        }
    }

    /// Allows NULL (the default).
    pub fn nullable(&mut self) -> &mut Self {
        self.nullable = true;
        self
    }

    /// Sets the column as NOT NULL.
    pub fn not_null(&mut self) -> &mut Self {
        self.nullable = false;
        self
    }

    /// Sets the column as UNIQUE.
    pub fn unique(&mut self) -> &mut Self {
        self.unique = true;
        self
    }

    /// Marks a numeric column unsigned.
    pub fn unsigned(&mut self) -> &mut Self {
        self.unsigned = true;
        self
    }

    /// Sets the column as AUTOINCREMENT.
    pub fn auto_increment(&mut self) -> &mut Self {
        self.auto_increment = true;
        self
    }

    /// Sets the column as PRIMARY KEY.
    pub fn primary_key(&mut self) -> &mut Self {
        self.primary_key = true;
        self.nullable = false; // Primary keys are implicitly NOT NULL
        self
    }

    /// Sets a literal default.
    pub fn default<V: ToSqlValue>(&mut self, value: V) -> &mut Self {
        self.default = Some(DefaultValue::Value(value.to_sql_value()));
        self
    }

    /// Sets a default expression emitted verbatim.
    pub fn default_raw(&mut self, expression: impl Into<String>) -> &mut Self {
        self.default = Some(DefaultValue::Expression(expression.into()));
        self
    }

    /// Attaches a comment.
    pub fn comment(&mut self, comment: impl Into<String>) -> &mut Self {
        self.comment = Some(comment.into());
        self
    }

    /// Sets the character set.
    pub fn charset(&mut self, charset: impl Into<String>) -> &mut Self {
        self.charset = Some(charset.into());
        self
    }

    /// Sets the collation.
    pub fn collation(&mut self, collation: impl Into<String>) -> &mut Self {
        self.collation = Some(collation.into());
        self
    }

    /// Returns the column name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the column type.
    #[must_use]
    pub fn column_type(&self) -> &ColumnType {
        &self.column_type
    }

    /// Returns whether NULL is allowed.
    #[must_use]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    /// Returns whether the column is UNIQUE.
    #[must_use]
    pub fn is_unique(&self) -> bool {
        self.unique
    }

    /// Returns whether the column is unsigned.
    #[must_use]
    pub fn is_unsigned(&self) -> bool {
        self.unsigned
    }

    /// Returns whether the column auto-increments.
    #[must_use]
    pub fn is_auto_increment(&self) -> bool {
        self.auto_increment
    }

    /// Returns whether the column is the primary key.
    #[must_use]
    pub fn is_primary_key(&self) -> bool {
        self.primary_key
    }

    /// Returns the default value.
    #[must_use]
    pub fn default_value(&self) -> Option<&DefaultValue> {
        self.default.as_ref()
    }

    /// Returns the comment.
    #[must_use]
    pub fn comment_text(&self) -> Option<&str> {
        self.comment.as_deref()
    }

    /// Returns the character set.
    #[must_use]
    pub fn charset_name(&self) -> Option<&str> {
        self.charset.as_deref()
    }

    /// Returns the collation.
    #[must_use]
    pub fn collation_name(&self) -> Option<&str> {
        self.collation.as_deref()
    }
}

/// A table-level foreign key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyDefinition {
    column: String,
    references: Option<(String, String)>,
    on_delete: Option<ForeignKeyAction>,
    on_update: Option<ForeignKeyAction>,
}

impl ForeignKeyDefinition {
    pub(crate) fn new(column: String) -> Self {
        Self {
            column,
            references: None,
            on_delete: None,
            on_update: None,
        }
    }

    /// Points the key at `table(column)`.
    pub fn references(&mut self, table: impl Into<String>, column: impl Into<String>) -> &mut Self {
        self.references = Some((table.into(), column.into()));
        self
    }

    /// Sets the ON DELETE action.
    pub fn on_delete(&mut self, action: ForeignKeyAction) -> &mut Self {
        self.on_delete = Some(action);
        self
    }

    /// Sets the ON UPDATE action.
    pub fn on_update(&mut self, action: ForeignKeyAction) -> &mut Self {
        self.on_update = Some(action);
        self
    }

    /// Returns the local column.
    #[must_use]
    pub fn column(&self) -> &str {
        &self.column
    }

    /// Returns the referenced table and column.
    #[must_use]
    pub fn referenced(&self) -> Option<(&str, &str)> {
        self.references
            .as_ref()
            .map(|(table, column)| (table.as_str(), column.as_str()))
    }

    /// Returns the ON DELETE action.
    #[must_use]
    pub fn delete_action(&self) -> Option<ForeignKeyAction> {
        self.on_delete
    }

    /// Returns the ON UPDATE action.
    #[must_use]
    pub fn update_action(&self) -> Option<ForeignKeyAction> {
        self.on_update
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primary_key_implies_not_null() {
        let mut column = ColumnDefinition::new("id", ColumnType::Int);
        column.primary_key().auto_increment();
        assert!(!column.is_nullable());
        assert!(column.is_primary_key());
        assert!(column.is_auto_increment());
    }

    #[test]
    fn test_default_rendering() {
        let mut column = ColumnDefinition::new("name", ColumnType::Text);
        column.default("O'Brien");
        assert_eq!(
            column.default_value().map(DefaultValue::to_sql).as_deref(),
            Some("'O''Brien'")
        );
        column.default_raw("CURRENT_TIMESTAMP");
        assert_eq!(
            column.default_value().map(DefaultValue::to_sql).as_deref(),
            Some("CURRENT_TIMESTAMP")
        );
    }
}
