//! Operator, sort and column type definitions.

use std::fmt;
use std::str::FromStr;

use crate::error::SqlError;

/// Comparison operators accepted by where clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlOperator {
    /// `=`
    Eq,
    /// `!=`
    NotEq,
    /// `<>`
    LtGt,
    /// `>`
    Gt,
    /// `>=`
    Gte,
    /// `<`
    Lt,
    /// `<=`
    Lte,
    /// `LIKE`
    Like,
    /// `NOT LIKE`
    NotLike,
    /// `IS NULL`
    IsNull,
    /// `IS NOT NULL`
    IsNotNull,
}

impl SqlOperator {
    /// Returns the SQL representation.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::NotEq => "!=",
            Self::LtGt => "<>",
            Self::Gt => ">",
            Self::Gte => ">=",
            Self::Lt => "<",
            Self::Lte => "<=",
            Self::Like => "LIKE",
            Self::NotLike => "NOT LIKE",
            Self::IsNull => "IS NULL",
            Self::IsNotNull => "IS NOT NULL",
        }
    }
}

impl FromStr for SqlOperator {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.to_ascii_uppercase().as_str() {
            "=" => Ok(Self::Eq),
            "!=" => Ok(Self::NotEq),
            "<>" => Ok(Self::LtGt),
            ">" => Ok(Self::Gt),
            ">=" => Ok(Self::Gte),
            "<" => Ok(Self::Lt),
            "<=" => Ok(Self::Lte),
            "LIKE" => Ok(Self::Like),
            "NOT LIKE" => Ok(Self::NotLike),
            "IS NULL" => Ok(Self::IsNull),
            "IS NOT NULL" => Ok(Self::IsNotNull),
            _ => Err(SqlError::invalid_argument(format!(
                "operator {s:?} is not supported"
            ))),
        }
    }
}

impl fmt::Display for SqlOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending.
    #[default]
    Asc,
    /// Descending.
    Desc,
}

impl SortDirection {
    /// Returns the SQL keyword.
    #[must_use]
    pub const fn as_sql(self) -> &'static str {
        match self {
            Self::Asc => "ASC",
            Self::Desc => "DESC",
        }
    }
}

impl FromStr for SortDirection {
    type Err = SqlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "ASC" => Ok(Self::Asc),
            "DESC" => Ok(Self::Desc),
            _ => Err(SqlError::invalid_argument(format!(
                "sort direction {s:?} is not supported"
            ))),
        }
    }
}

/// Column types of the table builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnType {
    // Integer family
    /// 1-byte integer.
    TinyInt,
    /// 2-byte integer.
    SmallInt,
    /// 3-byte integer.
    MediumInt,
    /// 4-byte integer.
    Int,
    /// 8-byte integer.
    BigInt,

    // Text family
    /// Variable-length string with a maximum length.
    String(u32),
    /// Text.
    Text,
    /// Tiny text.
    TinyText,
    /// Medium text.
    MediumText,
    /// Long text.
    LongText,

    // Numeric family
    /// 4-byte float.
    Float,
    /// 8-byte float.
    Double,
    /// Exact decimal.
    Decimal {
        /// Total number of digits.
        precision: u16,
        /// Digits after the decimal point.
        scale: u16,
    },
    /// Boolean.
    Boolean,

    // Temporal family
    /// Date.
    Date,
    /// Time.
    Time,
    /// Date and time.
    DateTime,
    /// Timestamp.
    Timestamp,

    /// One of a fixed set of string values.
    Enum(Vec<String>),
    /// JSON document.
    Json,
}

impl ColumnType {
    /// Returns the generic SQL type name.
    #[must_use]
    pub fn to_sql(&self) -> String {
        match self {
            Self::TinyInt => String::from("TINYINT"),
            Self::SmallInt => String::from("SMALLINT"),
            Self::MediumInt => String::from("MEDIUMINT"),
            Self::Int => String::from("INTEGER"),
            Self::BigInt => String::from("BIGINT"),
            Self::String(len) => format!("VARCHAR({len})"),
            Self::Text | Self::Enum(_) => String::from("TEXT"),
            Self::TinyText => String::from("TINYTEXT"),
            Self::MediumText => String::from("MEDIUMTEXT"),
            Self::LongText => String::from("LONGTEXT"),
            Self::Float => String::from("FLOAT"),
            Self::Double => String::from("DOUBLE"),
            Self::Decimal { precision, scale } => format!("DECIMAL({precision}, {scale})"),
            Self::Boolean => String::from("BOOLEAN"),
            Self::Date => String::from("DATE"),
            Self::Time => String::from("TIME"),
            Self::DateTime => String::from("DATETIME"),
            Self::Timestamp => String::from("TIMESTAMP"),
            Self::Json => String::from("JSON"),
        }
    }

    /// Returns whether the type belongs to the integer family.
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        matches!(
            self,
            Self::TinyInt | Self::SmallInt | Self::MediumInt | Self::Int | Self::BigInt
        )
    }

    /// Returns whether the type is numeric.
    #[must_use]
    pub const fn is_numeric(&self) -> bool {
        self.is_integer() || matches!(self, Self::Float | Self::Double | Self::Decimal { .. })
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_sql())
    }
}
