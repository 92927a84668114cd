//! SQL values and parameter handling.
//!
//! Every user supplied value travels as a binding, never as inline text.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

/// A SQL value that can be used as a parameter.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    /// NULL value.
    Null,
    /// Boolean value.
    Bool(bool),
    /// Integer value.
    Int(i64),
    /// Float value.
    Float(f64),
    /// Text value.
    Text(String),
    /// Binary blob value.
    Blob(Vec<u8>),
    /// Date and time without time zone.
    Timestamp(NaiveDateTime),
}

impl SqlValue {
    /// Returns whether this is the NULL value.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the SQL representation for inline use (escaped).
    ///
    /// Only used for DDL defaults, where placeholders are not allowed.
    #[must_use]
    pub fn to_sql_inline(&self) -> String {
        match self {
            Self::Null => String::from("NULL"),
            Self::Bool(b) => {
                if *b {
                    String::from("TRUE")
                } else {
                    String::from("FALSE")
                }
            }
            Self::Int(n) => format!("{n}"),
            Self::Float(f) => format!("{f}"),
            Self::Text(s) => {
                // Escape single quotes by doubling them
                let escaped = s.replace('\'', "''");
                format!("'{escaped}'")
            }
            Self::Blob(b) => {
                let hex: String = b.iter().map(|byte| format!("{byte:02X}")).collect();
                format!("X'{hex}'")
            }
            Self::Timestamp(ts) => format!("'{}'", ts.format("%Y-%m-%d %H:%M:%S")),
        }
    }

    /// Converts the value into its JSON form.
    ///
    /// Blobs become arrays of bytes, timestamps ISO-8601 strings.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(n) => Value::from(*n),
            Self::Float(f) => Value::from(*f),
            Self::Text(s) => Value::String(s.clone()),
            Self::Blob(b) => Value::Array(b.iter().map(|byte| Value::from(*byte)).collect()),
            Self::Timestamp(ts) => Value::String(ts.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
        }
    }
}

/// Trait for types that can be converted to SQL values.
pub trait ToSqlValue {
    /// Converts the value to a `SqlValue`.
    fn to_sql_value(self) -> SqlValue;
}

impl ToSqlValue for SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self
    }
}

impl ToSqlValue for &SqlValue {
    fn to_sql_value(self) -> SqlValue {
        self.clone()
    }
}

impl ToSqlValue for bool {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Bool(self)
    }
}

macro_rules! impl_to_sql_value_int {
    ($($ty:ty),+) => {
        $(
            impl ToSqlValue for $ty {
                fn to_sql_value(self) -> SqlValue {
                    SqlValue::Int(i64::from(self))
                }
            }
        )+
    };
}

impl_to_sql_value_int!(i64, i32, i16, i8, u32, u16, u8);

impl ToSqlValue for f64 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(self)
    }
}

impl ToSqlValue for f32 {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Float(f64::from(self))
    }
}

impl ToSqlValue for String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self)
    }
}

impl ToSqlValue for &String {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self.clone())
    }
}

impl ToSqlValue for &str {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(String::from(self))
    }
}

impl<T: ToSqlValue> ToSqlValue for Option<T> {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Some(v) => v.to_sql_value(),
            None => SqlValue::Null,
        }
    }
}

impl ToSqlValue for Vec<u8> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self)
    }
}

impl ToSqlValue for &[u8] {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Blob(self.to_vec())
    }
}

impl ToSqlValue for NaiveDateTime {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Timestamp(self)
    }
}

impl ToSqlValue for DateTime<Utc> {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Timestamp(self.naive_utc())
    }
}

impl ToSqlValue for NaiveDate {
    fn to_sql_value(self) -> SqlValue {
        SqlValue::Text(self.format("%Y-%m-%d").to_string())
    }
}

impl ToSqlValue for Value {
    fn to_sql_value(self) -> SqlValue {
        match self {
            Value::Null => SqlValue::Null,
            Value::Bool(b) => SqlValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => SqlValue::Int(i),
                None => SqlValue::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => SqlValue::Text(s),
            // Structured values are stored as their JSON text.
            other @ (Value::Array(_) | Value::Object(_)) => SqlValue::Text(other.to_string()),
        }
    }
}

impl ToSqlValue for &Value {
    fn to_sql_value(self) -> SqlValue {
        self.clone().to_sql_value()
    }
}
