use std::cmp::Ordering;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::index::ColumnType;

/// A single cell of the file index.
///
/// # Type Preservation
///
/// Integers and floats are kept apart (sizes and inode numbers stay exact),
/// but compare with each other numerically.
///
/// # Examples
///
/// ```
/// use fdb_query::Value;
/// use std::cmp::Ordering;
///
/// let size = Value::Integer(2048);
/// let half = Value::Float(1024.5);
///
/// assert_eq!(size.compare(&half), Some(Ordering::Greater));
/// assert_eq!(Value::Null.compare(&size), None);
/// assert_eq!(Value::String("a.txt".into()).as_string(), "a.txt");
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// Missing value
    Null,

    /// Integer number (sizes, inodes, link counts)
    Integer(i64),

    /// Floating-point number
    Float(f64),

    /// UTF-8 string (names, paths, hashes)
    String(String),

    /// Instant in UTC (modification and creation times)
    Datetime(DateTime<Utc>),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Get as float
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Value::Integer(n) => Some(*n as f64),
            Value::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Get as datetime
    pub fn as_datetime(&self) -> Option<DateTime<Utc>> {
        match self {
            Value::Datetime(dt) => Some(*dt),
            _ => None,
        }
    }

    /// Text form used for pattern matching and plain-text output
    pub fn as_string(&self) -> String {
        match self {
            Value::String(s) => s.clone(),
            Value::Float(n) => n.to_string(),
            Value::Integer(n) => n.to_string(),
            Value::Datetime(dt) => dt.to_rfc3339_opts(SecondsFormat::AutoSi, true),
            Value::Null => String::new(),
        }
    }

    /// The column type this value may be stored in; `None` for null.
    pub fn column_type(&self) -> Option<ColumnType> {
        match self {
            Value::Null => None,
            Value::Integer(_) | Value::Float(_) => Some(ColumnType::Number),
            Value::String(_) => Some(ColumnType::String),
            Value::Datetime(_) => Some(ColumnType::Datetime),
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Datetime(_) => "datetime",
        }
    }

    /// Orders two values of the same kind, as a comparison test sees them.
    ///
    /// Returns `None` when either side is null, the kinds differ, or a
    /// number is NaN. `-0.0` equals `0`.
    pub fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(a), Value::Integer(b)) => Some(a.cmp(b)),
            (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
            (Value::Datetime(a), Value::Datetime(b)) => Some(a.cmp(b)),
            (a, b) => a.as_float()?.partial_cmp(&b.as_float()?),
        }
    }

    /// Like [`Value::compare`] but total over numbers, for sorting: NaN
    /// sorts above every number and `-0.0` just below `0`.
    pub fn sort_order(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Float(_), _) | (_, Value::Float(_)) => {
                Some(self.as_float()?.total_cmp(&other.as_float()?))
            }
            _ => self.compare(other),
        }
    }
}

#[test]
fn test_compare_treats_signed_zeros_as_equal() {
    assert_eq!(Value::Integer(0).compare(&Value::Float(-0.0)), Some(Ordering::Equal));
    assert_eq!(Value::Float(f64::NAN).compare(&Value::Integer(1)), None);
    assert_eq!(
        Value::Float(f64::NAN).sort_order(&Value::Integer(1)),
        Some(Ordering::Greater)
    );
}
