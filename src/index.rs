//! The tabular file index a query runs against.
//!
//! The evaluator only sees the [`FileIndex`] trait: a fixed schema of typed
//! columns and rows addressed by position. [`MemoryIndex`] is the row-major
//! implementation used by the command line tool and the tests; indexes kept
//! in other layouts (a columnar file, a database) implement the trait
//! directly.

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;

use crate::value::Value;

/// Semantic type of a column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColumnType {
    String,
    Number,
    Datetime,
}

impl ColumnType {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "string" | "str" | "text" => Some(ColumnType::String),
            "number" | "int" | "integer" | "float" => Some(ColumnType::Number),
            "datetime" | "date" | "timestamp" => Some(ColumnType::Datetime),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ColumnType::String => "string",
            ColumnType::Number => "number",
            ColumnType::Datetime => "datetime",
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub column_type: ColumnType,
}

impl Column {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Column {
            name: name.into(),
            column_type,
        }
    }
}

/// Read-only view of a file index.
///
/// Rows are numbered `0..row_count()` and that order is the order results
/// come out in when a query does not sort.
pub trait FileIndex {
    /// Schema, in column order.
    fn columns(&self) -> &[Column];

    fn row_count(&self) -> usize;

    /// Value of `column` in `row`; [`Value::Null`] if either is unknown.
    fn get(&self, row: usize, column: &str) -> Value;

    /// Reference figure that `%` numbers in comparisons against `column`
    /// are relative to, e.g. the total size of the indexed volume.
    fn baseline(&self, _column: &str) -> Option<f64> {
        None
    }

    fn has_column(&self, name: &str) -> bool {
        self.columns().iter().any(|c| c.name == name)
    }

    fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns()
            .iter()
            .find(|c| c.name == name)
            .map(|c| c.column_type)
    }

    fn rows(&self) -> Range<usize> {
        0..self.row_count()
    }
}

/// Errors raised while building a [`MemoryIndex`].
#[derive(Debug, Clone, PartialEq)]
pub enum IndexError {
    /// Two columns share a name
    DuplicateColumn(String),

    /// A row has the wrong number of cells
    RowArity { expected: usize, found: usize },

    /// A cell does not fit its column's type
    CellType {
        column: String,
        expected: ColumnType,
        found: &'static str,
    },
}

impl fmt::Display for IndexError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndexError::DuplicateColumn(name) => write!(f, "Duplicate column: {}", name),
            IndexError::RowArity { expected, found } => {
                write!(f, "Row has {} values, schema has {} columns", found, expected)
            }
            IndexError::CellType {
                column,
                expected,
                found,
            } => write!(
                f,
                "Column '{}' holds {} values, got {}",
                column, expected, found
            ),
        }
    }
}

impl std::error::Error for IndexError {}

/// Row-major in-memory index.
///
/// # Examples
///
/// ```
/// use fdb_query::index::{Column, ColumnType, FileIndex, MemoryIndex};
/// use fdb_query::Value;
///
/// let mut index = MemoryIndex::new(vec![
///     Column::new("name", ColumnType::String),
///     Column::new("size", ColumnType::Number),
/// ])
/// .unwrap();
/// index.push_row(vec![Value::String("a.txt".into()), Value::Integer(10)]).unwrap();
///
/// assert_eq!(index.row_count(), 1);
/// assert_eq!(index.get(0, "size"), Value::Integer(10));
/// assert_eq!(index.get(0, "missing"), Value::Null);
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryIndex {
    columns: Vec<Column>,
    positions: HashMap<String, usize>,
    rows: Vec<Vec<Value>>,
    baselines: HashMap<String, f64>,
}

impl MemoryIndex {
    pub fn new(columns: Vec<Column>) -> Result<Self, IndexError> {
        let mut positions = HashMap::new();
        for (i, column) in columns.iter().enumerate() {
            if positions.insert(column.name.clone(), i).is_some() {
                return Err(IndexError::DuplicateColumn(column.name.clone()));
            }
        }

        Ok(MemoryIndex {
            columns,
            positions,
            rows: Vec::new(),
            baselines: HashMap::new(),
        })
    }

    /// Appends a row, cells in schema order. Nulls fit every column.
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<(), IndexError> {
        if row.len() != self.columns.len() {
            return Err(IndexError::RowArity {
                expected: self.columns.len(),
                found: row.len(),
            });
        }

        for (column, value) in self.columns.iter().zip(&row) {
            if let Some(found) = value.column_type()
                && found != column.column_type
            {
                return Err(IndexError::CellType {
                    column: column.name.clone(),
                    expected: column.column_type,
                    found: value.type_name(),
                });
            }
        }

        self.rows.push(row);
        Ok(())
    }

    pub fn set_baseline(&mut self, column: impl Into<String>, value: f64) {
        self.baselines.insert(column.into(), value);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FileIndex for MemoryIndex {
    fn columns(&self) -> &[Column] {
        &self.columns
    }

    fn row_count(&self) -> usize {
        self.rows.len()
    }

    fn get(&self, row: usize, column: &str) -> Value {
        self.positions
            .get(column)
            .and_then(|&i| self.rows.get(row).map(|cells| cells[i].clone()))
            .unwrap_or(Value::Null)
    }

    fn baseline(&self, column: &str) -> Option<f64> {
        self.baselines.get(column).copied()
    }

    fn has_column(&self, name: &str) -> bool {
        self.positions.contains_key(name)
    }
}
