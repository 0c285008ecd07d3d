//! Rendering query results as JSON or as a plain-text table.
//!
//! # Features
//!
//! - **Compact output** via [`to_json()`] - one line, no extra whitespace
//! - **Pretty output** via [`to_json_pretty()`] - 2-space indentation
//! - **Table output** via [`to_table()`] - tab-separated with a header line
//! - **Column order** - object keys follow the result's column order
//! - **Type preservation** - integers stay integers, dates are RFC 3339 strings
//!
//! # Examples
//!
//! ```
//! use fdb_query::{FlagSet, QueryResult, Value};
//! use fdb_query::output::{to_json, to_table};
//!
//! let result = QueryResult {
//!     columns: vec!["name".to_string(), "size".to_string()],
//!     rows: vec![vec![Value::String("a.txt".to_string()), Value::Integer(10)]],
//!     total_matched: 1,
//!     scanned: 3,
//!     flags: FlagSet::new(),
//! };
//!
//! assert_eq!(to_json(&result), r#"[{"name":"a.txt","size":10}]"#);
//! assert_eq!(to_table(&result), "name\tsize\na.txt\t10\n");
//! ```

use crate::{ast::Flag, evaluator::QueryResult, value::Value};

pub struct JsonPrinter {
    pretty: bool,
}

impl JsonPrinter {
    pub fn new(pretty: bool) -> Self {
        JsonPrinter { pretty }
    }

    pub fn print(&self, result: &QueryResult) -> String {
        if result.rows.is_empty() {
            return "[]".to_string();
        }

        let rows: Vec<String> = result
            .rows
            .iter()
            .map(|row| self.print_row(&result.columns, row))
            .collect();

        if self.pretty {
            let items: Vec<String> = rows
                .iter()
                .map(|row| format!("{}{}", self.indent(1), row))
                .collect();
            format!("[\n{}\n]", items.join(",\n"))
        } else {
            format!("[{}]", rows.join(","))
        }
    }

    fn print_row(&self, columns: &[String], row: &[Value]) -> String {
        if columns.is_empty() {
            return "{}".to_string();
        }

        if self.pretty {
            let items: Vec<String> = columns
                .iter()
                .zip(row)
                .map(|(column, value)| {
                    format!(
                        "{}\"{}\": {}",
                        self.indent(2),
                        self.escape_string(column),
                        self.print_value(value)
                    )
                })
                .collect();
            format!("{{\n{}\n{}}}", items.join(",\n"), self.indent(1))
        } else {
            let items: Vec<String> = columns
                .iter()
                .zip(row)
                .map(|(column, value)| {
                    format!("\"{}\":{}", self.escape_string(column), self.print_value(value))
                })
                .collect();
            format!("{{{}}}", items.join(","))
        }
    }

    fn print_value(&self, value: &Value) -> String {
        match value {
            Value::Null => "null".to_string(),
            Value::Integer(n) => n.to_string(),
            // JSON has no infinities or NaN
            Value::Float(n) if !n.is_finite() => "null".to_string(),
            Value::Float(n) => n.to_string(),
            Value::String(_) | Value::Datetime(_) => {
                format!("\"{}\"", self.escape_string(&value.as_string()))
            }
        }
    }

    fn indent(&self, level: usize) -> String {
        "  ".repeat(level)
    }

    fn escape_string(&self, s: &str) -> String {
        s.chars()
            .flat_map(|c| match c {
                '"' => vec!['\\', '"'],
                '\\' => vec!['\\', '\\'],
                '\n' => vec!['\\', 'n'],
                '\r' => vec!['\\', 'r'],
                '\t' => vec!['\\', 't'],
                c if c.is_control() => format!("\\u{:04x}", c as u32).chars().collect(),
                c => vec![c],
            })
            .collect()
    }
}

/// Converts a result to a compact JSON array of row objects.
pub fn to_json(result: &QueryResult) -> String {
    JsonPrinter::new(false).print(result)
}

/// Converts a result to an indented JSON array of row objects.
///
/// ```text
/// [
///   {
///     "name": "a.txt",
///     "size": 10
///   }
/// ]
/// ```
pub fn to_json_pretty(result: &QueryResult) -> String {
    JsonPrinter::new(true).print(result)
}

/// Tab-separated rows under a header line. Nulls print as empty cells.
///
/// With the `verbose` flag a final `N of M rows` line reports how many rows
/// matched out of how many were scanned.
pub fn to_table(result: &QueryResult) -> String {
    let mut out = String::new();
    out.push_str(&result.columns.join("\t"));
    out.push('\n');

    for row in &result.rows {
        let cells: Vec<String> = row
            .iter()
            .map(|value| value.as_string().replace(['\t', '\n'], " "))
            .collect();
        out.push_str(&cells.join("\t"));
        out.push('\n');
    }

    if result.flags.contains(Flag::Verbose) {
        out.push_str(&format!(
            "{} of {} rows\n",
            result.total_matched, result.scanned
        ));
    }

    out
}
