//! JSON -> file index conversion

use chrono::{DateTime, Utc};
use serde_json::{Map, Value as Json};

use super::CliError;
use crate::{
    Value,
    index::{Column, ColumnType, MemoryIndex},
};

/// Load an index from JSON text.
///
/// Two layouts are accepted:
///
/// - an array of row objects; columns appear in first-seen key order, a key
///   missing from a row is null, and each column's type is inferred
/// - `{"columns": [{"name": .., "type": ..}], "rows": [..], "baselines": {..}}`
///   where rows are objects or arrays in column order
pub fn load_index(json: &str) -> Result<MemoryIndex, CliError> {
    let document: Json = serde_json::from_str(json)?;
    match document {
        Json::Array(rows) => {
            let objects = rows
                .into_iter()
                .map(|row| match row {
                    // Keys are matched case-insensitively, like column names in queries
                    Json::Object(object) => Ok(object
                        .into_iter()
                        .map(|(k, v)| (k.to_lowercase(), v))
                        .collect::<Map<_, _>>()),
                    other => Err(CliError::BadIndex(format!(
                        "expected row objects, found {}",
                        json_type(&other)
                    ))),
                })
                .collect::<Result<Vec<_>, _>>()?;
            let columns = infer_columns(&objects);
            build_index(columns, objects.into_iter().map(Json::Object).collect())
        }
        Json::Object(mut object) => {
            let columns = match object.remove("columns") {
                Some(Json::Array(columns)) => columns
                    .iter()
                    .map(declared_column)
                    .collect::<Result<Vec<_>, _>>()?,
                _ => return Err(CliError::BadIndex("missing \"columns\" array".to_string())),
            };
            let rows = match object.remove("rows") {
                Some(Json::Array(rows)) => rows,
                None => Vec::new(),
                Some(other) => {
                    return Err(CliError::BadIndex(format!(
                        "\"rows\" must be an array, found {}",
                        json_type(&other)
                    )));
                }
            };

            let mut index = build_index(columns, rows)?;
            if let Some(Json::Object(baselines)) = object.remove("baselines") {
                for (column, value) in baselines {
                    let figure = value.as_f64().ok_or_else(|| {
                        CliError::BadIndex(format!("baseline for '{}' is not a number", column))
                    })?;
                    index.set_baseline(column.to_lowercase(), figure);
                }
            }
            Ok(index)
        }
        other => Err(CliError::BadIndex(format!(
            "expected an array or object, found {}",
            json_type(&other)
        ))),
    }
}

/// Parse a `COLUMN=NUMBER` baseline argument; the number may carry a size
/// unit (`size=500GB`).
pub fn parse_baseline(arg: &str) -> Result<(String, f64), CliError> {
    let (column, figure) = arg
        .split_once('=')
        .ok_or_else(|| CliError::BadArgument(format!("expected COLUMN=VALUE, got '{}'", arg)))?;
    let value = figure
        .trim()
        .parse::<f64>()
        .ok()
        .or_else(|| crate::ast::literals::parse_size(figure))
        .ok_or_else(|| CliError::BadArgument(format!("baseline '{}' is not a number", figure)))?;
    Ok((column.trim().to_lowercase(), value))
}

fn declared_column(entry: &Json) -> Result<Column, CliError> {
    let name = entry
        .get("name")
        .and_then(Json::as_str)
        .ok_or_else(|| CliError::BadIndex("column without a \"name\"".to_string()))?;
    let type_name = entry.get("type").and_then(Json::as_str).unwrap_or("string");
    let column_type = ColumnType::from_name(type_name).ok_or_else(|| {
        CliError::BadIndex(format!("column '{}' has unknown type '{}'", name, type_name))
    })?;
    Ok(Column::new(name.to_lowercase(), column_type))
}

/// A column is a number column when every non-null value is a number and a
/// datetime column when every one is an RFC 3339 string.
fn infer_columns(rows: &[Map<String, Json>]) -> Vec<Column> {
    let mut names: Vec<&String> = Vec::new();
    for row in rows {
        for key in row.keys() {
            if !names.contains(&key) {
                names.push(key);
            }
        }
    }

    names
        .into_iter()
        .map(|name| {
            let values: Vec<&Json> = rows
                .iter()
                .filter_map(|row| row.get(name))
                .filter(|value| !value.is_null())
                .collect();
            let column_type = if !values.is_empty() && values.iter().all(|v| v.is_number()) {
                ColumnType::Number
            } else if !values.is_empty()
                && values
                    .iter()
                    .all(|v| v.as_str().and_then(parse_timestamp).is_some())
            {
                ColumnType::Datetime
            } else {
                ColumnType::String
            };
            Column::new(name.clone(), column_type)
        })
        .collect()
}

fn build_index(columns: Vec<Column>, rows: Vec<Json>) -> Result<MemoryIndex, CliError> {
    let keys: Vec<String> = columns.iter().map(|c| c.name.clone()).collect();
    let types: Vec<ColumnType> = columns.iter().map(|c| c.column_type).collect();
    let mut index = MemoryIndex::new(columns)?;

    for (number, row) in rows.into_iter().enumerate() {
        let cells: Vec<Json> = match row {
            Json::Object(object) => {
                let mut lowered: Map<String, Json> = object
                    .into_iter()
                    .map(|(k, v)| (k.to_lowercase(), v))
                    .collect();
                keys.iter()
                    .map(|key| lowered.remove(key).unwrap_or(Json::Null))
                    .collect()
            }
            Json::Array(cells) => cells,
            other => {
                return Err(CliError::BadIndex(format!(
                    "row {} is {}, expected an object or array",
                    number,
                    json_type(&other)
                )));
            }
        };

        let values = cells
            .into_iter()
            .zip(types.iter().chain(std::iter::repeat(&ColumnType::String)))
            .map(|(cell, column_type)| to_value(cell, *column_type, number))
            .collect::<Result<Vec<_>, _>>()?;
        index.push_row(values)?;
    }

    Ok(index)
}

/// Convert one JSON cell to a value of the column's type.
fn to_value(cell: Json, column_type: ColumnType, row: usize) -> Result<Value, CliError> {
    let bad = |cell: &Json| {
        CliError::BadIndex(format!(
            "row {}: {} is not a valid {}",
            row, cell, column_type
        ))
    };

    match (column_type, cell) {
        (_, Json::Null) => Ok(Value::Null),
        (ColumnType::Number, Json::Number(n)) => match n.as_i64() {
            Some(i) => Ok(Value::Integer(i)),
            None => n.as_f64().map(Value::Float).ok_or_else(|| bad(&Json::Number(n))),
        },
        (ColumnType::Datetime, Json::String(s)) => match parse_timestamp(&s) {
            Some(dt) => Ok(Value::Datetime(dt)),
            None => Err(bad(&Json::String(s))),
        },
        (ColumnType::String, Json::String(s)) => Ok(Value::String(s)),
        (ColumnType::String, cell @ (Json::Number(_) | Json::Bool(_))) => {
            Ok(Value::String(cell.to_string()))
        }
        (_, cell) => Err(bad(&cell)),
    }
}

fn parse_timestamp(text: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

fn json_type(value: &Json) -> &'static str {
    match value {
        Json::Null => "null",
        Json::Bool(_) => "a boolean",
        Json::Number(_) => "a number",
        Json::String(_) => "a string",
        Json::Array(_) => "an array",
        Json::Object(_) => "an object",
    }
}

#[test]
fn test_baseline_argument() {
    assert_eq!(parse_baseline("size=1000").unwrap(), ("size".to_string(), 1000.0));
    assert_eq!(parse_baseline("Size=1KB").unwrap(), ("size".to_string(), 1024.0));
    assert!(parse_baseline("size").is_err());
}
