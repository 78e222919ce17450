//! Schema-driven decoding of BigQuery cells into JSON values.
//!
//! The REST API returns every scalar as a string; the column type decides
//! what it becomes in the output row.
//!
//! # Type Mapping
//!
//! - `INTEGER`, `INT64` → integer number
//! - `FLOAT`, `FLOAT64` → number (non-finite values stay strings)
//! - `NUMERIC`, `BIGNUMERIC` → integer when there is no fractional part, else number;
//!   integers wider than 64 bits stay strings so no digit is lost
//! - `BOOLEAN`, `BOOL` → boolean
//! - `TIMESTAMP` → RFC 3339 string in UTC
//! - `JSON` → parsed JSON value
//! - `RECORD`, `STRUCT` → nested object in sub-field order
//! - `REPEATED` mode → array of the element type
//! - everything else (`STRING`, `BYTES`, `DATE`, `TIME`, `DATETIME`, `GEOGRAPHY`, ...) → string
//!
//! Unparseable numerics and booleans fall back to their raw string.

use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Number, Value};

use crate::error::WarehouseError;
use crate::result::{Column, Row};
use crate::wire::TableRow;

/// Decode one wire row against the result columns.
pub(crate) fn decode_row(columns: &[Column], row: &TableRow) -> Result<Row, WarehouseError> {
    if row.f.len() != columns.len() {
        return Err(WarehouseError::Decode(format!(
            "row has {} cells but schema has {} columns",
            row.f.len(),
            columns.len()
        )));
    }

    let mut out = Row::new();
    for (col, cell) in columns.iter().zip(&row.f) {
        out.insert(col.name.clone(), decode_cell(col, &cell.v)?);
    }
    Ok(out)
}

fn decode_cell(col: &Column, raw: &Value) -> Result<Value, WarehouseError> {
    if raw.is_null() {
        return Ok(Value::Null);
    }

    if col.is_repeated() {
        let items = raw.as_array().ok_or_else(|| {
            WarehouseError::Decode(format!("column {} is REPEATED but value is not a list", col.name))
        })?;
        return items
            .iter()
            .map(|item| decode_scalar_or_record(col, item.get("v").unwrap_or(&Value::Null)))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array);
    }

    decode_scalar_or_record(col, raw)
}

fn decode_scalar_or_record(col: &Column, raw: &Value) -> Result<Value, WarehouseError> {
    if raw.is_null() {
        return Ok(Value::Null);
    }

    match col.data_type.as_str() {
        "RECORD" | "STRUCT" => decode_record(col, raw),
        _ => {
            let text = raw.as_str().ok_or_else(|| {
                WarehouseError::Decode(format!(
                    "column {} ({}) expected a string cell, got {}",
                    col.name, col.data_type, raw
                ))
            })?;
            Ok(parse_scalar(text, &col.data_type))
        }
    }
}

fn decode_record(col: &Column, raw: &Value) -> Result<Value, WarehouseError> {
    let cells = raw
        .get("f")
        .and_then(Value::as_array)
        .ok_or_else(|| WarehouseError::Decode(format!("column {} is a RECORD without cells", col.name)))?;

    if cells.len() != col.fields.len() {
        return Err(WarehouseError::Decode(format!(
            "record {} has {} cells but {} sub-fields",
            col.name,
            cells.len(),
            col.fields.len()
        )));
    }

    let mut obj = Row::new();
    for (sub, cell) in col.fields.iter().zip(cells) {
        obj.insert(
            sub.name.clone(),
            decode_cell(sub, cell.get("v").unwrap_or(&Value::Null))?,
        );
    }
    Ok(Value::Object(obj))
}

/// Parse a scalar cell string according to its column type.
pub(crate) fn parse_scalar(value: &str, data_type: &str) -> Value {
    match data_type {
        "INTEGER" | "INT64" => value
            .parse::<i64>()
            .map(Value::from)
            .unwrap_or_else(|_| Value::String(value.to_string())),
        "FLOAT" | "FLOAT64" => value
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .unwrap_or_else(|| Value::String(value.to_string())),
        "NUMERIC" | "BIGNUMERIC" => parse_decimal(value),
        "BOOLEAN" | "BOOL" => match value.to_lowercase().as_str() {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            _ => Value::String(value.to_string()),
        },
        "TIMESTAMP" => parse_timestamp(value)
            .map(|ts| Value::String(ts.to_rfc3339_opts(SecondsFormat::AutoSi, false)))
            .unwrap_or_else(|| Value::String(value.to_string())),
        "JSON" => serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string())),
        _ => Value::String(value.to_string()),
    }
}

fn parse_decimal(value: &str) -> Value {
    if !value.contains(['.', 'e', 'E']) {
        if let Ok(i) = value.parse::<i64>() {
            return Value::from(i);
        }
        if let Ok(u) = value.parse::<u64>() {
            return Value::from(u);
        }
        // Integral but wider than 64 bits: keep every digit.
        return Value::String(value.to_string());
    }
    value
        .parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(value.to_string()))
}

/// Parse a TIMESTAMP cell.
///
/// Accepts integer microseconds since the epoch (`useInt64Timestamp`) and the
/// legacy floating-point seconds form (`"1.7E9"`).
pub(crate) fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(micros) = value.parse::<i64>() {
        return DateTime::from_timestamp_micros(micros);
    }

    let secs = value.parse::<f64>().ok()?;
    if !secs.is_finite() {
        return None;
    }
    DateTime::from_timestamp_micros((secs * 1_000_000.0).round() as i64)
}
