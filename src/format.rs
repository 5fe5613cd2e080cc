//! Rendering document values as SQL literals

use crate::dialect::Dialect;
use crate::types::Value;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::{Map, Number};

/// Columns with this suffix hold epoch seconds under sqlite
const EPOCH_COLUMN_SUFFIX: &str = "_at";

/// Render a value (or its absence) as a literal for `column`
pub fn format_value(dialect: Dialect, value: Option<&Value>, column: &str) -> String {
    let Some(value) = value else {
        return "NULL".to_string();
    };

    match value {
        Value::Null => "NULL".to_string(),
        Value::Bool(b) => format_bool(dialect, *b).to_string(),
        Value::Int(n) => n.to_string(),
        Value::Float(f) if f.is_finite() => f.to_string(),
        Value::Float(_) => "NULL".to_string(),
        Value::Instant(t) => {
            if dialect == Dialect::Sqlite && column.ends_with(EPOCH_COLUMN_SUFFIX) {
                t.timestamp().to_string()
            } else {
                quote_text(&iso8601(t))
            }
        }
        Value::Array(_) | Value::Document(_) => quote_text(&to_json(value).to_string()),
        Value::Text(s) => quote_text(s),
    }
}

fn format_bool(dialect: Dialect, b: bool) -> &'static str {
    match (dialect, b) {
        (Dialect::Sqlite, true) => "1",
        (Dialect::Sqlite, false) => "0",
        (_, true) => "TRUE",
        (_, false) => "FALSE",
    }
}

/// Wrap text in single quotes, doubling any embedded quote
pub fn quote_text(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

/// ISO-8601 with millisecond precision and a `Z` suffix
pub fn iso8601(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Convert a value tree to JSON, keeping subdocument field order
pub fn to_json(value: &Value) -> serde_json::Value {
    match value {
        Value::Null => serde_json::Value::Null,
        Value::Bool(b) => serde_json::Value::Bool(*b),
        Value::Int(n) => serde_json::Value::Number((*n).into()),
        Value::Float(f) => Number::from_f64(*f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Value::Text(s) => serde_json::Value::String(s.clone()),
        Value::Instant(t) => serde_json::Value::String(iso8601(t)),
        Value::Array(items) => serde_json::Value::Array(items.iter().map(to_json).collect()),
        Value::Document(doc) => {
            let map: Map<String, serde_json::Value> = doc
                .iter()
                .map(|(key, v)| (key.clone(), to_json(v)))
                .collect();
            serde_json::Value::Object(map)
        }
    }
}
