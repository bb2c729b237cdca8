//! Helpers for picking values out of loosely-typed venue JSON

use chrono::{TimeZone, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use std::str::FromStr;
use vrsi_core::{Candle, Timestamp};

/// Decimal from a JSON string or number; empty strings are `None`
pub(crate) fn decimal(value: &Value) -> Option<Decimal> {
    match value {
        Value::String(s) => parse_decimal(s),
        Value::Number(n) => parse_decimal(&n.to_string()),
        _ => None,
    }
}

fn parse_decimal(s: &str) -> Option<Decimal> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    Decimal::from_str(s)
        .or_else(|_| Decimal::from_scientific(s))
        .ok()
}

/// Integer from a JSON number or numeric string
pub(crate) fn integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn millis(value: &Value) -> Option<Timestamp> {
    Utc.timestamp_millis_opt(integer(value)?).single()
}

pub(crate) fn seconds(value: &Value) -> Option<Timestamp> {
    Utc.timestamp_opt(integer(value)?, 0).single()
}

/// Candle from a positional row: `[open_time_ms, open, high, low, close, volume, ...]`
pub(crate) fn candle_row(row: &Value) -> Option<Candle> {
    let row = row.as_array()?;
    if row.len() < 6 {
        return None;
    }
    Some(Candle::new(
        millis(&row[0])?,
        decimal(&row[1])?,
        decimal(&row[2])?,
        decimal(&row[3])?,
        decimal(&row[4])?,
        decimal(&row[5])?,
    ))
}

/// Parse every row of a positional kline array; malformed rows are skipped
pub(crate) fn candle_rows(rows: &Value) -> Option<Vec<Candle>> {
    Some(rows.as_array()?.iter().filter_map(candle_row).collect())
}

/// String field of an object
pub(crate) fn str_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key)?.as_str()
}
