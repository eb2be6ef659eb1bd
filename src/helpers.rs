//! Shared helpers for dates, file-name slugs and metric display.
//!
//! - `parse_iso_date`: accepts `YYYY-MM-DD` with an optional time suffix
//! - `place_slug`: file-name safe form of a place name
//! - `format_metric`: fixed-decimal rendering with an em-dash placeholder

use chrono::NaiveDate;

/// Placeholder shown for values that are missing or not finite.
pub const MISSING_VALUE: &str = "—";

/// Parse the date part of an ISO 8601 string.
///
/// Only the first 10 characters are considered, so full timestamps
/// (`2026-03-01T08:00:00Z`) resolve to their calendar date.
pub fn parse_iso_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    let head = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(head, "%Y-%m-%d").ok()
}

/// Lowercase a place name and collapse whitespace runs into `_`.
///
/// Returns `"location"` when no usable name is available.
pub fn place_slug(name: Option<&str>) -> String {
    let words: Vec<&str> = name.map(|n| n.split_whitespace().collect()).unwrap_or_default();
    if words.is_empty() {
        return "location".to_string();
    }
    words.join("_").to_lowercase()
}

/// Render a metric with `decimals` places, or the placeholder.
pub fn format_metric(value: Option<f64>, decimals: usize) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:.*}", decimals, v),
        _ => MISSING_VALUE.to_string(),
    }
}

/// Read a JSON cell as a finite number.
pub(crate) fn json_number(v: Option<&serde_json::Value>) -> Option<f64> {
    v.and_then(serde_json::Value::as_f64).filter(|n| n.is_finite())
}
