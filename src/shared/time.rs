//! Timestamp normalization to epoch milliseconds.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeDelta, Utc};
use serde_json::Value;

/// Values below this are treated as epoch seconds rather than milliseconds.
const SECONDS_THRESHOLD: i64 = 100_000_000_000;

/// Parse a timestamp string into epoch milliseconds.
///
/// Accepts epoch seconds or milliseconds, RFC 3339, `YYYY-MM-DD HH:MM:SS`
/// and bare dates (interpreted as UTC).
pub fn parse_timestamp_ms(text: &str) -> Option<i64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    if let Ok(n) = text.parse::<i64>() {
        return normalize_epoch(n);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.timestamp_millis());
    }

    ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(text, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
        .map(|naive| naive.and_utc().timestamp_millis())
}

/// Parse a JSON value (number or string) into epoch milliseconds.
pub fn value_to_ms(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().and_then(normalize_epoch),
        Value::String(s) => parse_timestamp_ms(s),
        _ => None,
    }
}

fn normalize_epoch(n: i64) -> Option<i64> {
    match n {
        n if n <= 0 => None,
        n if n < SECONDS_THRESHOLD => Some(n * 1000),
        n => Some(n),
    }
}

/// Parse a `--since` value: an absolute timestamp or a relative duration
/// such as `30m`, `12h`, `7d`, `2w` counted back from `now`.
pub fn parse_since(text: &str, now: DateTime<Utc>) -> Option<i64> {
    let text = text.trim();
    if let Some((amount, unit)) = split_relative(text) {
        return relative_delta(amount, unit)
            .and_then(|delta| now.checked_sub_signed(delta))
            .map(|dt| dt.timestamp_millis());
    }
    parse_timestamp_ms(text)
}

fn split_relative(text: &str) -> Option<(i64, char)> {
    let unit = text.chars().last().filter(|c| "smhdw".contains(*c))?;
    let amount = text[..text.len() - unit.len_utf8()].parse().ok()?;
    Some((amount, unit))
}

/// `None` when the amount does not fit in a `TimeDelta`.
fn relative_delta(amount: i64, unit: char) -> Option<TimeDelta> {
    match unit {
        's' => TimeDelta::try_seconds(amount),
        'm' => TimeDelta::try_minutes(amount),
        'h' => TimeDelta::try_hours(amount),
        'd' => TimeDelta::try_days(amount),
        'w' => TimeDelta::try_weeks(amount),
        _ => None,
    }
}

/// Render epoch milliseconds as `YYYY-MM-DD HH:MM` in UTC.
pub fn format_ms(ms: i64) -> String {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}
