//! Aliased field extraction over loosely-typed API payloads.
//!
//! The Yunxiao API names the same field differently across endpoints
//! (`comment_biz_id`, `commentBizId`, `id`, ...). Each extractor takes an
//! ordered list of candidate keys and returns the first value that matches
//! the requested type. A dotted key such as `author.name` descends into
//! nested objects.

use serde_json::Value;

/// Look up a single (possibly dotted) key.
fn lookup<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let mut current = value;
    for segment in key.split('.') {
        current = current.as_object()?.get(segment)?;
    }
    Some(current)
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn as_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => n.as_i64().map(|i| i != 0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

/// First non-empty string (numbers are stringified, e.g. numeric IDs).
pub fn first_str(value: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| lookup(value, key))
        .find_map(as_string)
}

/// First integer, accepting JSON numbers and numeric strings.
pub fn first_i64(value: &Value, keys: &[&str]) -> Option<i64> {
    keys.iter()
        .filter_map(|key| lookup(value, key))
        .find_map(as_i64)
}

/// First boolean, accepting bools, `"true"`/`"false"` strings and 0/1.
pub fn first_bool(value: &Value, keys: &[&str]) -> Option<bool> {
    keys.iter()
        .filter_map(|key| lookup(value, key))
        .find_map(as_bool)
}

/// First array value.
pub fn first_array<'a>(value: &'a Value, keys: &[&str]) -> Option<&'a Vec<Value>> {
    keys.iter()
        .filter_map(|key| lookup(value, key))
        .find_map(Value::as_array)
}

/// Unwrap a list payload that may be a bare array or an object wrapping one.
pub fn list_items(value: Value) -> Vec<Value> {
    const WRAPPERS: &[&str] = &["result", "data", "items", "list", "records"];

    match value {
        Value::Array(items) => items,
        Value::Object(mut map) => {
            for key in WRAPPERS {
                match map.remove(*key) {
                    Some(Value::Array(items)) => return items,
                    Some(nested @ Value::Object(_)) => return list_items(nested),
                    _ => {}
                }
            }
            Vec::new()
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[rstest]
    #[case::first_key(json!({"a": "x", "b": "y"}), "x")]
    #[case::skips_missing(json!({"b": "y"}), "y")]
    #[case::skips_empty(json!({"a": "  ", "b": "y"}), "y")]
    #[case::stringifies_numbers(json!({"a": 42}), "42")]
    #[case::nested(json!({"c": {"d": "deep"}}), "deep")]
    fn test_first_str(#[case] value: Value, #[case] expected: &str) {
        assert_eq!(
            first_str(&value, &["a", "b", "c.d"]).as_deref(),
            Some(expected)
        );
    }

    #[test]
    fn test_first_str_none_when_no_match() {
        assert_eq!(first_str(&json!({"a": null, "b": []}), &["a", "b"]), None);
    }

    #[rstest]
    #[case::number(json!({"v": 3}), Some(3))]
    #[case::string(json!({"v": " 7 "}), Some(7))]
    #[case::float(json!({"v": 2.9}), Some(2))]
    #[case::garbage(json!({"v": "abc"}), None)]
    fn test_first_i64(#[case] value: Value, #[case] expected: Option<i64>) {
        assert_eq!(first_i64(&value, &["v"]), expected);
    }

    #[rstest]
    #[case::bool(json!({"v": true}), Some(true))]
    #[case::string(json!({"v": "false"}), Some(false))]
    #[case::number(json!({"v": 1}), Some(true))]
    #[case::other(json!({"v": "maybe"}), None)]
    fn test_first_bool(#[case] value: Value, #[case] expected: Option<bool>) {
        assert_eq!(first_bool(&value, &["v"]), expected);
    }

    #[rstest]
    #[case::bare_array(json!([1, 2]), 2)]
    #[case::wrapped(json!({"result": [1, 2, 3]}), 3)]
    #[case::double_wrapped(json!({"data": {"list": [1]}}), 1)]
    #[case::unknown_shape(json!({"foo": [1]}), 0)]
    #[case::scalar(json!("x"), 0)]
    fn test_list_items(#[case] value: Value, #[case] expected_len: usize) {
        assert_eq!(list_items(value).len(), expected_len);
    }
}
