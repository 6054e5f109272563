//! Loose value coercion for query arguments
//!
//! Query arguments travel untyped from the query string to the engine, so the
//! engine needs the same forgiving conversions a form-driven API would apply:
//! `"5"` is a number, `"1,2 3"` is an id list and `"false"` is false.

use serde_json::Value;

/// Integer value of an argument, truncating floats and parsing the leading
/// integer of a string (`"12abc"` → 12, `"abc"` → 0)
pub fn intval(value: &Value) -> i64 {
    match value {
        Value::Null => 0,
        Value::Bool(b) => i64::from(*b),
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64))
            .unwrap_or(0),
        Value::String(s) => leading_int(s),
        Value::Array(items) => i64::from(!items.is_empty()),
        Value::Object(map) => i64::from(!map.is_empty()),
    }
}

/// Absolute integer value of an argument
pub fn absint(value: &Value) -> u64 {
    intval(value).unsigned_abs()
}

fn leading_int(s: &str) -> i64 {
    let s = s.trim_start();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };

    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());

    let parsed = digits[..end].parse::<i64>().unwrap_or(0);
    if negative { -parsed } else { parsed }
}

/// Boolean reading of an argument
///
/// Strings are false when empty, `"0"` or `"false"` (any case).
pub fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => {
            let s = s.trim();
            !(s.is_empty() || s == "0" || s.eq_ignore_ascii_case("false"))
        }
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Scalar argument rendered as text, `None` for arrays, objects and null
pub fn as_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(if *b { "1".to_string() } else { String::new() }),
        _ => None,
    }
}

/// List of strings from an array or a comma/space separated string
pub fn string_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().filter_map(as_text).collect(),
        Value::Object(map) => map.values().filter_map(as_text).collect(),
        other => as_text(other)
            .map(|s| {
                s.split(|c: char| c == ',' || c.is_whitespace())
                    .filter(|part| !part.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
    }
}

/// Unique list of non-negative ids, keeping first-seen order
pub fn id_list(value: &Value) -> Vec<u64> {
    let mut ids = Vec::new();
    for item in string_list(value) {
        let id = absint(&Value::String(item));
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}
