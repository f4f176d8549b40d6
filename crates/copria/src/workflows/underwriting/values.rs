//! Loose coercions shared by the normalizer and the rule evaluator.
//!
//! Submission values arrive as whatever JSON the upstream produced, so these helpers
//! never fail: unusable input degrades to an empty string, `false`, or `None`.

use serde_json::Value;

/// Text form of a value. Strings are returned verbatim, `null` as empty.
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Whether a field already carries a usable value.
///
/// Empty strings, `null`, `false`, zero and empty containers all count as unset.
pub(crate) fn is_set(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(flag)) => *flag,
        Some(Value::Number(number)) => number.as_f64().map(|n| n != 0.0).unwrap_or(true),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(entries)) => !entries.is_empty(),
    }
}

/// Numeric reading of a value: numbers, numeric strings and booleans.
pub(crate) fn as_number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        Value::Bool(flag) => Some(if *flag { 1.0 } else { 0.0 }),
        Value::Null | Value::Array(_) | Value::Object(_) => None,
    }
}

/// Whole-number reading used for years; fractional input is truncated.
pub(crate) fn as_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number
            .as_i64()
            .or_else(|| number.as_f64().map(|n| n.trunc() as i64)),
        Value::String(text) => text.trim().parse::<i64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_rendering() {
        assert_eq!(value_text(&json!("Frame")), "Frame");
        assert_eq!(value_text(&json!(150000)), "150000");
        assert_eq!(value_text(&Value::Null), "");
    }

    #[test]
    fn unset_values() {
        assert!(!is_set(None));
        assert!(!is_set(Some(&json!(""))));
        assert!(!is_set(Some(&json!(0))));
        assert!(!is_set(Some(&json!({}))));
        assert!(is_set(Some(&json!("No"))));
        assert!(is_set(Some(&json!(3))));
    }

    #[test]
    fn numeric_coercion() {
        assert_eq!(as_number(&json!(" 2.5 ")), Some(2.5));
        assert_eq!(as_number(&json!("two")), None);
        assert_eq!(as_integer(&json!("1998")), Some(1998));
        assert_eq!(as_integer(&json!(1998.7)), Some(1998));
        assert_eq!(as_integer(&json!("19x8")), None);
    }
}
