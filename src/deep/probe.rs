//! Best-effort type probes used by the deep utilities and the store.

use serde::de::IgnoredAny;
use serde_json::Value;

/// Whether `text` parses as JSON.
pub fn is_json(text: &str) -> bool {
    serde_json::from_str::<IgnoredAny>(text).is_ok()
}

/// Whether `value` is a JSON object.
pub fn is_object(value: &Value) -> bool {
    value.is_object()
}

/// Whether `value` is a JSON array.
pub fn is_array(value: &Value) -> bool {
    value.is_array()
}

/// Whether `value` is a JSON string.
pub fn is_string(value: &Value) -> bool {
    value.is_string()
}

/// Objects and arrays: the values the deep utilities walk into.
pub fn is_composite(value: &Value) -> bool {
    matches!(value, Value::Object(_) | Value::Array(_))
}

/// JavaScript-style falsiness of a JSON value.
pub(crate) fn is_falsy(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f == 0.0),
        Value::String(s) => s.is_empty(),
        Value::Array(_) | Value::Object(_) => false,
    }
}

pub(crate) fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn json_probe() {
        assert!(is_json(r#"{"a": [1, 2]}"#));
        assert!(is_json("3"));
        assert!(!is_json("{a: 1}"));
        assert!(!is_json(""));
    }

    #[test]
    fn shape_probes() {
        assert!(is_object(&json!({})));
        assert!(!is_object(&json!([])));
        assert!(is_array(&json!([])));
        assert!(is_string(&json!("x")));
        assert!(is_composite(&json!([1])));
        assert!(!is_composite(&Value::Null));
    }

    #[test]
    fn falsy_values() {
        for v in [json!(null), json!(false), json!(0), json!(0.0), json!("")] {
            assert!(is_falsy(&v), "{v} should be falsy");
        }
        for v in [json!(true), json!(1), json!("0"), json!([]), json!({})] {
            assert!(!is_falsy(&v), "{v} should be truthy");
        }
    }
}
