use super::probe::is_composite;
use serde_json::{Map, Value};

/// Recursively overlay `target` onto `source`.
///
/// Composite values in `target` (objects and arrays alike) are merged into
/// the matching slot of `source`, starting from `{}` when that slot is missing
/// or `null`. Every other value overwrites the slot, `null` included. When
/// either side is not an object or array, `source` is returned untouched.
///
/// Arrays are not special-cased: they merge index by index, and an array
/// merged into an empty slot lands as an object keyed `"0"`, `"1"`, ...
///
/// ```
/// use optimist::deep::deep_merge;
/// use serde_json::json;
///
/// let merged = deep_merge(json!({"a": {"x": 1}}), &json!({"a": {"y": 2}}));
/// assert_eq!(merged, json!({"a": {"x": 1, "y": 2}}));
/// ```
pub fn deep_merge(source: Value, target: &Value) -> Value {
    if !is_composite(&source) || !is_composite(target) {
        return source;
    }

    let mut source = source;
    for (key, incoming) in entries(target) {
        if is_composite(incoming) {
            let existing = take_slot(&mut source, &key)
                .filter(|v| !v.is_null())
                .unwrap_or_else(|| Value::Object(Map::new()));
            put_slot(&mut source, &key, deep_merge(existing, incoming));
        } else {
            put_slot(&mut source, &key, incoming.clone());
        }
    }
    source
}

fn entries(value: &Value) -> Vec<(String, &Value)> {
    match value {
        Value::Object(map) => map.iter().map(|(k, v)| (k.clone(), v)).collect(),
        Value::Array(items) => items
            .iter()
            .enumerate()
            .map(|(i, v)| (i.to_string(), v))
            .collect(),
        _ => Vec::new(),
    }
}

fn take_slot(value: &mut Value, key: &str) -> Option<Value> {
    match value {
        Value::Object(map) => map.get_mut(key).map(Value::take),
        Value::Array(items) => key
            .parse::<usize>()
            .ok()
            .and_then(|i| items.get_mut(i))
            .map(Value::take),
        _ => None,
    }
}

fn put_slot(value: &mut Value, key: &str, slot: Value) {
    match value {
        Value::Object(map) => {
            map.insert(key.to_string(), slot);
        }
        Value::Array(items) => {
            // Non-index keys have no JSON representation on an array.
            let Ok(index) = key.parse::<usize>() else {
                return;
            };
            if index >= items.len() {
                items.resize(index + 1, Value::Null);
            }
            items[index] = slot;
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn merges_disjoint_keys() {
        assert_eq!(deep_merge(json!({"a": 1}), &json!({"b": 2})), json!({"a": 1, "b": 2}));
    }

    #[test]
    fn merges_nested_objects() {
        let merged = deep_merge(json!({"a": {"x": 1}}), &json!({"a": {"y": 2}}));
        assert_eq!(merged, json!({"a": {"x": 1, "y": 2}}));
    }

    #[test]
    fn null_overwrites() {
        let merged = deep_merge(json!({"a": {"x": 1}}), &json!({"a": null}));
        assert_eq!(merged, json!({"a": null}));
    }

    #[test]
    fn non_composite_short_circuits() {
        assert_eq!(deep_merge(json!(5), &json!({"a": 1})), json!(5));
        assert_eq!(deep_merge(json!({"a": 1}), &json!("x")), json!({"a": 1}));
        assert_eq!(deep_merge(Value::Null, &json!({"a": 1})), Value::Null);
    }

    #[test]
    fn arrays_merge_by_index() {
        let merged = deep_merge(json!({"list": [1, 2, 3]}), &json!({"list": [9]}));
        assert_eq!(merged, json!({"list": [9, 2, 3]}));
    }

    #[test]
    fn array_into_missing_slot_becomes_object() {
        let merged = deep_merge(json!({}), &json!({"list": [1, 2]}));
        assert_eq!(merged, json!({"list": {"0": 1, "1": 2}}));
    }

    #[test]
    fn primitive_slot_survives_composite_target() {
        let merged = deep_merge(json!({"a": 3}), &json!({"a": {"b": 1}}));
        assert_eq!(merged, json!({"a": 3}));
    }

    #[test]
    fn null_slot_is_replaced_by_merge() {
        let merged = deep_merge(json!({"a": null}), &json!({"a": {"b": 1}}));
        assert_eq!(merged, json!({"a": {"b": 1}}));
    }

    #[test]
    fn array_source_extends_with_nulls() {
        let merged = deep_merge(json!([1]), &json!({"2": "c", "name": "dropped"}));
        assert_eq!(merged, json!([1, null, "c"]));
    }
}
