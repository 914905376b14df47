use super::probe::{is_falsy, kind_of};
use serde_json::{Map, Value};
use thiserror::Error;

/// Why a dot-path assignment was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("cannot descend into {kind} at `{at}`")]
    NotAnObject { at: String, kind: &'static str },
}

/// Assign `value` at the dot-separated `path` inside `source`.
///
/// A missing or empty path replaces the whole value. Intermediate keys that
/// are missing or falsy are replaced with `{}`. If any step lands on
/// something other than an object (arrays included), nothing is written and
/// `source` comes back unchanged.
///
/// ```
/// use optimist::deep::deep_set;
/// use serde_json::json;
///
/// assert_eq!(deep_set(Some("a.b"), json!({}), json!(5)), json!({"a": {"b": 5}}));
/// assert_eq!(deep_set(None, json!({"a": 1}), json!(5)), json!(5));
/// assert_eq!(deep_set(Some("a.b"), json!({"a": [1, 2]}), json!(5)), json!({"a": [1, 2]}));
/// ```
pub fn deep_set(path: Option<&str>, source: Value, value: Value) -> Value {
    let mut source = source;
    if let Err(err) = try_deep_set(path, &mut source, value) {
        tracing::trace!(path = path.unwrap_or_default(), %err, "deep set skipped");
    }
    source
}

/// Strict form of [`deep_set`]: reports why the assignment was refused.
///
/// `source` is only touched when the call succeeds.
pub fn try_deep_set(path: Option<&str>, source: &mut Value, value: Value) -> Result<(), PathError> {
    let path = match path {
        Some(path) if !path.is_empty() => path,
        _ => {
            *source = value;
            return Ok(());
        }
    };

    let segments: Vec<&str> = path.split('.').collect();
    let Some((last, parents)) = segments.split_last() else {
        *source = value;
        return Ok(());
    };

    // A refusal can only happen before the first write: every slot written
    // on the way down is a fresh object.
    let mut cursor = source;
    for (depth, segment) in parents.iter().enumerate() {
        let map = object_at(cursor, &segments[..depth])?;
        let slot = map.entry(segment.to_string()).or_insert(Value::Null);
        if is_falsy(slot) {
            *slot = Value::Object(Map::new());
        }
        cursor = slot;
    }

    object_at(cursor, parents)?.insert(last.to_string(), value);
    Ok(())
}

/// Look up the value at a dot-separated `path`, walking objects only.
///
/// A missing or empty path returns `source` itself.
pub fn deep_get<'a>(path: Option<&str>, source: &'a Value) -> Option<&'a Value> {
    let path = match path {
        Some(path) if !path.is_empty() => path,
        _ => return Some(source),
    };
    path.split('.')
        .try_fold(source, |cursor, segment| cursor.as_object()?.get(segment))
}

fn object_at<'a>(cursor: &'a mut Value, walked: &[&str]) -> Result<&'a mut Map<String, Value>, PathError> {
    match cursor {
        Value::Object(map) => Ok(map),
        other => Err(PathError::NotAnObject {
            at: walked.join("."),
            kind: kind_of(other),
        }),
    }
}
