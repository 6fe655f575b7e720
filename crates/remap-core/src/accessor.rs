//! Dotted-path value access over JSON trees
//!
//! This module resolves named values from heterogeneous sources (objects,
//! arrays) using `.`-separated traversal paths, and provides the write-side
//! counterpart that places a value at a path, creating intermediate objects
//! as needed. Missing intermediate nodes and missing terminal keys both
//! resolve to `None` rather than an error: required/null policy belongs to
//! the pipeline input stage, not here.

use crate::{Error, Result};
use serde_json::Value;

/// Sentinel source meaning "the entire object" rather than one attribute.
pub const SELF_SENTINEL: &str = "__self__";

/// The traversal separator used in paths.
pub const SEPARATOR: char = '.';

/// Split a path into segments, honoring `\.` as a literal separator.
pub fn split_path(path: &str) -> Vec<String> {
    let mut segments = Vec::new();
    let mut current = String::new();
    let mut chars = path.chars();
    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            SEPARATOR => {
                segments.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    segments.push(current);
    segments
}

/// Resolve a named value from a source tree.
///
/// Object segments look up keys; numeric segments index into arrays. Any
/// missing node along the way yields `None`.
pub fn resolve<'a>(source: &'a Value, path: &str) -> Option<&'a Value> {
    if path == SELF_SENTINEL {
        return Some(source);
    }
    let mut current = source;
    for segment in split_path(path) {
        current = match current {
            Value::Object(map) => map.get(&segment)?,
            Value::Array(items) => {
                let index: usize = segment.parse().ok()?;
                items.get(index)?
            }
            _ => return None,
        };
    }
    Some(current)
}

/// Check whether a path resolves to any value (including an explicit null).
pub fn exists(source: &Value, path: &str) -> bool {
    resolve(source, path).is_some()
}

/// Set a value at a path, creating intermediate objects along the way.
///
/// The root is coerced to an object if it is not one already; traversal
/// through an existing non-object intermediate is an error. Writing to the
/// self sentinel merges an object value into the root.
pub fn set(target: &mut Value, path: &str, value: Value) -> Result<()> {
    if path == SELF_SENTINEL {
        return merge_self(target, value, path);
    }

    if !target.is_object() {
        *target = Value::Object(serde_json::Map::new());
    }

    let segments = split_path(path);
    let last_index = segments.len() - 1;
    let mut current = target;

    for (i, segment) in segments.iter().enumerate() {
        let map = current.as_object_mut().ok_or_else(|| Error::Path {
            path: path.to_string(),
            message: format!("cannot traverse through non-object segment '{}'", segment),
        })?;
        if i == last_index {
            map.insert(segment.clone(), value);
            return Ok(());
        }
        current = map
            .entry(segment.clone())
            .or_insert_with(|| Value::Object(serde_json::Map::new()));
    }

    Ok(())
}

fn merge_self(target: &mut Value, value: Value, path: &str) -> Result<()> {
    if !target.is_object() {
        *target = Value::Object(serde_json::Map::new());
    }
    match value {
        Value::Object(incoming) => {
            let map = target.as_object_mut().ok_or_else(|| Error::Path {
                path: path.to_string(),
                message: "self-merge target is not an object".to_string(),
            })?;
            for (key, val) in incoming {
                map.insert(key, val);
            }
            Ok(())
        }
        Value::Null => Ok(()),
        other => Err(Error::Path {
            path: path.to_string(),
            message: format!("cannot merge non-object value into the whole object: {}", other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_resolve_simple_key() {
        let data = json!({"name": "mike"});
        assert_eq!(resolve(&data, "name"), Some(&json!("mike")));
    }

    #[test]
    fn test_resolve_dotted_path() {
        let data = json!({"user": {"contact": {"email": "mike@example.com"}}});
        assert_eq!(
            resolve(&data, "user.contact.email"),
            Some(&json!("mike@example.com"))
        );
    }

    #[test]
    fn test_resolve_array_index() {
        let data = json!({"tags": ["a", "b", "c"]});
        assert_eq!(resolve(&data, "tags.1"), Some(&json!("b")));
        assert_eq!(resolve(&data, "tags.9"), None);
    }

    #[test]
    fn test_resolve_missing_intermediate_is_none() {
        let data = json!({"user": {"name": "mike"}});
        assert_eq!(resolve(&data, "user.contact.email"), None);
        assert_eq!(resolve(&data, "missing"), None);
    }

    #[test]
    fn test_resolve_through_scalar_is_none() {
        let data = json!({"name": "mike"});
        assert_eq!(resolve(&data, "name.first"), None);
    }

    #[test]
    fn test_resolve_escaped_separator() {
        let data = json!({"a.b": 1, "a": {"b": 2}});
        assert_eq!(resolve(&data, "a\\.b"), Some(&json!(1)));
        assert_eq!(resolve(&data, "a.b"), Some(&json!(2)));
    }

    #[test]
    fn test_resolve_self_sentinel() {
        let data = json!({"id": 1});
        assert_eq!(resolve(&data, SELF_SENTINEL), Some(&data));
    }

    #[test]
    fn test_resolve_explicit_null_is_some() {
        let data = json!({"name": null});
        assert_eq!(resolve(&data, "name"), Some(&Value::Null));
        assert!(exists(&data, "name"));
        assert!(!exists(&data, "other"));
    }

    #[test]
    fn test_set_creates_intermediates() {
        let mut target = Value::Null;
        set(&mut target, "user.contact.email", json!("mike@example.com")).unwrap();
        assert_eq!(
            target,
            json!({"user": {"contact": {"email": "mike@example.com"}}})
        );
    }

    #[test]
    fn test_set_overwrites_existing() {
        let mut target = json!({"name": "old"});
        set(&mut target, "name", json!("new")).unwrap();
        assert_eq!(target, json!({"name": "new"}));
    }

    #[test]
    fn test_set_through_scalar_fails() {
        let mut target = json!({"name": "mike"});
        let err = set(&mut target, "name.first", json!("m")).unwrap_err();
        assert!(matches!(err, Error::Path { .. }));
    }

    #[test]
    fn test_set_self_merges_object() {
        let mut target = json!({"id": 1});
        set(&mut target, SELF_SENTINEL, json!({"name": "mike"})).unwrap();
        assert_eq!(target, json!({"id": 1, "name": "mike"}));
    }

    #[test]
    fn test_set_self_rejects_scalar() {
        let mut target = json!({});
        assert!(set(&mut target, SELF_SENTINEL, json!(42)).is_err());
    }
}
