// src/flatten.rs
//
// Bidirectional mapping between nested JSON records and dotted-key flat
// maps, the shape the Record Index stores as SQL rows.

use serde_json::{Map, Value};

/// A flat map of dotted keys to scalar/array-leaf JSON values, ready to bind
/// as SQL columns.
pub type FlatMap = Map<String, Value>;

/// Drops null-valued fields and empty-list fields from a record, the
/// erasure step that precedes flattening.
pub fn strip_empty(item: &Map<String, Value>) -> Map<String, Value> {
    item.iter()
        .filter(|(_, v)| !matches!(v, Value::Null) && !matches!(v, Value::Array(a) if a.is_empty()))
        .map(|(k, v)| (k.clone(), v.clone()))
        .collect()
}

/// Flattens a (already-stripped) record into dotted-key form. List indices
/// participate as decimal path segments. Keys whose value becomes an empty
/// list after recursion are dropped.
pub fn flatten(item: &Map<String, Value>) -> FlatMap {
    let mut out = FlatMap::new();
    for (key, value) in item {
        flatten_value(key.clone(), value, &mut out);
    }
    out
}

fn flatten_value(prefix: String, value: &Value, out: &mut FlatMap) {
    match value {
        Value::Object(map) => {
            if map.is_empty() {
                // Dropped, not stored — matches the empty-list erasure rule.
                return;
            }
            for (key, child) in map {
                flatten_value(format!("{prefix}.{key}"), child, out);
            }
        }
        Value::Array(items) => {
            if items.is_empty() {
                // Dropped, not stored.
                return;
            }
            for (idx, child) in items.iter().enumerate() {
                flatten_value(format!("{prefix}.{idx}"), child, out);
            }
        }
        other => {
            out.insert(prefix, other.clone());
        }
    }
}

/// Reconstructs a nested record from a flat, dotted-key map. Purely numeric
/// path segments are treated as list indices; a parent collects contiguous
/// numeric children into a `Vec`, non-numeric children into an object.
pub fn unflatten(flat: &Map<String, Value>) -> Map<String, Value> {
    let mut root = Value::Object(Map::new());
    for (key, value) in flat {
        let segments: Vec<&str> = key.split('.').collect();
        insert_path(&mut root, &segments, value.clone());
    }
    match root {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn insert_path(node: &mut Value, segments: &[&str], value: Value) {
    if segments.is_empty() {
        *node = value;
        return;
    }

    let (head, rest) = (segments[0], &segments[1..]);

    if let Ok(index) = head.parse::<usize>() {
        if !node.is_array() {
            *node = Value::Array(Vec::new());
        }
        let arr = node.as_array_mut().expect("just coerced to array");
        if arr.len() <= index {
            arr.resize(index + 1, Value::Null);
        }
        insert_path(&mut arr[index], rest, value);
    } else {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        let map = node.as_object_mut().expect("just coerced to object");
        let child = map.entry(head.to_string()).or_insert(Value::Null);
        insert_path(child, rest, value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn flattens_nested_list_and_object() {
        let item = json!({
            "name": "iptables",
            "arguments": ["-L", "-n", "-v"],
            "origin": {"path": "/sbin"},
        });
        let flat = flatten(item.as_object().unwrap());
        assert_eq!(flat.get("name"), Some(&json!("iptables")));
        assert_eq!(flat.get("arguments.0"), Some(&json!("-L")));
        assert_eq!(flat.get("arguments.2"), Some(&json!("-v")));
        assert_eq!(flat.get("origin.path"), Some(&json!("/sbin")));
    }

    #[test]
    fn empty_list_and_null_are_dropped() {
        let item = json!({"type": "foo", "list": [], "note": null});
        let stripped = strip_empty(item.as_object().unwrap());
        let flat = flatten(&stripped);
        assert_eq!(flat.len(), 1);
        assert_eq!(flat.get("type"), Some(&json!("foo")));
    }

    #[test]
    fn empty_object_is_dropped_like_empty_list() {
        let item = json!({"type": "foo", "hashes": {}});
        let flat = flatten(item.as_object().unwrap());
        assert_eq!(flat.len(), 1);
        assert_eq!(flat.get("type"), Some(&json!("foo")));
        assert_eq!(flat.get("hashes"), None);
    }

    #[test]
    fn roundtrips_through_flatten_and_unflatten() {
        let item = json!({
            "name": "iptables",
            "arguments": ["-L", "-n", "-v"],
            "origin": {"path": "/sbin", "nested": {"deep": 1}},
        });
        let flat = flatten(item.as_object().unwrap());
        let restored = unflatten(&flat);
        assert_eq!(Value::Object(restored), item);
    }
}
