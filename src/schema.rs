// src/schema.rs
//
// Persists and caches JSON Schema documents, and resolves `$ref` values
// both within a schema and across schemas in the registry via the
// `jsonlite:<type>` URI scheme.

use std::cell::RefCell;
use std::collections::HashMap;

use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;

use crate::error::{Error, Result};

/// One embedded schema document per known record type, compiled into the
/// binary so every container is self-describing from creation.
const BOOTSTRAP_SCHEMAS: &[&str] = &[
    include_str!("schema/bootstrap/process.json"),
    include_str!("schema/bootstrap/file.json"),
    include_str!("schema/bootstrap/directory.json"),
    include_str!("schema/bootstrap/windows-registry-key.json"),
    include_str!("schema/bootstrap/windows-registry-value.json"),
    include_str!("schema/bootstrap/artifact.json"),
];

/// Caches JSON Schema documents backed by the container's `_schemas` table.
pub struct SchemaRegistry {
    cache: RefCell<HashMap<String, Value>>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        SchemaRegistry {
            cache: RefCell::new(HashMap::new()),
        }
    }

    /// Loads the bootstrap schema bundle into `_schemas`. Called only when
    /// the container is new (state machine: `fresh` → `initialised`).
    pub fn bootstrap(&self, conn: &Connection) -> Result<()> {
        for raw in BOOTSTRAP_SCHEMAS {
            let schema: Value = serde_json::from_str(raw)?;
            let id = schema
                .get("$id")
                .and_then(Value::as_str)
                .ok_or_else(|| Error::SchemaError("bootstrap schema missing $id".into()))?
                .to_string();
            self.set(conn, &id, &schema)?;
        }
        Ok(())
    }

    /// Returns the schema registered under `name`, or an empty object if
    /// none is registered (permissive lookup, matching strict-mode-off
    /// behaviour for unknown types).
    pub fn get(&self, conn: &Connection, name: &str) -> Result<Value> {
        if let Some(schema) = self.cache.borrow().get(name) {
            return Ok(schema.clone());
        }

        let mut stmt = conn.prepare("SELECT schema FROM \"_schemas\" WHERE \"id\" = ?1")?;
        let raw: Option<String> = stmt
            .query_row(params![name], |row| row.get(0))
            .optional()?;

        let schema = match raw {
            Some(raw) => serde_json::from_str(&raw)?,
            None => Value::Object(serde_json::Map::new()),
        };
        self.cache
            .borrow_mut()
            .insert(name.to_string(), schema.clone());
        Ok(schema)
    }

    /// Registers or replaces the schema for `name`.
    pub fn set(&self, conn: &Connection, name: &str, schema: &Value) -> Result<()> {
        if self.cache.borrow().get(name) == Some(schema) {
            return Ok(());
        }
        conn.execute(
            "INSERT OR REPLACE INTO \"_schemas\" (\"id\", \"schema\") VALUES (?1, ?2)",
            params![name, serde_json::to_string(schema)?],
        )?;
        self.cache
            .borrow_mut()
            .insert(name.to_string(), schema.clone());
        Ok(())
    }

    /// Validates `item` (already carrying its discriminator) against the
    /// schema registered for `item_type`, resolving any `jsonlite:` and
    /// intra-schema fragment references first. Returns one human-readable
    /// error string per schema violation; an unknown type validates
    /// trivially (empty schema).
    pub fn validate(&self, conn: &Connection, item_type: &str, item: &Value) -> Result<Vec<String>> {
        let schema = self.get(conn, item_type)?;
        if schema.as_object().map(|m| m.is_empty()).unwrap_or(true) {
            return Ok(Vec::new());
        }

        let resolved = self.resolve_refs(conn, &schema, &schema)?;

        let validator = jsonschema::JSONSchema::compile(&resolved)
            .map_err(|e| Error::SchemaError(e.to_string()))?;

        let mut errors = Vec::new();
        if let Err(iter) = validator.validate(item) {
            for e in iter {
                errors.push(format!("Item could not be validated, {e}"));
            }
        }
        Ok(errors)
    }

    /// Recursively inlines `$ref` values. `jsonlite:<type>` refs are looked
    /// up in the registry; `#/a/b` refs are resolved as a JSON pointer
    /// against `root` (the document the ref appears in).
    fn resolve_refs(&self, conn: &Connection, root: &Value, node: &Value) -> Result<Value> {
        match node {
            Value::Object(map) => {
                if let Some(Value::String(reference)) = map.get("$ref") {
                    let resolved = if let Some(type_name) = reference.strip_prefix("jsonlite:") {
                        self.get(conn, type_name)?
                    } else {
                        resolve_fragment(root, reference)?
                    };
                    return self.resolve_refs(conn, root, &resolved);
                }
                let mut out = serde_json::Map::new();
                for (k, v) in map {
                    out.insert(k.clone(), self.resolve_refs(conn, root, v)?);
                }
                Ok(Value::Object(out))
            }
            Value::Array(items) => {
                let mut out = Vec::with_capacity(items.len());
                for item in items {
                    out.push(self.resolve_refs(conn, root, item)?);
                }
                Ok(Value::Array(out))
            }
            other => Ok(other.clone()),
        }
    }
}

impl Default for SchemaRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Resolves a `#/a/b~1c` style JSON pointer fragment against `document`,
/// unescaping `~1` → `/` and `~0` → `~` per segment.
fn resolve_fragment(document: &Value, reference: &str) -> Result<Value> {
    let fragment = reference.trim_start_matches('#').trim_start_matches('/');
    let mut current = document;
    if fragment.is_empty() {
        return Ok(current.clone());
    }
    for raw_segment in fragment.split('/') {
        let segment = raw_segment.replace("~1", "/").replace("~0", "~");
        current = match current {
            Value::Object(map) => map.get(&segment).ok_or_else(|| {
                Error::SchemaError(format!("unresolvable JSON pointer: {reference}"))
            })?,
            Value::Array(items) => {
                let idx: usize = segment
                    .parse()
                    .map_err(|_| Error::SchemaError(format!("unresolvable JSON pointer: {reference}")))?;
                items.get(idx).ok_or_else(|| {
                    Error::SchemaError(format!("unresolvable JSON pointer: {reference}"))
                })?
            }
            _ => {
                return Err(Error::SchemaError(format!(
                    "unresolvable JSON pointer: {reference}"
                )))
            }
        };
    }
    Ok(current.clone())
}
