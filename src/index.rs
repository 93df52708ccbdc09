// src/index.rs
//
// Binds dynamic schema evolution to a relational backend: one SQLite table
// per record type, columns created lazily, types inferred and never
// changed. Mirrors `_ensure_table`/`insert`/`get`/`update`/`select`/`all`
// from the original JSONLite implementation.

use std::cell::RefCell;
use std::collections::HashMap;

use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::flatten::{flatten, strip_empty, unflatten};
use crate::schema::SchemaRegistry;

/// SQL type inferred for a newly created column: integral values and
/// booleans get `INTEGER` (booleans bind as 0/1, matching the Python
/// source's `isinstance(bool, int)` coercion), everything else gets `TEXT`.
/// Once chosen, a column's type is never renamed.
fn sql_type_for(value: &Value) -> &'static str {
    match value {
        Value::Bool(_) => "INTEGER",
        Value::Number(n) if n.is_i64() || n.is_u64() => "INTEGER",
        _ => "TEXT",
    }
}

type Catalog = HashMap<String, HashMap<String, String>>;

/// The relational record index: one table per discriminator value, plus the
/// `_options` and `_schemas` bookkeeping tables.
pub struct RecordIndex {
    conn: Connection,
    options: RefCell<HashMap<String, String>>,
    tables: RefCell<Catalog>,
    pub schemas: SchemaRegistry,
}

impl RecordIndex {
    /// Opens an index over an already-connected SQLite database. `is_new`
    /// indicates the `fresh` → `initialised` transition: the options and
    /// schemas tables are created and the bootstrap schema bundle loaded.
    pub fn open(conn: Connection, is_new: bool, discriminator: &str) -> Result<Self> {
        let index = RecordIndex {
            conn,
            options: RefCell::new(HashMap::new()),
            tables: RefCell::new(HashMap::new()),
            schemas: SchemaRegistry::new(),
        };

        if is_new {
            index.conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS \"_options\" (key TEXT PRIMARY KEY, value TEXT);
                 CREATE TABLE IF NOT EXISTS \"_schemas\" (id TEXT PRIMARY KEY, schema TEXT);",
            )?;
            index.set_option("strict", "true")?;
            index.set_option("discriminator", discriminator)?;
            index.schemas.bootstrap(&index.conn)?;
        }

        *index.tables.borrow_mut() = index.load_catalog()?;
        Ok(index)
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    pub fn commit_and_close(self) -> Result<()> {
        // rusqlite auto-commits outside explicit transactions; closing the
        // connection is enough to flush the WAL.
        self.conn.close().map_err(|(_, e)| Error::Database(e))
    }

    // -- options -----------------------------------------------------

    pub fn discriminator(&self) -> Result<String> {
        self.option("discriminator")?
            .ok_or_else(|| Error::SchemaError("container has no discriminator option set".into()))
    }

    pub fn strict(&self) -> Result<bool> {
        Ok(self.option("strict")?.as_deref() == Some("true"))
    }

    pub fn option(&self, key: &str) -> Result<Option<String>> {
        if let Some(value) = self.options.borrow().get(key) {
            return Ok(Some(value.clone()));
        }
        let mut stmt = self
            .conn
            .prepare("SELECT value FROM \"_options\" WHERE \"key\" = ?1")?;
        let value: Option<String> = stmt.query_row(params![key], |row| row.get(0)).optional()?;
        if let Some(v) = &value {
            self.options.borrow_mut().insert(key.to_string(), v.clone());
        }
        Ok(value)
    }

    pub fn set_option(&self, key: &str, value: &str) -> Result<()> {
        if self.options.borrow().get(key).map(String::as_str) == Some(value) {
            return Ok(());
        }
        self.conn.execute(
            "INSERT OR REPLACE INTO \"_options\" (\"key\", \"value\") VALUES (?1, ?2)",
            params![key, value],
        )?;
        self.options
            .borrow_mut()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    // -- catalog -------------------------------------------------------

    fn load_catalog(&self) -> Result<Catalog> {
        let mut catalog = Catalog::new();
        let mut stmt = self.conn.prepare("SELECT name FROM sqlite_master WHERE type='table'")?;
        let table_names: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<_>>()?;

        for table in table_names {
            let mut cols = HashMap::new();
            let mut info_stmt = self
                .conn
                .prepare(&format!("PRAGMA table_info(\"{table}\")"))?;
            let rows = info_stmt.query_map([], |row| {
                Ok((row.get::<_, String>(1)?, row.get::<_, String>(2)?))
            })?;
            for row in rows {
                let (name, ty) = row?;
                cols.insert(name, ty);
            }
            catalog.insert(table, cols);
        }
        Ok(catalog)
    }

    /// Creates `table` or adds any columns `flat_item` needs that it doesn't
    /// already have, validating against the schema first whenever such a
    /// structural change is about to happen. Returns whether validation ran,
    /// so callers that also want a strict-mode check can skip a redundant
    /// second pass when no schema-affecting change occurred.
    fn ensure_table(&self, table: &str, flat_item: &Map<String, Value>, item: &Value) -> Result<bool> {
        let exists = self.tables.borrow().contains_key(table);
        if !exists {
            let errors = self.schemas.validate(&self.conn, table, item)?;
            if !errors.is_empty() {
                return Err(Error::ValidationError(errors));
            }
            self.create_table(table, flat_item)?;
            return Ok(true);
        }

        let missing: Vec<String> = {
            let tables = self.tables.borrow();
            let known = &tables[table];
            flat_item
                .keys()
                .filter(|k| !known.contains_key(k.as_str()))
                .cloned()
                .collect()
        };
        if !missing.is_empty() {
            let errors = self.schemas.validate(&self.conn, table, item)?;
            if !errors.is_empty() {
                return Err(Error::ValidationError(errors));
            }
            self.add_missing_columns(table, flat_item, &missing)?;
            return Ok(true);
        }
        Ok(false)
    }

    fn create_table(&self, table: &str, flat_item: &Map<String, Value>) -> Result<()> {
        let discriminator = self.discriminator()?;
        let mut columns_sql = format!("uid TEXT PRIMARY KEY, \"{discriminator}\" TEXT NOT NULL");
        let mut cols = HashMap::new();
        cols.insert("uid".to_string(), "TEXT".to_string());
        cols.insert(discriminator.clone(), "TEXT".to_string());

        for (key, value) in flat_item {
            if key == &discriminator || key == "uid" {
                continue;
            }
            let sql_type = sql_type_for(value);
            cols.insert(key.clone(), sql_type.to_string());
            columns_sql.push_str(&format!(", \"{key}\" {sql_type}"));
        }

        self.conn.execute(
            &format!("CREATE TABLE IF NOT EXISTS \"{table}\" ({columns_sql})"),
            [],
        )?;
        self.tables.borrow_mut().insert(table.to_string(), cols);
        Ok(())
    }

    fn add_missing_columns(
        &self,
        table: &str,
        flat_item: &Map<String, Value>,
        missing: &[String],
    ) -> Result<()> {
        for column in missing {
            let sql_type = sql_type_for(&flat_item[column]);
            self.conn.execute(
                &format!("ALTER TABLE \"{table}\" ADD COLUMN \"{column}\" {sql_type}"),
                [],
            )?;
            self.tables
                .borrow_mut()
                .get_mut(table)
                .expect("table already in catalog")
                .insert(column.clone(), sql_type.to_string());
        }
        Ok(())
    }

    // -- row <-> record --------------------------------------------------

    fn row_to_item(row: &Row) -> rusqlite::Result<Map<String, Value>> {
        let mut flat = Map::new();
        for (idx, column) in row.as_ref().column_names().iter().enumerate() {
            let value: rusqlite::types::Value = row.get(idx)?;
            let json = match value {
                rusqlite::types::Value::Null => continue,
                rusqlite::types::Value::Integer(i) => Value::from(i),
                rusqlite::types::Value::Real(f) => Value::from(f),
                rusqlite::types::Value::Text(s) => Value::from(s),
                rusqlite::types::Value::Blob(b) => {
                    Value::from(String::from_utf8_lossy(&b).to_string())
                }
            };
            flat.insert(column.to_string(), json);
        }
        Ok(flat)
    }

    // -- operations --------------------------------------------------

    /// insert(record) -> uid. See module docs for the numbered contract.
    pub fn insert(&self, mut item: Map<String, Value>) -> Result<String> {
        let discriminator = self.discriminator()?;
        let item_type = item
            .get(&discriminator)
            .and_then(Value::as_str)
            .ok_or(Error::MissingDiscriminator)?
            .to_string();

        if !item.contains_key("uid") {
            item.insert(
                "uid".to_string(),
                Value::from(format!("{item_type}--{}", Uuid::new_v4())),
            );
        }

        let stripped = strip_empty(&item);
        let flat = flatten(&stripped);

        let validated = self.ensure_table(&item_type, &flat, &Value::Object(stripped.clone()))?;

        if !validated && self.strict()? {
            let errors = self.schemas.validate(&self.conn, &item_type, &Value::Object(stripped.clone()))?;
            if !errors.is_empty() {
                return Err(Error::ValidationError(errors));
            }
        }

        let columns: Vec<&String> = flat.keys().collect();
        let placeholders = vec!["?"; columns.len()].join(", ");
        let column_list = columns
            .iter()
            .map(|c| format!("\"{c}\""))
            .collect::<Vec<_>>()
            .join(", ");
        let values: Vec<&Value> = columns.iter().map(|c| &flat[*c]).collect();

        let query = format!(
            "INSERT INTO \"{item_type}\" ({column_list}) VALUES ({placeholders})"
        );
        tracing::debug!(%query, "insert query");
        self.conn.execute(
            &query,
            params_from_iter(values.iter().map(|v| value_to_sql(v))),
        )?;

        Ok(stripped["uid"].as_str().unwrap().to_string())
    }

    /// get(uid) -> record.
    pub fn get(&self, uid: &str) -> Result<Map<String, Value>> {
        let (table, _, _) = split_uid(uid);
        let query = format!("SELECT * FROM \"{table}\" WHERE uid = ?1");
        let mut stmt = self
            .conn
            .prepare(&query)
            .map_err(|_| Error::NotFound(uid.to_string()))?;
        let flat = stmt
            .query_row(params![uid], Self::row_to_item)
            .optional()?
            .ok_or_else(|| Error::NotFound(uid.to_string()))?;
        Ok(unflatten(&flat))
    }

    /// update(uid, partial) -> uid.
    pub fn update(&self, uid: &str, partial: Map<String, Value>) -> Result<String> {
        let discriminator = self.discriminator()?;
        let mut current = self.get(uid)?;
        let old_type = current
            .get(&discriminator)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();

        for (k, v) in &partial {
            current.insert(k.clone(), v.clone());
        }

        let (_, _, item_uuid) = split_uid(uid);

        if let Some(new_type) = partial.get(&discriminator).and_then(Value::as_str) {
            if new_type != old_type {
                current.insert(
                    "uid".to_string(),
                    Value::from(format!("{new_type}--{item_uuid}")),
                );
                self.conn
                    .execute(&format!("DELETE FROM \"{old_type}\" WHERE uid = ?1"), params![uid])?;
                return self.insert(current);
            }
        }

        let stripped_partial = strip_empty(&partial);
        let flat_partial = flatten(&stripped_partial);
        let stripped_full = strip_empty(&current);
        let flat_full = flatten(&stripped_full);

        let validated = self.ensure_table(&old_type, &flat_full, &Value::Object(stripped_full.clone()))?;

        if !validated && self.strict()? {
            let errors = self.schemas.validate(&self.conn, &old_type, &Value::Object(stripped_full))?;
            if !errors.is_empty() {
                return Err(Error::ValidationError(errors));
            }
        }

        let mut assignments = Vec::new();
        let mut values: Vec<&Value> = Vec::new();
        for (key, value) in &flat_partial {
            assignments.push(format!("\"{key}\" = ?"));
            values.push(value);
        }
        let set_clause = assignments.join(", ");
        let query = format!("UPDATE \"{old_type}\" SET {set_clause} WHERE uid = ?");
        let mut sql_values: Vec<rusqlite::types::Value> =
            values.into_iter().map(value_to_sql).collect();
        sql_values.push(rusqlite::types::Value::Text(uid.to_string()));
        self.conn.execute(&query, params_from_iter(sql_values))?;

        Ok(current["uid"].as_str().unwrap().to_string())
    }

    /// select(type, conditions) -> records. Conditions are equality-clause
    /// groups (OR of ANDs); the discriminator key is ignored in any clause.
    /// Missing table yields an empty result, not an error. Keys outside the
    /// table's known columns are rejected to avoid building unparameterised
    /// SQL from caller-controlled strings.
    pub fn select(&self, item_type: &str, conditions: &[HashMap<String, Value>]) -> Result<Vec<Map<String, Value>>> {
        let discriminator = self.discriminator()?;
        if !self.tables.borrow().contains_key(item_type) {
            return Ok(Vec::new());
        }

        let known_columns = self.tables.borrow()[item_type].clone();
        let mut or_clauses = Vec::new();
        let mut bind_values: Vec<rusqlite::types::Value> = Vec::new();

        for condition in conditions {
            let mut and_clauses = Vec::new();
            for (key, value) in condition {
                if key == &discriminator {
                    continue;
                }
                if !known_columns.contains_key(key) {
                    return Err(Error::SchemaError(format!(
                        "unknown column '{key}' for type '{item_type}'"
                    )));
                }
                and_clauses.push(format!("\"{key}\" = ?"));
                bind_values.push(value_to_sql(value));
            }
            if !and_clauses.is_empty() {
                or_clauses.push(format!("({})", and_clauses.join(" AND ")));
            }
        }

        let mut query = format!("SELECT * FROM \"{item_type}\"");
        if !or_clauses.is_empty() {
            query.push_str(" WHERE ");
            query.push_str(&or_clauses.join(" OR "));
        }
        tracing::debug!(%query, "select query");

        let mut stmt = self.conn.prepare(&query)?;
        let rows = stmt.query_map(params_from_iter(bind_values), Self::row_to_item)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(unflatten(&row?));
        }
        Ok(out)
    }

    /// all() -> every record in every user table, in table-enumeration
    /// order then row-insertion order.
    pub fn all(&self) -> Result<Vec<Map<String, Value>>> {
        let mut stmt = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite\\_%' ESCAPE '\\'",
        )?;
        let table_names: Vec<String> = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<_>>()?;

        let mut out = Vec::new();
        for table in table_names {
            if table.starts_with('_') {
                continue;
            }
            let mut rows_stmt = self.conn.prepare(&format!("SELECT * FROM \"{table}\""))?;
            let rows = rows_stmt.query_map([], Self::row_to_item)?;
            for row in rows {
                out.push(unflatten(&row?));
            }
        }
        Ok(out)
    }

    /// query(sql) -> pass-through for advanced callers.
    pub fn query(&self, sql: &str) -> Result<Vec<Map<String, Value>>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map([], Self::row_to_item)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(unflatten(&row?));
        }
        Ok(out)
    }
}

/// Splits a uid of the form `<type>--<uuid>` into (type, separator, uuid).
pub fn split_uid(uid: &str) -> (&str, &str, &str) {
    match uid.split_once("--") {
        Some((ty, rest)) => (ty, "--", rest),
        None => (uid, "", ""),
    }
}

fn value_to_sql(value: &Value) -> rusqlite::types::Value {
    match value {
        Value::Null => rusqlite::types::Value::Null,
        Value::Bool(b) => rusqlite::types::Value::Integer(*b as i64),
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                rusqlite::types::Value::Integer(i)
            } else {
                rusqlite::types::Value::Real(n.as_f64().unwrap_or_default())
            }
        }
        Value::String(s) => rusqlite::types::Value::Text(s.clone()),
        other => rusqlite::types::Value::Text(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn new_index() -> RecordIndex {
        let conn = Connection::open_in_memory().unwrap();
        RecordIndex::open(conn, true, "type").unwrap()
    }

    #[test]
    fn insert_assigns_uid_and_roundtrips() {
        let index = new_index();
        index.set_option("strict", "false").unwrap();
        let uid = index
            .insert(json!({"type": "foo", "uid": "foo--2cd66ab1-9b85-4110-8d77-4b6906819693"}).as_object().unwrap().clone())
            .unwrap();
        assert_eq!(uid, "foo--2cd66ab1-9b85-4110-8d77-4b6906819693");
        let item = index.get(&uid).unwrap();
        assert_eq!(item["type"], json!("foo"));
    }

    #[test]
    fn insert_without_discriminator_fails() {
        let index = new_index();
        index.set_option("strict", "false").unwrap();
        let err = index.insert(json!({"name": "x"}).as_object().unwrap().clone());
        assert!(matches!(err, Err(Error::MissingDiscriminator)));
    }

    #[test]
    fn insert_drops_none_and_rejects_missing_required_field_in_strict_mode() {
        let index = new_index();
        let ok = index.insert(
            json!({"type": "file", "name": "foo.txt", "origin": null})
                .as_object()
                .unwrap()
                .clone(),
        );
        assert!(ok.is_ok());

        let err = index.insert(json!({"type": "file"}).as_object().unwrap().clone());
        assert!(matches!(err, Err(Error::ValidationError(_))));
    }

    #[test]
    fn update_changing_type_rehomes_row_preserving_uuid_suffix() {
        let index = new_index();
        index.set_option("strict", "false").unwrap();
        let uid = index
            .insert(json!({"type": "process", "uid": "process--920d7c41-0fef-4cf8-bce2-ead120f6b506", "name": "iptables"})
                .as_object().unwrap().clone())
            .unwrap();
        let new_uid = index
            .update(&uid, json!({"type": "foo"}).as_object().unwrap().clone())
            .unwrap();
        assert_eq!(new_uid, "foo--920d7c41-0fef-4cf8-bce2-ead120f6b506");
        assert!(index.get(&uid).is_err());
        let item = index.get(&new_uid).unwrap();
        assert_eq!(item["type"], json!("foo"));
        assert_eq!(item["name"], json!("iptables"));
    }

    #[test]
    fn select_rejects_unknown_column() {
        let index = new_index();
        index.set_option("strict", "false").unwrap();
        index
            .insert(json!({"type": "foo", "name": "a"}).as_object().unwrap().clone())
            .unwrap();
        let mut condition = HashMap::new();
        condition.insert("bogus".to_string(), json!("x"));
        let err = index.select("foo", &[condition]);
        assert!(matches!(err, Err(Error::SchemaError(_))));
    }

    #[test]
    fn all_counts_every_row_across_types() {
        let index = new_index();
        index.set_option("strict", "false").unwrap();
        index.insert(json!({"type": "foo", "n": 1}).as_object().unwrap().clone()).unwrap();
        index.insert(json!({"type": "bar", "n": 2}).as_object().unwrap().clone()).unwrap();
        assert_eq!(index.all().unwrap().len(), 2);
    }
}
