// src/container.rs
//
// The Container Orchestrator: open/create/close lifecycle, local-vs-remote
// mirroring, import/export, and the whole-container validate pass.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

use chrono::Utc;
use rusqlite::Connection;
use serde_json::{Map, Value};
use tempfile::TempDir;
use uuid::Uuid;

use crate::backend::{next_free_path, Backend, LocalBackend};
use crate::error::{Error, Result};
use crate::hashing::{hash_bytes, HashedFile, HASH_ALGORITHMS};
use crate::index::RecordIndex;

const DB_FILE: &str = "item.db";

/// STIX-style `observed-data` envelope metadata carried alongside the
/// record index, used by `import_interchange`/`export_interchange`.
pub type Metadata = Map<String, Value>;

fn now_iso() -> String {
    Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

fn new_metadata() -> Metadata {
    let id = format!("observed-data--{}", Uuid::new_v4());
    let now = now_iso();
    let mut meta = Metadata::new();
    meta.insert("type".into(), Value::from("observed-data"));
    meta.insert("id".into(), Value::from(id));
    meta.insert("created".into(), Value::from(now.clone()));
    meta.insert("first_observed".into(), Value::from(now.clone()));
    meta.insert("last_observed".into(), Value::from(now.clone()));
    meta.insert("modified".into(), Value::from(now));
    meta.insert("number_observed".into(), Value::from(1));
    meta
}

/// A forensic evidence container: a record index plus the payload files its
/// records reference, all rooted at one directory.
pub struct Container {
    index: RecordIndex,
    /// Always rooted at the real container directory. Payload I/O
    /// (`store_file`/`load_file`/`validate`) goes through this regardless of
    /// whether the index connection is mirrored — only `item.db` is ever
    /// copied to a scratch directory, never the payload tree.
    backend: LocalBackend,
    /// Present only when the index was mirrored to a scratch directory
    /// (read-only opens); holds the original root to copy the database back
    /// to, and the `TempDir` guard keeping the scratch directory alive.
    mirror: Option<(PathBuf, TempDir)>,
    read_only: bool,
    closed: bool,
    pub metadata: Metadata,
}

impl Container {
    /// Creates (if absent) and opens a container at `root`, mirroring the
    /// `fresh` → `initialised` → `open` state machine.
    pub fn create(root: impl AsRef<Path>) -> Result<Self> {
        Self::open_inner(root.as_ref(), false)
    }

    /// Opens an existing container read-only: the index database is
    /// mirrored to a scratch directory so the original is never mutated;
    /// payload files are still read straight from the real root.
    pub fn open_read_only(root: impl AsRef<Path>) -> Result<Self> {
        Self::open_inner(root.as_ref(), true)
    }

    fn open_inner(root: &Path, read_only: bool) -> Result<Self> {
        tracing::info!(root = %root.display(), read_only, "opening container");
        let remote = LocalBackend::create(root)?;
        let is_new = !remote.exists(DB_FILE);

        let (db_path, mirror) = if read_only {
            let scratch = TempDir::new()?;
            let local = LocalBackend::create(scratch.path())?;
            if !is_new {
                std::fs::copy(remote.resolve(DB_FILE), local.resolve(DB_FILE))?;
            }
            (local.resolve(DB_FILE), Some((root.to_path_buf(), scratch)))
        } else {
            (remote.resolve(DB_FILE), None)
        };

        let conn = Connection::open(&db_path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        let index = RecordIndex::open(conn, is_new, "type")?;

        Ok(Container {
            index,
            backend: remote,
            mirror,
            read_only,
            closed: false,
            metadata: new_metadata(),
        })
    }

    fn check_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::Closed);
        }
        Ok(())
    }

    // -- item API ------------------------------------------------------

    pub fn insert(&mut self, item: Map<String, Value>) -> Result<String> {
        self.check_open()?;
        self.index.insert(item)
    }

    pub fn get(&self, uid: &str) -> Result<Map<String, Value>> {
        self.check_open()?;
        self.index.get(uid)
    }

    pub fn update(&mut self, uid: &str, partial: Map<String, Value>) -> Result<String> {
        self.check_open()?;
        self.index.update(uid, partial)
    }

    pub fn select(&self, item_type: &str, conditions: &[HashMap<String, Value>]) -> Result<Vec<Map<String, Value>>> {
        self.check_open()?;
        self.index.select(item_type, conditions)
    }

    pub fn all(&self) -> Result<Vec<Map<String, Value>>> {
        self.check_open()?;
        self.index.all()
    }

    pub fn query(&self, sql: &str) -> Result<Vec<Map<String, Value>>> {
        self.check_open()?;
        self.index.query(sql)
    }

    // -- content store ---------------------------------------------------

    /// Opens a writer for a new payload under `file_path` (relative to the
    /// container root), suffixing on collision so two payloads with the
    /// same base name never clash. Returns the final relative path and the
    /// tee-hashing writer.
    pub fn store_file(&mut self, file_path: &str) -> Result<(String, HashedFile)> {
        self.check_open()?;
        reject_root_escape(file_path)?;
        self.backend.ensure_parent(file_path)?;
        let (dir, name) = split_dir_name(file_path);
        let final_path = next_free_path(&self.backend, dir, name);
        let file = self.backend.create_new(&final_path)?;
        Ok((final_path, HashedFile::new(file)))
    }

    /// Opens a read handle for a payload under `file_path`.
    pub fn load_file(&self, file_path: &str) -> Result<std::fs::File> {
        self.check_open()?;
        reject_root_escape(file_path)?;
        self.backend.open(file_path)
    }

    // -- convenience item constructors -----------------------------------

    pub fn add_process_item(
        &mut self,
        artifact: &str,
        name: &str,
        created: &str,
        cwd: &str,
        arguments: Vec<String>,
        command_line: &str,
        return_code: i64,
        errors: Vec<String>,
    ) -> Result<String> {
        let mut item = Map::new();
        item.insert("artifact".into(), Value::from(artifact));
        item.insert("type".into(), Value::from("process"));
        item.insert("name".into(), Value::from(name));
        item.insert("created".into(), Value::from(created));
        item.insert("cwd".into(), Value::from(cwd));
        item.insert("arguments".into(), Value::from(arguments));
        item.insert("command_line".into(), Value::from(command_line));
        item.insert("return_code".into(), Value::from(return_code));
        item.insert("errors".into(), Value::from(errors));
        self.insert(item)
    }

    pub fn add_file_item(
        &mut self,
        artifact: &str,
        name: &str,
        created: &str,
        modified: &str,
        accessed: &str,
        origin: Value,
        errors: Vec<String>,
    ) -> Result<String> {
        let mut item = Map::new();
        item.insert("artifact".into(), Value::from(artifact));
        item.insert("type".into(), Value::from("file"));
        item.insert("name".into(), Value::from(name));
        item.insert("created".into(), Value::from(created));
        item.insert("modified".into(), Value::from(modified));
        item.insert("accessed".into(), Value::from(accessed));
        item.insert("origin".into(), origin);
        item.insert("errors".into(), Value::from(errors));
        self.insert(item)
    }

    pub fn add_directory_item(
        &mut self,
        artifact: &str,
        dir_path: &str,
        created: &str,
        modified: &str,
        accessed: &str,
        errors: Vec<String>,
    ) -> Result<String> {
        let mut item = Map::new();
        item.insert("artifact".into(), Value::from(artifact));
        item.insert("path".into(), Value::from(dir_path));
        item.insert("type".into(), Value::from("directory"));
        item.insert("created".into(), Value::from(created));
        item.insert("modified".into(), Value::from(modified));
        item.insert("accessed".into(), Value::from(accessed));
        item.insert("errors".into(), Value::from(errors));
        self.insert(item)
    }

    pub fn add_registry_key_item(
        &mut self,
        artifact: &str,
        modified: &str,
        key: &str,
        errors: Vec<String>,
    ) -> Result<String> {
        let mut item = Map::new();
        item.insert("artifact".into(), Value::from(artifact));
        item.insert("type".into(), Value::from("windows-registry-key"));
        item.insert("modified".into(), Value::from(modified));
        item.insert("key".into(), Value::from(key));
        item.insert("errors".into(), Value::from(errors));
        self.insert(item)
    }

    /// Appends a registry value to an existing registry key item, encoding
    /// `data` according to `data_type` exactly as the original STIX
    /// registry-value conversion does (see the external interfaces'
    /// registry value encoding rule).
    pub fn add_registry_value_item(
        &mut self,
        key_id: &str,
        data_type: &str,
        data: &[u8],
        name: &str,
    ) -> Result<()> {
        let item = self.get(key_id)?;
        let mut values = item
            .get("values")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let encoded = encode_registry_value(data_type, data);

        let mut entry = Map::new();
        entry.insert("data_type".into(), Value::from(data_type));
        entry.insert("data".into(), Value::from(encoded));
        entry.insert("name".into(), Value::from(name));
        values.push(Value::Object(entry));

        let mut update = Map::new();
        update.insert("values".into(), Value::from(values));
        self.update(key_id, update)?;
        Ok(())
    }

    /// Writes the export payload for a `file` item (size and hashes are
    /// computed from what `write` produces).
    pub fn add_file_item_export<F>(
        &mut self,
        item_id: &str,
        export_name: Option<&str>,
        write: F,
    ) -> Result<()>
    where
        F: FnOnce(&mut HashedFile) -> Result<()>,
    {
        let item = self.get(item_id)?;
        let name = export_name
            .map(str::to_string)
            .or_else(|| item.get("name").and_then(Value::as_str).map(str::to_string))
            .ok_or_else(|| Error::ValidationError(vec!["file item has no name".into()]))?;
        self.add_file_field(item_id, "file", &name, "export_path", true, write)
    }

    /// Captures a process's stdout into a payload, stitching `stdout_path`
    /// back onto the item. No size or hashes are recorded, matching the
    /// original's `_add_file_field` call for this field.
    pub fn add_process_item_stdout<F>(&mut self, item_id: &str, write: F) -> Result<()>
    where
        F: FnOnce(&mut HashedFile) -> Result<()>,
    {
        self.add_file_field(item_id, "process", "stdout", "stdout_path", false, write)
    }

    /// Captures a process's stderr into a payload, stitching `stderr_path`
    /// back onto the item.
    pub fn add_process_item_stderr<F>(&mut self, item_id: &str, write: F) -> Result<()>
    where
        F: FnOnce(&mut HashedFile) -> Result<()>,
    {
        self.add_file_field(item_id, "process", "stderr", "stderr_path", false, write)
    }

    /// Captures a process's WMI output into a payload, stitching `wmi_path`
    /// back onto the item.
    pub fn add_process_item_wmi<F>(&mut self, item_id: &str, write: F) -> Result<()>
    where
        F: FnOnce(&mut HashedFile) -> Result<()>,
    {
        self.add_file_field(item_id, "process", "wmi", "wmi_path", false, write)
    }

    /// Shared scoped-writer plumbing behind `add_file_item_export` and the
    /// `add_process_item_*` capture methods: writes a payload named
    /// `export_name` under the item's artifact directory, stitches `field`
    /// (and, when `with_size_and_hashes`, `size`/`hashes`) back onto the
    /// item. Mirrors `_add_file_field`'s scoped-writer pattern via a closure
    /// instead of a context manager.
    fn add_file_field<F>(
        &mut self,
        item_id: &str,
        item_type: &str,
        export_name: &str,
        field: &str,
        with_size_and_hashes: bool,
        write: F,
    ) -> Result<()>
    where
        F: FnOnce(&mut HashedFile) -> Result<()>,
    {
        let item = self.get(item_id)?;
        if item.get("type").and_then(Value::as_str) != Some(item_type) {
            return Err(Error::ValidationError(vec![format!("must be a {item_type} item")]));
        }
        let artifact = item.get("artifact").and_then(Value::as_str).unwrap_or(".");

        let (new_path, mut hashed) = self.store_file(&format!("{artifact}/{export_name}"))?;
        write(&mut hashed)?;

        let mut update = Map::new();
        if with_size_and_hashes {
            let hashes = hashed.hashes();
            drop(hashed);
            let size = self.backend.size(&new_path)?;
            update.insert("size".into(), Value::from(size));
            update.insert("hashes".into(), serde_json::to_value(hashes)?);
        } else {
            drop(hashed);
        }
        update.insert(field.into(), Value::from(new_path));
        self.update(item_id, update)?;
        Ok(())
    }

    // -- import / export --------------------------------------------------

    /// Imports every record of another container, copying each `*_path`
    /// payload through this container's Content Store so name collisions
    /// are resolved locally.
    pub fn import_container(&mut self, other_root: impl AsRef<Path>) -> Result<()> {
        self.check_open()?;
        let other = Container::open_read_only(other_root)?;
        for item in other.all()? {
            self.import_item(&other.backend, item)?;
        }
        Ok(())
    }

    fn import_item(&mut self, source: &LocalBackend, mut item: Map<String, Value>) -> Result<()> {
        let path_fields: Vec<String> = item
            .keys()
            .filter(|k| k.ends_with("_path"))
            .cloned()
            .collect();
        for field in path_fields {
            if let Some(old_path) = item.get(&field).and_then(Value::as_str).map(str::to_string) {
                let bytes = source.read_bytes(&old_path)?;
                let (new_path, mut hashed) = self.store_file(&old_path)?;
                std::io::Write::write_all(&mut hashed, &bytes)?;
                drop(hashed);
                item.insert(field, Value::from(new_path));
            }
        }
        self.insert(item)?;
        Ok(())
    }

    /// Reads a JSON envelope `{meta…, objects: {id → record}}` and imports
    /// each object, adopting `meta` as this container's metadata.
    pub fn import_interchange(&mut self, url: impl AsRef<Path>) -> Result<()> {
        self.check_open()?;
        let raw = std::fs::read_to_string(url.as_ref())?;
        let envelope: Value = serde_json::from_str(&raw)?;
        let envelope = envelope
            .as_object()
            .ok_or_else(|| Error::SchemaError("interchange envelope must be a JSON object".into()))?;

        let base_dir = url
            .as_ref()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let source = LocalBackend::create(&base_dir)?;

        self.metadata = envelope
            .iter()
            .filter(|(k, _)| k.as_str() != "objects")
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        let objects = envelope
            .get("objects")
            .and_then(Value::as_object)
            .cloned()
            .unwrap_or_default();
        for (_, item) in objects {
            if let Some(item) = item.as_object() {
                self.import_item(&source, item.clone())?;
            }
        }
        Ok(())
    }

    /// Writes a JSON envelope with container metadata and `objects` keyed
    /// by sequential integers in `all()`'s enumeration order, copying every
    /// `*_path` payload the records reference alongside the envelope so
    /// `import_interchange`'s base-directory-relative resolution can find
    /// them.
    pub fn export_interchange(&self, url: impl AsRef<Path>) -> Result<()> {
        self.check_open()?;
        let base_dir = url
            .as_ref()
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        let destination = LocalBackend::create(&base_dir)?;

        let mut envelope = self.metadata.clone();
        let mut objects = Map::new();
        for (idx, item) in self.all()?.into_iter().enumerate() {
            self.export_item_payloads(&item, &destination)?;
            objects.insert(idx.to_string(), Value::Object(item));
        }
        envelope.insert("objects".into(), Value::Object(objects));
        let serialized = serde_json::to_string(&Value::Object(envelope))?;
        std::fs::write(url.as_ref(), serialized)?;
        Ok(())
    }

    fn export_item_payloads(&self, item: &Map<String, Value>, destination: &LocalBackend) -> Result<()> {
        for (field, value) in item {
            if !field.ends_with("_path") {
                continue;
            }
            let Some(path) = value.as_str() else { continue };
            if !self.backend.exists(path) {
                continue;
            }
            destination.ensure_parent(path)?;
            let bytes = self.backend.read_bytes(path)?;
            std::fs::write(destination.resolve(path), bytes)?;
        }
        Ok(())
    }

    // -- validate ----------------------------------------------------

    /// Validates every record and the file set against what the records
    /// reference, returning one error string per violation. An empty
    /// result means the container is valid.
    pub fn validate(&self) -> Result<Vec<String>> {
        self.check_open()?;
        let mut errors = Vec::new();
        let mut expected_files: HashSet<String> = HashSet::new();
        expected_files.insert(format!("/{DB_FILE}"));

        for item in self.all()? {
            let (item_errors, item_expected) = self.validate_item(&item)?;
            errors.extend(item_errors);
            expected_files.extend(item_expected);
        }

        let sidecar_suffixes = [
            format!("/{DB_FILE}-journal"),
            format!("/{DB_FILE}-wal"),
            format!("/{DB_FILE}-shm"),
        ];
        let stored_files: HashSet<String> = self
            .backend
            .walk_files()?
            .into_iter()
            .map(|f| format!("/{f}"))
            .filter(|f| !sidecar_suffixes.iter().any(|suffix| f.ends_with(suffix.as_str())))
            .collect();

        let missing: Vec<&String> = expected_files.difference(&stored_files).collect();
        if !missing.is_empty() {
            let mut names: Vec<String> = missing.into_iter().cloned().collect();
            names.sort();
            errors.push(format!("missing files: ('{}')", names.join("', '")));
        }
        let additional: Vec<&String> = stored_files.difference(&expected_files).collect();
        if !additional.is_empty() {
            let mut names: Vec<String> = additional.into_iter().cloned().collect();
            names.sort();
            errors.push(format!("additional files: ('{}')", names.join("', '")));
        }

        Ok(errors)
    }

    fn validate_item(&self, item: &Map<String, Value>) -> Result<(Vec<String>, HashSet<String>)> {
        let mut errors = Vec::new();
        let mut expected = HashSet::new();

        let discriminator = self.index.discriminator()?;
        let item_type = match item.get(&discriminator).and_then(Value::as_str) {
            Some(t) => t,
            None => {
                errors.push(format!("Item needs to have a discriminator, got {item:?}"));
                return Ok((errors, expected));
            }
        };

        errors.extend(self.index.schemas.validate(self.index.connection(), item_type, &Value::Object(item.clone()))?);

        for (field, value) in item {
            if !field.ends_with("_path") {
                continue;
            }
            let export_path = match value.as_str() {
                Some(p) => p,
                None => continue,
            };

            if export_path.contains("..") {
                errors.push(format!("'..' in {export_path}"));
                continue;
            }
            expected.insert(format!("/{export_path}"));

            if !self.backend.exists(export_path) {
                continue;
            }

            if let Some(expected_size) = item.get("size").and_then(Value::as_u64) {
                if self.backend.size(export_path)? != expected_size {
                    errors.push(format!("wrong size for {export_path}"));
                }
            }

            if let Some(hashes) = item.get("hashes").and_then(Value::as_object) {
                let bytes = self.backend.read_bytes(export_path)?;
                let computed = hash_bytes(&bytes);
                for (algo, expected_hash) in hashes {
                    if !HASH_ALGORITHMS.contains(&algo.as_str()) {
                        errors.push(format!("unsupported hash {algo} for {export_path}"));
                        continue;
                    }
                    if computed.get(algo).map(String::as_str) != expected_hash.as_str() {
                        errors.push(format!("hashvalue mismatch {algo} for {export_path}"));
                    }
                }
            }
        }

        Ok((errors, expected))
    }

    // -- lifecycle -----------------------------------------------------

    pub fn close(mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        tracing::info!("closing container");

        if let Some((root, scratch)) = self.mirror.take() {
            if !self.read_only {
                std::fs::copy(scratch.path().join(DB_FILE), root.join(DB_FILE))?;
            }
        }
        Ok(())
    }
}

/// Rejects a relative path that would resolve outside the container root
/// (any `..` segment), per the Content Store's `OutOfRoot` failure mode.
fn reject_root_escape(relative: &str) -> Result<()> {
    if relative.split('/').any(|segment| segment == "..") {
        return Err(Error::OutOfRoot(relative.to_string()));
    }
    Ok(())
}

fn split_dir_name(path: &str) -> (&str, &str) {
    match path.rfind('/') {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("", path),
    }
}

/// Encodes registry value bytes per the `REG_*` data type: strings decode
/// as UTF-16, DWORD/QWORD decode as little-endian unsigned integers, and
/// anything else is rendered as space-separated hex byte pairs.
fn encode_registry_value(data_type: &str, data: &[u8]) -> String {
    match data_type {
        "REG_SZ" | "REG_EXPAND_SZ" => decode_utf16le(data),
        "REG_DWORD" | "REG_QWORD" => {
            let mut value: u64 = 0;
            for (i, byte) in data.iter().enumerate().take(8) {
                value |= (*byte as u64) << (8 * i);
            }
            value.to_string()
        }
        "MULTI_SZ" => decode_utf16le(data)
            .split('\u{0}')
            .collect::<Vec<_>>()
            .join(" "),
        _ => data
            .iter()
            .map(|b| format!("{b:02x}"))
            .collect::<Vec<_>>()
            .join(" "),
    }
}

fn decode_utf16le(data: &[u8]) -> String {
    let units: Vec<u16> = data
        .chunks_exact(2)
        .map(|c| u16::from_le_bytes([c[0], c[1]]))
        .collect();
    String::from_utf16_lossy(&units)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn scratch_container() -> (TempDir, Container) {
        let dir = TempDir::new().unwrap();
        let container = Container::create(dir.path().join("evidence.forensicstore")).unwrap();
        (dir, container)
    }

    #[test]
    fn create_then_reopen_preserves_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("store.forensicstore");
        {
            let mut container = Container::create(&path).unwrap();
            container
                .insert(serde_json::json!({"type": "foo", "name": "a"}).as_object().unwrap().clone())
                .unwrap();
            container.close().unwrap();
        }
        let reopened = Container::create(&path).unwrap();
        assert_eq!(reopened.all().unwrap().len(), 1);
    }

    #[test]
    fn store_file_suffixes_on_collision() {
        let (_dir, mut container) = scratch_container();
        let (p1, mut h1) = container.store_file("testfile.txt").unwrap();
        std::io::Write::write_all(&mut h1, b"A").unwrap();
        drop(h1);
        let (p2, mut h2) = container.store_file("testfile.txt").unwrap();
        std::io::Write::write_all(&mut h2, b"B").unwrap();
        drop(h2);
        assert_eq!(p1, "testfile.txt");
        assert_eq!(p2, "testfile_0.txt");
    }

    #[test]
    fn validate_flags_missing_file() {
        let (_dir, mut container) = scratch_container();
        container
            .insert(serde_json::json!({"type": "foo", "foo_path": "bar"}).as_object().unwrap().clone())
            .unwrap();
        let errors = container.validate().unwrap();
        assert_eq!(errors, vec!["missing files: ('/bar')".to_string()]);
    }

    #[test]
    fn validate_flags_parent_escape() {
        let (_dir, mut container) = scratch_container();
        container
            .insert(serde_json::json!({"type": "foo", "foo_path": "../bar"}).as_object().unwrap().clone())
            .unwrap();
        let errors = container.validate().unwrap();
        assert_eq!(errors, vec!["'..' in ../bar".to_string()]);
    }

    #[test]
    fn validate_flags_additional_file() {
        let (_dir, mut container) = scratch_container();
        let (_, mut h) = container.store_file("bar").unwrap();
        std::io::Write::write_all(&mut h, b"b").unwrap();
        drop(h);
        let errors = container.validate().unwrap();
        assert_eq!(errors, vec!["additional files: ('/bar')".to_string()]);
    }

    #[test]
    fn registry_value_dword_encodes_little_endian_decimal() {
        let (_dir, mut container) = scratch_container();
        let key_id = container
            .add_registry_key_item("Test", "2020-01-01T00:00:00.000Z", "HKLM\\Test", vec![])
            .unwrap();
        container
            .add_registry_value_item(&key_id, "REG_DWORD", &1u32.to_le_bytes(), "")
            .unwrap();
        let item = container.get(&key_id).unwrap();
        let values = item["values"].as_array().unwrap();
        assert_eq!(values[0]["data"], serde_json::json!("1"));
    }

    #[test]
    fn registry_value_default_encodes_hex_pairs() {
        assert_eq!(encode_registry_value("REG_BINARY", &[0xDE, 0xAD]), "de ad");
    }
}
