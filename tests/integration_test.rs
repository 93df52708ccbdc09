// tests/integration_test.rs
//
//! End-to-end tests across the container, index, and content store.

use forensicstore::Container;
use serde_json::json;
use tempfile::TempDir;

fn open_store() -> (TempDir, Container) {
    let dir = TempDir::new().unwrap();
    let container = Container::create(dir.path().join("evidence.forensicstore")).unwrap();
    (dir, container)
}

#[test]
fn insert_get_select_and_all_agree() {
    let (_dir, mut store) = open_store();

    store
        .insert(
            json!({
                "type": "process",
                "artifact": "IPTablesRules",
                "name": "iptables",
                "created": "2016-01-20T14:11:25.550Z",
                "cwd": "/root/",
                "arguments": ["-L", "-n", "-v"],
                "command_line": "/sbin/iptables -L -n -v",
                "return_code": 0,
            })
            .as_object()
            .unwrap()
            .clone(),
        )
        .unwrap();
    store
        .insert(json!({"type": "file", "name": "a.txt"}).as_object().unwrap().clone())
        .unwrap();
    store
        .insert(json!({"type": "file", "name": "b.txt"}).as_object().unwrap().clone())
        .unwrap();

    assert_eq!(store.all().unwrap().len(), 3);
    assert_eq!(store.select("file", &[]).unwrap().len(), 2);
}

#[test]
fn process_item_captures_stdout_and_stderr() {
    let (_dir, mut store) = open_store();

    let uid = store
        .add_process_item(
            "IPTablesRules",
            "iptables",
            "2016-01-20T14:11:25.550Z",
            "/root/",
            vec!["-L".to_string(), "-n".to_string(), "-v".to_string()],
            "/sbin/iptables -L -n -v",
            0,
            vec![],
        )
        .unwrap();

    store
        .add_process_item_stdout(&uid, |writer| {
            std::io::Write::write_all(writer, b"foo")?;
            Ok(())
        })
        .unwrap();
    store
        .add_process_item_stderr(&uid, |writer| {
            std::io::Write::write_all(writer, b"bar")?;
            Ok(())
        })
        .unwrap();

    let item = store.get(&uid).unwrap();
    assert_eq!(item["stdout_path"], json!("IPTablesRules/stdout"));
    assert_eq!(item["stderr_path"], json!("IPTablesRules/stderr"));
    assert!(item.get("hashes").is_none());

    let all = store.all().unwrap();
    assert_eq!(all.len(), 1);
}

#[test]
fn update_preserves_other_fields_and_type_change_rehomes_row() {
    let (_dir, mut store) = open_store();
    let uid = store
        .insert(
            json!({
                "type": "process",
                "uid": "process--920d7c41-0fef-4cf8-bce2-ead120f6b506",
                "artifact": "IPTablesRules",
                "name": "iptables",
            })
            .as_object()
            .unwrap()
            .clone(),
        )
        .unwrap();

    store
        .update(&uid, json!({"name": "foo"}).as_object().unwrap().clone())
        .unwrap();
    let updated = store.get(&uid).unwrap();
    assert_eq!(updated["name"], json!("foo"));
    assert_eq!(updated["artifact"], json!("IPTablesRules"));

    let retyped = store
        .update(&uid, json!({"type": "foo"}).as_object().unwrap().clone())
        .unwrap();
    assert_eq!(retyped, "foo--920d7c41-0fef-4cf8-bce2-ead120f6b506");
    assert!(store.get(&uid).is_err());
    let moved = store.get(&retyped).unwrap();
    assert_eq!(moved["type"], json!("foo"));
    assert_eq!(moved["name"], json!("foo"));
}

#[test]
fn store_file_then_validate_reports_no_errors() {
    let (_dir, mut store) = open_store();
    let uid = store
        .insert(json!({"type": "file", "name": "testfile.txt"}).as_object().unwrap().clone())
        .unwrap();

    store
        .add_file_item_export(&uid, None, |writer| {
            std::io::Write::write_all(writer, b"hello world")?;
            Ok(())
        })
        .unwrap();

    let item = store.get(&uid).unwrap();
    assert_eq!(item["size"], json!(11));
    assert!(item["hashes"]["MD5"].is_string());

    let errors = store.validate().unwrap();
    assert!(errors.is_empty(), "unexpected validation errors: {errors:?}");
}

#[test]
fn export_then_import_round_trips_records_and_payloads() {
    let (_dir, mut source) = open_store();
    let uid = source
        .insert(json!({"type": "file", "name": "testfile.txt"}).as_object().unwrap().clone())
        .unwrap();
    source
        .add_file_item_export(&uid, None, |writer| {
            std::io::Write::write_all(writer, b"payload")?;
            Ok(())
        })
        .unwrap();

    let export_dir = TempDir::new().unwrap();
    let envelope_path = export_dir.path().join("export.json");
    source.export_interchange(&envelope_path).unwrap();

    let import_dir = TempDir::new().unwrap();
    let mut target = Container::create(import_dir.path().join("imported.forensicstore")).unwrap();
    target.import_interchange(&envelope_path).unwrap();

    assert_eq!(target.all().unwrap().len(), 1);
}

#[test]
fn validate_detects_missing_and_additional_files() {
    let (_dir, mut store) = open_store();
    store
        .insert(json!({"type": "foo", "foo_path": "bar"}).as_object().unwrap().clone())
        .unwrap();
    let errors = store.validate().unwrap();
    assert_eq!(errors, vec!["missing files: ('/bar')".to_string()]);
}

#[test]
fn registry_key_and_value_round_trip() {
    let (_dir, mut store) = open_store();
    let key_id = store
        .add_registry_key_item("Test", "2020-01-01T00:00:00.000Z", "HKLM\\Software\\Test", vec![])
        .unwrap();
    store
        .add_registry_value_item(&key_id, "REG_SZ", "hi".encode_utf16().flat_map(u16::to_le_bytes).collect::<Vec<u8>>().as_slice(), "")
        .unwrap();

    let item = store.get(&key_id).unwrap();
    let values = item["values"].as_array().unwrap();
    assert_eq!(values[0]["data"], json!("hi"));
}
