use flick_state_core::{DocumentKey, JsonStyle, StateStore, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
struct Settings {
    text_scale: f64,
    wallpaper: Option<String>,
}

fn store_in(dir: &std::path::Path) -> StateStore {
    StateStore::new(dir, JsonStyle::Pretty)
}

fn key(name: &str) -> DocumentKey {
    DocumentKey::new(name).unwrap()
}

#[test]
fn read_missing_document_returns_default() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(dir.path());

    let value = store.read(&key("display_config.json"), json!({"text_scale": 1.0}));
    assert_eq!(value, json!({"text_scale": 1.0}));
    assert_eq!(store.read_value(&key("display_config.json")), None);
}

#[test]
fn read_invalid_json_returns_default() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(dir.path());
    std::fs::write(dir.path().join("display_config.json"), "{\"text_scale\": 1.").unwrap();

    let settings = store.read(&key("display_config.json"), Settings::default());
    assert_eq!(settings, Settings::default());

    let strict = store.try_read::<Settings>(&key("display_config.json"));
    assert!(matches!(strict, Err(StoreError::Parse { .. })));
}

#[test]
fn read_empty_file_counts_as_missing() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(dir.path());
    std::fs::write(dir.path().join("calendar.json"), "  \n").unwrap();

    assert!(store.try_read::<Value>(&key("calendar.json")).unwrap().is_none());
    assert_eq!(store.read(&key("calendar.json"), json!({})), json!({}));
}

#[test]
fn wrong_shape_returns_default() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(dir.path());
    std::fs::write(dir.path().join("display_config.json"), "[1, 2, 3]").unwrap();

    assert_eq!(
        store.read(&key("display_config.json"), Settings::default()),
        Settings::default()
    );
}

#[test]
fn write_then_read_round_trips() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(dir.path());
    let settings = Settings {
        text_scale: 1.25,
        wallpaper: Some("/home/flick/Pictures/bg.png".to_string()),
    };

    store.write(&key("display_config.json"), &settings).unwrap();
    assert_eq!(
        store.read(&key("display_config.json"), Settings::default()),
        settings
    );

    let raw = std::fs::read_to_string(dir.path().join("display_config.json")).unwrap();
    assert!(raw.contains("\n  \"text_scale\""));
    assert!(raw.ends_with('\n'));
}

#[test]
fn compact_style_writes_single_line() {
    let dir = tempfile::tempdir().unwrap();
    let store = StateStore::new(dir.path(), JsonStyle::Compact);

    store
        .write(&key("media_status.json"), &json!({"playing": true, "title": "x"}))
        .unwrap();
    let raw = std::fs::read_to_string(dir.path().join("media_status.json")).unwrap();
    assert!(!raw.contains('\n'));
}

#[test]
fn write_creates_nested_directories_and_leaves_no_temp_files() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(dir.path());

    store
        .write(&key("passwordsafe/vaults.json"), &json!(["/a.kdbx"]))
        .unwrap();
    store
        .write(&key("passwordsafe/vaults.json"), &json!(["/a.kdbx", "/b.kdbx"]))
        .unwrap();

    let names: Vec<String> = std::fs::read_dir(dir.path().join("passwordsafe"))
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["vaults.json".to_string()]);
    assert_eq!(
        store.read_value(&key("passwordsafe/vaults.json")),
        Some(json!(["/a.kdbx", "/b.kdbx"]))
    );
}

#[test]
fn update_applies_mutation_over_default() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(dir.path());

    let written = store
        .update(&key("display_config.json"), Settings::default(), |settings| {
            settings.text_scale = 2.0;
        })
        .unwrap();
    assert_eq!(written.text_scale, 2.0);
    assert!(store.exists(&key("display_config.json")));
    assert!(store.last_modified(&key("display_config.json")).is_some());
}

#[test]
fn remove_reports_whether_document_existed() {
    let dir = tempfile::tempdir().unwrap();
    let store = store_in(dir.path());
    store.write(&key("app_notifications.json"), &json!({})).unwrap();

    assert!(store.remove(&key("app_notifications.json")).unwrap());
    assert!(!store.remove(&key("app_notifications.json")).unwrap());
    assert!(!store.exists(&key("app_notifications.json")));
}

#[test]
fn invalid_keys_are_rejected() {
    for raw in ["", "/etc/passwd", "../x.json", "a//b", ".hidden", "a b.json"] {
        assert!(
            matches!(DocumentKey::new(raw), Err(StoreError::InvalidKey(_))),
            "{raw} should be rejected"
        );
    }
}
