// ../tests/storage.rs
use projectx_ratatui::error::StoreError;
use projectx_ratatui::settings::{DEFAULT_MODEL, DEFAULT_VENICE_BASE_URL, EnvFile, Settings};
use projectx_ratatui::storage::{
    FileStore, KeyValueStore, KeyValueStoreExt, MemoryStore, chat_history_key,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use tempfile::tempdir;

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Note {
    title: String,
    tags: Vec<String>,
}

fn note() -> Note {
    Note {
        title: "Roswell".to_string(),
        tags: vec!["ufo".to_string(), "1947".to_string()],
    }
}

#[test]
fn test_file_store_round_trip() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path().join("data")).unwrap();

    assert_eq!(store.load::<Note>("notes").unwrap(), None);
    store.save("notes", &note()).unwrap();
    assert_eq!(store.load::<Note>("notes").unwrap(), Some(note()));
    assert!(store.dir().join("notes.json").exists());

    store.remove("notes").unwrap();
    assert_eq!(store.load::<Note>("notes").unwrap(), None);
    // Removing twice is fine.
    store.remove("notes").unwrap();
}

#[test]
fn test_file_store_sanitizes_keys() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path()).unwrap();

    store.set_raw(&chat_history_key("neo-prime"), "[]").unwrap();
    store.set_raw("../escape/attempt", "1").unwrap();

    let keys = store.keys().unwrap();
    assert_eq!(keys, vec![".._escape_attempt", "chat_history.neo-prime"]);
    assert!(!dir.path().parent().unwrap().join("escape").exists());
}

#[test]
fn test_corrupt_value_reports_serialization_error() {
    let dir = tempdir().unwrap();
    let store = FileStore::new(dir.path()).unwrap();
    store.set_raw("notes", "{ not json").unwrap();

    let err = store.load::<Note>("notes").unwrap_err();
    assert!(matches!(err, StoreError::Serialization(_)));
}

#[test]
fn test_memory_store_round_trip() {
    let store = MemoryStore::new();
    store.save("notes", &note()).unwrap();
    assert_eq!(store.load::<Note>("notes").unwrap(), Some(note()));
    assert_eq!(store.keys().unwrap(), vec!["notes"]);
    store.remove("notes").unwrap();
    assert!(store.keys().unwrap().is_empty());
}

#[test]
fn test_chat_history_key_format() {
    assert_eq!(chat_history_key("time-keeper"), "chat_history.time-keeper");
}

fn settings_from(pairs: &[(&str, &str)]) -> Settings {
    let vars: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Settings::from_lookup(|key| vars.get(key).cloned())
}

#[test]
fn test_settings_defaults() {
    let settings = settings_from(&[]);

    assert_eq!(settings.venice_api_key, "");
    assert_eq!(settings.venice_base_url, DEFAULT_VENICE_BASE_URL);
    assert_eq!(settings.model, DEFAULT_MODEL);
    assert_eq!(settings.bland_base_url, "https://api.bland.ai/v1");
    assert_eq!(settings.bland_from_number, "+15755000991");
    assert!(!settings.voice_disabled);
    assert!(!settings.debug_mode);
    assert_eq!(settings.request_timeout(), Duration::from_secs(60));
    assert!(settings.data_dir.ends_with("projectx/data"));
    assert!(!settings.completion_configured());
    assert!(!settings.voice_configured());
}

#[test]
fn test_settings_overrides() {
    let settings = settings_from(&[
        ("VENICE_API_KEY", " secret "),
        ("VENICE_MODEL", "llama-3.3-70b"),
        ("BLAND_AI_KEY", "bland"),
        ("BLAND_ORG_ID", "org"),
        ("DISABLE_BLAND_AI", "TRUE"),
        ("PROJECTX_DATA_DIR", "/tmp/px"),
        ("PROJECTX_DEBUG", "yes"),
        ("REQUEST_TIMEOUT_SECS", "15"),
    ]);

    assert_eq!(settings.venice_api_key, "secret");
    assert_eq!(settings.model, "llama-3.3-70b");
    assert!(settings.voice_disabled);
    assert!(settings.debug_mode);
    assert_eq!(settings.data_dir, PathBuf::from("/tmp/px"));
    assert_eq!(settings.request_timeout(), Duration::from_secs(15));
    assert!(settings.completion_configured());
    assert!(settings.voice_configured());
}

#[test]
fn test_settings_rejects_bad_values() {
    let settings = settings_from(&[
        ("DISABLE_BLAND_AI", "1"),
        ("REQUEST_TIMEOUT_SECS", "0"),
        ("VENICE_BASE_URL", "   "),
    ]);

    assert!(!settings.voice_disabled);
    assert_eq!(settings.request_timeout(), Duration::from_secs(60));
    assert_eq!(settings.venice_base_url, DEFAULT_VENICE_BASE_URL);
}

#[test]
fn test_env_file_outcomes() {
    let dir = tempdir().unwrap();

    assert_eq!(EnvFile::load_from(&dir.path().join("absent.env")), EnvFile::Missing);

    let good = dir.path().join("good.env");
    std::fs::write(&good, "PROJECTX_ENV_FILE_MARKER=loaded\n").unwrap();
    assert_eq!(EnvFile::load_from(&good), EnvFile::Loaded(good.clone()));
    assert_eq!(std::env::var("PROJECTX_ENV_FILE_MARKER").unwrap(), "loaded");

    let broken = dir.path().join("broken.env");
    std::fs::write(&broken, "this line has no equals sign\n").unwrap();
    assert!(matches!(EnvFile::load_from(&broken), EnvFile::Unreadable(_)));
}
