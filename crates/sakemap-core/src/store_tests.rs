//! Tests for preference persistence.

use super::error::Error;
use super::store::{
    parse_stored, sanitize, FilePreferenceStore, Listener, MemoryPreferenceStore,
    PreferenceStore, PREFERENCE_KEY,
};
use parking_lot::Mutex;
use serde_json::json;
use std::sync::Arc;

fn recorder() -> (Listener, Arc<Mutex<Vec<Option<[f32; 6]>>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let listener: Listener = Arc::new(move |v| sink.lock().push(v));
    (listener, seen)
}

#[test]
fn test_sanitize_replaces_non_finite_and_clamps() {
    let cleaned = sanitize(&[f32::NAN, -0.3, 1.7, 0.25, f32::INFINITY, 1.0]).unwrap();
    assert_eq!(cleaned, [0.5, 0.0, 1.0, 0.25, 0.5, 1.0]);
}

#[test]
fn test_sanitize_rejects_wrong_length() {
    let err = sanitize(&[0.1, 0.2]).unwrap_err();
    assert!(matches!(
        err,
        Error::InvalidVector {
            expected: 6,
            actual: 2
        }
    ));
}

#[test]
fn test_parse_stored_is_strict() {
    assert_eq!(
        parse_stored(&json!([0.1, 0.2, 0.3, 0.4, 0.5, 0.6])),
        Some([0.1, 0.2, 0.3, 0.4, 0.5, 0.6])
    );
    assert_eq!(parse_stored(&json!([0.1, 0.2, 0.3])), None);
    assert_eq!(parse_stored(&json!([0.1, 0.2, 0.3, 0.4, 0.5, null])), None);
    assert_eq!(parse_stored(&json!([0.1, 0.2, 0.3, 0.4, 0.5, "x"])), None);
    assert_eq!(parse_stored(&json!({"v": [0.5]})), None);
}

#[test]
fn test_parse_stored_accepts_numeric_strings() {
    assert_eq!(
        parse_stored(&json!(["0", "1", "0.5", 0.5, 0.5, 0.5])),
        Some([0.0, 1.0, 0.5, 0.5, 0.5, 0.5])
    );
}

#[test]
fn test_memory_store_round_trip() {
    let store = MemoryPreferenceStore::new();
    assert_eq!(store.load(), None);
    store.save(&[0.2, 2.0, 0.4, 0.4, 0.4, f32::NAN]).unwrap();
    assert_eq!(store.load(), Some([0.2, 1.0, 0.4, 0.4, 0.4, 0.5]));
}

#[test]
fn test_memory_store_with_malformed_raw_loads_none() {
    let store = MemoryPreferenceStore::with_raw(json!([1, 2, 3]));
    assert_eq!(store.load(), None);
}

#[test]
fn test_wrong_length_save_changes_nothing() {
    let store = MemoryPreferenceStore::new();
    store.save(&[0.5; 6]).unwrap();
    let (listener, seen) = recorder();
    let _sub = store.subscribe(listener);
    assert!(store.save(&[0.1; 5]).is_err());
    assert_eq!(store.load(), Some([0.5; 6]));
    assert!(seen.lock().is_empty());
}

#[test]
fn test_subscribers_receive_saved_value() {
    let store = MemoryPreferenceStore::new();
    let (listener, seen) = recorder();
    let sub = store.subscribe(listener);
    store.save(&[0.9; 6]).unwrap();
    assert_eq!(*seen.lock(), vec![Some([0.9; 6])]);
    drop(sub);
}

#[test]
fn test_dropping_subscription_unsubscribes() {
    let store = MemoryPreferenceStore::new();
    let (listener, seen) = recorder();
    let sub = store.subscribe(listener);
    assert_eq!(store.subscriber_count(), 1);
    sub.unsubscribe();
    assert_eq!(store.subscriber_count(), 0);
    store.save(&[0.9; 6]).unwrap();
    assert!(seen.lock().is_empty());
}

#[test]
fn test_subscription_outliving_store_is_harmless() {
    let store = MemoryPreferenceStore::new();
    let (listener, _seen) = recorder();
    let sub = store.subscribe(listener);
    drop(store);
    drop(sub);
}

#[test]
fn test_file_store_round_trip() {
    let dir = tempfile::tempdir().unwrap();
    let store = FilePreferenceStore::new(dir.path().join("prefs"));
    assert_eq!(store.load(), None);
    assert!(store
        .path()
        .ends_with(format!("prefs/{PREFERENCE_KEY}.json")));

    store.save(&[0.1, 0.2, 0.3, 0.4, 0.5, 0.6]).unwrap();
    assert_eq!(store.load(), Some([0.1, 0.2, 0.3, 0.4, 0.5, 0.6]));

    let reopened = FilePreferenceStore::new(dir.path().join("prefs"));
    assert_eq!(reopened.load(), Some([0.1, 0.2, 0.3, 0.4, 0.5, 0.6]));
}

#[test]
fn test_file_store_garbage_loads_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = FilePreferenceStore::new(dir.path());
    std::fs::write(store.path(), "{not json").unwrap();
    assert_eq!(store.load(), None);
    std::fs::write(store.path(), "[0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7]").unwrap();
    assert_eq!(store.load(), None);
}

#[test]
fn test_file_store_clear_notifies_none() {
    let dir = tempfile::tempdir().unwrap();
    let store = FilePreferenceStore::new(dir.path());
    store.save(&[0.3; 6]).unwrap();
    let (listener, seen) = recorder();
    let _sub = store.subscribe(listener);
    store.clear().unwrap();
    assert_eq!(store.load(), None);
    assert_eq!(*seen.lock(), vec![None]);
    store.clear().unwrap();
}

#[test]
fn test_file_store_write_failure_is_returned() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("not-a-dir");
    std::fs::write(&blocker, "x").unwrap();
    let store = FilePreferenceStore::new(&blocker);
    assert!(matches!(store.save(&[0.5; 6]), Err(Error::Io(_))));
}
