use super::*;

fn temp_store(name: &str) -> FileTokenStore {
    let path = std::env::temp_dir().join(format!("learnboard-store-{name}-{}.json", std::process::id()));
    let _ = std::fs::remove_file(&path);
    FileTokenStore::new(path)
}

// =============================================================================
// MemoryTokenStore
// =============================================================================

#[test]
fn memory_store_starts_empty() {
    let store = MemoryTokenStore::new();
    assert!(store.access_token().is_none());
    assert!(store.refresh_token().is_none());
}

#[test]
fn memory_store_set_and_read_pair() {
    let store = MemoryTokenStore::new();
    store.set_tokens("a1", "r1");
    assert_eq!(store.access_token().as_deref(), Some("a1"));
    assert_eq!(store.refresh_token().as_deref(), Some("r1"));
}

#[test]
fn memory_store_set_access_keeps_refresh() {
    let store = MemoryTokenStore::new();
    store.set_tokens("a1", "r1");
    store.set_access_token("a2");
    assert_eq!(store.access_token().as_deref(), Some("a2"));
    assert_eq!(store.refresh_token().as_deref(), Some("r1"));
}

#[test]
fn memory_store_clear_removes_both() {
    let store = MemoryTokenStore::new();
    store.set_tokens("a1", "r1");
    store.clear();
    assert!(store.access_token().is_none());
    assert!(store.refresh_token().is_none());
}

#[test]
fn memory_store_replaces_existing_session() {
    let store = MemoryTokenStore::new();
    store.set_tokens("a1", "r1");
    store.set_tokens("a2", "r2");
    assert_eq!(store.access_token().as_deref(), Some("a2"));
    assert_eq!(store.refresh_token().as_deref(), Some("r2"));
}

// =============================================================================
// FileTokenStore
// =============================================================================

#[test]
fn file_store_missing_file_reads_empty() {
    let store = temp_store("missing");
    assert!(store.access_token().is_none());
    assert!(store.refresh_token().is_none());
}

#[test]
fn file_store_round_trips_pair() {
    let store = temp_store("roundtrip");
    store.set_tokens("a1", "r1");
    assert_eq!(store.access_token().as_deref(), Some("a1"));
    assert_eq!(store.refresh_token().as_deref(), Some("r1"));
}

#[test]
fn file_store_persists_under_well_known_keys() {
    let store = temp_store("keys");
    store.set_tokens("a1", "r1");
    let raw = std::fs::read_to_string(&store.path).unwrap();
    let map: serde_json::Value = serde_json::from_str(&raw).unwrap();
    assert_eq!(map[ACCESS_TOKEN_KEY], "a1");
    assert_eq!(map[REFRESH_TOKEN_KEY], "r1");
}

#[test]
fn file_store_survives_reopen() {
    let store = temp_store("reopen");
    store.set_tokens("a1", "r1");
    let reopened = FileTokenStore::new(store.path.clone());
    assert_eq!(reopened.access_token().as_deref(), Some("a1"));
}

#[test]
fn file_store_set_access_keeps_refresh() {
    let store = temp_store("access-only");
    store.set_tokens("a1", "r1");
    store.set_access_token("a2");
    assert_eq!(store.access_token().as_deref(), Some("a2"));
    assert_eq!(store.refresh_token().as_deref(), Some("r1"));
}

#[test]
fn file_store_clear_removes_both_keys() {
    let store = temp_store("clear");
    store.set_tokens("a1", "r1");
    store.clear();
    assert!(store.access_token().is_none());
    assert!(store.refresh_token().is_none());
}

#[test]
fn file_store_ignores_corrupt_payload() {
    let store = temp_store("corrupt");
    std::fs::write(&store.path, "{not json").unwrap();
    assert!(store.access_token().is_none());
    store.set_tokens("a1", "r1");
    assert_eq!(store.access_token().as_deref(), Some("a1"));
}
