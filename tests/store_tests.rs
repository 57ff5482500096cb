mod common;

use common::active_record;
use friend_finder::kernel::presence::{PresenceRecord, SteamId};
use friend_finder::services::store::{FileStore, MemoryStore, PresenceStore};
use friend_finder::WatchError;

#[tokio::test]
async fn test_unknown_id_loads_inactive_baseline() {
    let store = MemoryStore::new();
    let record = store.load(SteamId(7)).await.unwrap();
    assert_eq!(record, PresenceRecord::baseline(SteamId(7)));
    assert_eq!(store.len().await, 0, "loading does not create a record");
}

#[tokio::test]
async fn test_save_overwrites_single_record_per_id() {
    let store = MemoryStore::new();
    store.save(&active_record(7, "440")).await.unwrap();
    store.save(&PresenceRecord::baseline(SteamId(7))).await.unwrap();

    assert_eq!(store.len().await, 1);
    assert!(!store.load(SteamId(7)).await.unwrap().active);
}

#[tokio::test]
async fn test_file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("state").join("presence.json");

    {
        let store = FileStore::open(&path).await.unwrap();
        store.save(&active_record(1, "440")).await.unwrap();
        store.save(&PresenceRecord::baseline(SteamId(2))).await.unwrap();
    }

    let reopened = FileStore::open(&path).await.unwrap();
    let first = reopened.load(SteamId(1)).await.unwrap();
    assert!(first.active);
    assert_eq!(first.activity_id, "440");
    assert!(!reopened.load(SteamId(2)).await.unwrap().active);

    let raw = std::fs::read_to_string(&path).unwrap();
    assert!(raw.contains("\"id\": \"1\""), "ids are written as strings: {}", raw);
}

#[tokio::test]
async fn test_file_store_missing_file_starts_empty() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path().join("absent.json")).await.unwrap();
    assert_eq!(store.load(SteamId(3)).await.unwrap(), PresenceRecord::baseline(SteamId(3)));
}

#[tokio::test]
async fn test_file_store_rejects_corrupt_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("presence.json");
    std::fs::write(&path, "not json").unwrap();

    assert!(matches!(FileStore::open(&path).await, Err(WatchError::Config(_))));
}
