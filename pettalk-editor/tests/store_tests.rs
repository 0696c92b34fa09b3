//! File-backed session and blob stores

use pettalk_editor::analysis::store::{
    new_blob_id, BlobRecord, BlobStore, FileBlobStore, FileSessionStore, SessionStore, StoredBlob,
    LAST_UPLOADED_FILENAME, SELECTED_END_TIME, SELECTED_START_TIME,
};
use pettalk_editor::audio::MediaAsset;
use pettalk_editor::Error;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

#[test]
fn test_session_absent_until_first_write() {
    let dir = TempDir::new().unwrap();
    let store = FileSessionStore::new(dir.path().join("session.json"));
    assert_eq!(store.get(LAST_UPLOADED_FILENAME).unwrap(), None);
    assert!(!store.path().exists());
}

#[test]
fn test_session_persists_across_instances() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("session.json");

    let store = FileSessionStore::new(&path);
    store.set(LAST_UPLOADED_FILENAME, "audio_20240101_120000.wav").unwrap();
    store.set(SELECTED_START_TIME, "1.5").unwrap();
    store.set(SELECTED_END_TIME, "9").unwrap();

    let reopened = FileSessionStore::new(&path);
    assert_eq!(
        reopened.get(LAST_UPLOADED_FILENAME).unwrap().as_deref(),
        Some("audio_20240101_120000.wav")
    );
    assert_eq!(reopened.get(SELECTED_START_TIME).unwrap().as_deref(), Some("1.5"));

    reopened.set(LAST_UPLOADED_FILENAME, "audio_20240101_120105.wav").unwrap();
    reopened.remove(SELECTED_END_TIME).unwrap();
    assert_eq!(
        store.get(LAST_UPLOADED_FILENAME).unwrap().as_deref(),
        Some("audio_20240101_120105.wav")
    );
    assert_eq!(store.get(SELECTED_END_TIME).unwrap(), None);
    assert_eq!(store.get(SELECTED_START_TIME).unwrap().as_deref(), Some("1.5"));
}

#[test]
fn test_corrupt_session_file_is_storage_error() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");
    std::fs::write(&path, "{ not json").unwrap();

    let store = FileSessionStore::new(&path);
    assert!(matches!(store.get(LAST_UPLOADED_FILENAME), Err(Error::Storage(_))));
}

#[test]
fn test_blob_round_trip_and_delete() {
    let dir = TempDir::new().unwrap();
    let store = FileBlobStore::new(dir.path().join("blobs"));
    let asset = MediaAsset::new("walk.mp4", "video/mp4", vec![0, 1, 2, 254, 255]);

    let id = new_blob_id();
    store.save(&id, &BlobRecord::from_asset(&asset)).unwrap();

    let loaded = store.load(&id).unwrap().unwrap();
    assert_eq!(loaded.name, "walk.mp4");
    assert_eq!(loaded.mime_type, "video/mp4");
    assert_eq!(loaded.to_asset().unwrap().bytes, asset.bytes);

    store.delete(&id).unwrap();
    assert_eq!(store.load(&id).unwrap(), None);
    // Deleting twice is fine
    store.delete(&id).unwrap();
}

#[test]
fn test_unknown_blob_is_none() {
    let dir = TempDir::new().unwrap();
    let store = FileBlobStore::new(dir.path());
    assert_eq!(store.load(&new_blob_id()).unwrap(), None);
}

#[test]
fn test_blob_file_uses_record_field_names() {
    let dir = TempDir::new().unwrap();
    let store = FileBlobStore::new(dir.path());
    let id = new_blob_id();
    store
        .save(&id, &BlobRecord::from_asset(&MediaAsset::new("a.wav", "audio/wav", b"hi".to_vec())))
        .unwrap();

    let text = std::fs::read_to_string(dir.path().join(format!("{}.json", id))).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["name"], "a.wav");
    assert_eq!(value["type"], "audio/wav");
    assert_eq!(value["base64"], "aGk=");
}

fn blob_files(dir: &std::path::Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

#[test]
fn test_stored_blob_released_on_drop() {
    let dir = TempDir::new().unwrap();
    let store = FileBlobStore::new(dir.path().join("blobs"));
    let asset = MediaAsset::new("walk.mp4", "video/mp4", vec![1, 2, 3]);

    let id = {
        let stored = StoredBlob::save(&store, &asset).unwrap();
        assert!(store.load(stored.id()).unwrap().is_some());
        stored.id().to_string()
    };
    assert_eq!(store.load(&id).unwrap(), None);
    assert_eq!(blob_files(&dir.path().join("blobs")), 0);
}

#[test]
fn test_stored_blob_released_on_error_path() {
    let dir = TempDir::new().unwrap();
    let store = FileBlobStore::new(dir.path().join("blobs"));

    fn analyze(store: &FileBlobStore) -> pettalk_editor::Result<()> {
        let _stored = StoredBlob::save(store, &MediaAsset::new("a.wav", "audio/wav", vec![0; 16]))?;
        Err(Error::Config("invalid header value".to_string()))
    }

    assert!(matches!(analyze(&store), Err(Error::Config(_))));
    assert_eq!(blob_files(&dir.path().join("blobs")), 0);
}

/// Saves fine, refuses every delete
#[derive(Default)]
struct StickyBlobStore {
    delete_calls: AtomicUsize,
}

impl BlobStore for StickyBlobStore {
    fn save(&self, _id: &str, _record: &BlobRecord) -> pettalk_editor::Result<()> {
        Ok(())
    }

    fn load(&self, _id: &str) -> pettalk_editor::Result<Option<BlobRecord>> {
        Ok(None)
    }

    fn delete(&self, _id: &str) -> pettalk_editor::Result<()> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        Err(Error::Storage("disk is read-only".to_string()))
    }
}

#[test]
fn test_failed_release_keeps_caller_result() {
    let store = StickyBlobStore::default();

    fn analyze(store: &StickyBlobStore) -> pettalk_editor::Result<&'static str> {
        let _stored = StoredBlob::save(store, &MediaAsset::new("a.wav", "audio/wav", vec![]))?;
        Err(Error::Upload("HTTP 503".to_string()))
    }

    match analyze(&store) {
        Err(Error::Upload(message)) => assert_eq!(message, "HTTP 503"),
        other => panic!("expected the upload error, got {:?}", other),
    }
    assert_eq!(store.delete_calls.load(Ordering::SeqCst), 1);
}
