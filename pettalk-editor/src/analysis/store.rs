//! Session and blob persistence
//!
//! The session store remembers small string settings across process
//! restarts, most importantly the filename of the last upload so a poll can
//! resume after a restart. The blob store keeps uploaded media by id.

use crate::audio::types::MediaAsset;
use crate::error::{Error, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

/// Filename of the most recent upload
pub const LAST_UPLOADED_FILENAME: &str = "last_uploaded_filename";
/// Start of the last completed selection, seconds
pub const SELECTED_START_TIME: &str = "selected_start_time";
/// End of the last completed selection, seconds
pub const SELECTED_END_TIME: &str = "selected_end_time";

/// String key/value settings. Last write wins.
pub trait SessionStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// In-process store, lost on exit
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, BTreeMap<String, String>>> {
        self.values
            .lock()
            .map_err(|_| Error::Storage("session store lock poisoned".to_string()))
    }
}

impl SessionStore for MemorySessionStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.lock()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.lock()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.lock()?.remove(key);
        Ok(())
    }
}

/// Store backed by a single JSON object file
#[derive(Debug)]
pub struct FileSessionStore {
    path: PathBuf,
    // Serializes read-modify-write cycles within this process
    guard: Mutex<()>,
}

impl FileSessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            guard: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_map(&self) -> Result<BTreeMap<String, String>> {
        match std::fs::read_to_string(&self.path) {
            Ok(text) if text.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(text) => serde_json::from_str(&text).map_err(|e| {
                Error::Storage(format!("Corrupt session file {}: {}", self.path.display(), e))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    fn write_map(&self, map: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let text = serde_json::to_string_pretty(map)
            .map_err(|e| Error::Storage(format!("Failed to serialize session: {}", e)))?;
        std::fs::write(&self.path, text)?;
        Ok(())
    }

    fn update<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _held = self
            .guard
            .lock()
            .map_err(|_| Error::Storage("session store lock poisoned".to_string()))?;
        let mut map = self.read_map()?;
        change(&mut map);
        self.write_map(&map)
    }
}

impl SessionStore for FileSessionStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.read_map()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        debug!("Session {} = {}", key, value);
        self.update(|map| {
            map.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|map| {
            map.remove(key);
        })
    }
}

/// A stored media file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlobRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub mime_type: String,
    /// Standard base64 of the file bytes
    pub base64: String,
}

impl BlobRecord {
    pub fn from_asset(asset: &MediaAsset) -> Self {
        Self {
            name: asset.name.clone(),
            mime_type: asset.mime_type.clone(),
            base64: BASE64.encode(&asset.bytes),
        }
    }

    pub fn to_asset(&self) -> Result<MediaAsset> {
        let bytes = BASE64
            .decode(&self.base64)
            .map_err(|e| Error::Storage(format!("Corrupt blob payload for {}: {}", self.name, e)))?;
        Ok(MediaAsset::new(self.name.clone(), self.mime_type.clone(), bytes))
    }
}

/// Fresh opaque blob id
pub fn new_blob_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Id-addressed media persistence
pub trait BlobStore: Send + Sync {
    fn save(&self, id: &str, record: &BlobRecord) -> Result<()>;
    /// `None` for an unknown id
    fn load(&self, id: &str) -> Result<Option<BlobRecord>>;
    fn delete(&self, id: &str) -> Result<()>;
}

/// One JSON file per blob under a directory
#[derive(Debug, Clone)]
pub struct FileBlobStore {
    dir: PathBuf,
}

impl FileBlobStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn record_path(&self, id: &str) -> Result<PathBuf> {
        let safe = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !safe {
            return Err(Error::Storage(format!("Invalid blob id '{}'", id)));
        }
        Ok(self.dir.join(format!("{}.json", id)))
    }
}

impl BlobStore for FileBlobStore {
    fn save(&self, id: &str, record: &BlobRecord) -> Result<()> {
        let path = self.record_path(id)?;
        std::fs::create_dir_all(&self.dir)?;
        let text = serde_json::to_string(record)
            .map_err(|e| Error::Storage(format!("Failed to serialize blob: {}", e)))?;
        std::fs::write(&path, text)?;
        debug!("Saved blob {} ({})", id, record.name);
        Ok(())
    }

    fn load(&self, id: &str) -> Result<Option<BlobRecord>> {
        let path = self.record_path(id)?;
        let text = match std::fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| Error::Storage(format!("Corrupt blob {}: {}", id, e)))
    }

    fn delete(&self, id: &str) -> Result<()> {
        match std::fs::remove_file(self.record_path(id)?) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// A blob saved for the length of one operation.
///
/// The record is deleted when the guard drops, on success and on every
/// error path. A failed delete is logged and never replaces the caller's
/// own result.
pub struct StoredBlob<'a> {
    store: &'a dyn BlobStore,
    id: String,
}

impl<'a> StoredBlob<'a> {
    pub fn save(store: &'a dyn BlobStore, asset: &MediaAsset) -> Result<Self> {
        let id = new_blob_id();
        store.save(&id, &BlobRecord::from_asset(asset))?;
        Ok(Self { store, id })
    }

    pub fn id(&self) -> &str {
        &self.id
    }
}

impl Drop for StoredBlob<'_> {
    fn drop(&mut self) {
        match self.store.delete(&self.id) {
            Ok(()) => debug!("Released blob {}", self.id),
            Err(e) => warn!("Failed to delete blob {}: {}", self.id, e),
        }
    }
}
