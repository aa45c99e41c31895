//! Local Store
//!
//! The client's key-value persistence. Each collection is one JSON document
//! under a fixed key. Reading a key that is absent or holds malformed JSON
//! yields the caller's default and logs a warning; writes that fail are
//! logged and swallowed, the caller continues.

use crate::error::{SyncError, SyncResult};
use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Fixed Local Store keys
pub mod keys {
    pub const INWARD: &str = "myDesk_inward";
    pub const OUTWARD: &str = "myDesk_outward";
    pub const ATTENDANCE: &str = "myDesk_attendance";
    pub const TASKS: &str = "myDesk_tasks";
    pub const PROFILE: &str = "myDesk_profile";
    pub const OFFICES: &str = "myDesk_offices";
    /// Migration flag, the string `"1"` once a reconciliation has run
    pub const MIGRATED: &str = "myDesk_migrated";

    /// Export-file field name to Local Store key
    pub const EXPORT_FIELDS: [(&str, &str); 6] = [
        ("inward", INWARD),
        ("outward", OUTWARD),
        ("attendance", ATTENDANCE),
        ("tasks", TASKS),
        ("profile", PROFILE),
        ("offices", OFFICES),
    ];
}

/// Raw key-value access
pub trait LocalStore: Send + Sync {
    /// Raw string stored under `key`, `None` when absent
    fn get_raw(&self, key: &str) -> SyncResult<Option<String>>;

    fn set_raw(&self, key: &str, value: &str) -> SyncResult<()>;

    fn remove(&self, key: &str) -> SyncResult<()>;
}

/// Typed JSON access on top of [`LocalStore`]
pub trait LocalStoreExt: LocalStore {
    /// Decode the document under `key`, falling back to `default` when the
    /// key is absent, unreadable or malformed
    fn get_or<T: DeserializeOwned>(&self, key: &str, default: T) -> T {
        match self.get_raw(key) {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => value,
                Err(e) => {
                    tracing::warn!(key, error = %e, "Malformed local value, using default");
                    default
                }
            },
            Ok(None) => default,
            Err(e) => {
                tracing::warn!(key, error = %e, "Local read failed, using default");
                default
            }
        }
    }

    /// Encode and store `value`; failures are logged and reported as `false`
    fn set<T: Serialize + ?Sized>(&self, key: &str, value: &T) -> bool {
        let result = serde_json::to_string(value)
            .map_err(SyncError::from)
            .and_then(|raw| self.set_raw(key, &raw));
        match result {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(key, error = %e, "Local write failed");
                false
            }
        }
    }
}

impl<S: LocalStore + ?Sized> LocalStoreExt for S {}

// ---------------------------------------------------------------------------
// In-memory store
// ---------------------------------------------------------------------------

/// Volatile store
#[derive(Debug, Default)]
pub struct MemoryLocalStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryLocalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded from raw key/value pairs
    pub fn with_entries<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            entries: RwLock::new(
                entries
                    .into_iter()
                    .map(|(k, v)| (k.into(), v.into()))
                    .collect(),
            ),
        }
    }

    /// Raw snapshot of every key
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.entries.read().clone()
    }
}

impl LocalStore for MemoryLocalStore {
    fn get_raw(&self, key: &str) -> SyncResult<Option<String>> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set_raw(&self, key: &str, value: &str) -> SyncResult<()> {
        self.entries.write().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> SyncResult<()> {
        self.entries.write().remove(key);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Export snapshot
// ---------------------------------------------------------------------------

/// Store built from a client "local export" file. Writes stay in memory and
/// never reach the file, so a run against a snapshot is never persisted as
/// migrated.
#[derive(Debug, Default)]
pub struct SnapshotLocalStore {
    inner: MemoryLocalStore,
}

impl SnapshotLocalStore {
    /// Store seeded from a client export document: a JSON object with any of
    /// the fields `inward`, `outward`, `attendance`, `tasks`, `profile` and
    /// `offices`. Fields that are absent leave the key absent.
    pub fn from_export_json(export: &Value) -> SyncResult<Self> {
        let object = export.as_object().ok_or_else(|| {
            SyncError::InvalidOperation("Export document must be a JSON object".to_string())
        })?;

        let store = MemoryLocalStore::new();
        for (field, key) in keys::EXPORT_FIELDS {
            if let Some(value) = object.get(field) {
                store.set_raw(key, &serde_json::to_string(value)?)?;
            }
        }
        Ok(Self { inner: store })
    }

    /// Read and load an export file
    pub fn from_export_file(path: &Path) -> SyncResult<Self> {
        let raw = std::fs::read_to_string(path)?;
        let export: Value = serde_json::from_str(&raw)?;
        Self::from_export_json(&export)
    }
}

impl LocalStore for SnapshotLocalStore {
    fn get_raw(&self, key: &str) -> SyncResult<Option<String>> {
        self.inner.get_raw(key)
    }

    fn set_raw(&self, key: &str, value: &str) -> SyncResult<()> {
        self.inner.set_raw(key, value)
    }

    fn remove(&self, key: &str) -> SyncResult<()> {
        self.inner.remove(key)
    }
}

// ---------------------------------------------------------------------------
// Directory-backed store
// ---------------------------------------------------------------------------

/// One `<key>.json` file per key inside a directory
#[derive(Debug, Clone)]
pub struct FileLocalStore {
    dir: PathBuf,
}

impl FileLocalStore {
    /// Open (creating if needed) the store directory
    pub fn open(dir: impl Into<PathBuf>) -> SyncResult<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> SyncResult<PathBuf> {
        if key.is_empty() || key.contains(['/', '\\']) || key.starts_with('.') {
            return Err(SyncError::LocalStorage(format!("Invalid key: {key}")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl LocalStore for FileLocalStore {
    fn get_raw(&self, key: &str) -> SyncResult<Option<String>> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(raw) => Ok(Some(raw)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_raw(&self, key: &str, value: &str) -> SyncResult<()> {
        let path = self.path_for(key)?;
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, value)?;
        std::fs::rename(&tmp, &path)?;
        Ok(())
    }

    fn remove(&self, key: &str) -> SyncResult<()> {
        let path = self.path_for(key)?;
        match std::fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::TempDir;

    #[test]
    fn test_get_or_falls_back_on_malformed_json() {
        let store = MemoryLocalStore::with_entries([(keys::TASKS, "{not json")]);
        let tasks: Vec<Value> = store.get_or(keys::TASKS, Vec::new());
        assert!(tasks.is_empty());

        let missing: Vec<String> = store.get_or(keys::OFFICES, vec!["x".to_string()]);
        assert_eq!(missing, vec!["x".to_string()]);
    }

    #[test]
    fn test_export_loading_maps_fields_to_keys() {
        let store = SnapshotLocalStore::from_export_json(&json!({
            "inward": [{ "fileNo": "1" }],
            "offices": ["HR"],
            "unrelated": true
        }))
        .unwrap();

        let offices: Vec<String> = store.get_or(keys::OFFICES, Vec::new());
        assert_eq!(offices, vec!["HR".to_string()]);
        assert!(store.get_raw(keys::INWARD).unwrap().is_some());
        assert!(store.get_raw(keys::TASKS).unwrap().is_none());
        assert_eq!(store.inner.snapshot().len(), 2);
    }

    #[test]
    fn test_export_must_be_object() {
        assert!(SnapshotLocalStore::from_export_json(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_file_store_roundtrip() {
        let dir = TempDir::new().unwrap();
        let store = FileLocalStore::open(dir.path()).unwrap();

        assert!(store.set(keys::OFFICES, &vec!["HR".to_string()]));
        let offices: Vec<String> = store.get_or(keys::OFFICES, Vec::new());
        assert_eq!(offices, vec!["HR".to_string()]);

        store.set_raw(keys::MIGRATED, "1").unwrap();
        assert_eq!(store.get_raw(keys::MIGRATED).unwrap().as_deref(), Some("1"));
        assert!(dir.path().join("myDesk_migrated.json").exists());

        store.remove(keys::MIGRATED).unwrap();
        assert!(store.get_raw(keys::MIGRATED).unwrap().is_none());
    }

    #[test]
    fn test_file_store_rejects_path_keys() {
        let dir = TempDir::new().unwrap();
        let store = FileLocalStore::open(dir.path()).unwrap();
        assert!(store.set_raw("../escape", "x").is_err());
    }
}
