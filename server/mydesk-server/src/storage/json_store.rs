//! One JSON document per collection file
//!
//! Every read-modify-write cycle holds the store's async mutex, so writes to
//! a collection are serialised. Files are replaced atomically via a
//! temporary file and a rename.

use error_common::{DeskError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use tokio::sync::{Mutex, MutexGuard};

pub struct JsonStore<T> {
    path: PathBuf,
    lock: Mutex<()>,
    _marker: PhantomData<fn() -> T>,
}

/// Value loaded under the store lock; [`Locked::commit`] writes it back
pub struct Locked<'a, T: Serialize> {
    store: &'a JsonStore<T>,
    _guard: MutexGuard<'a, ()>,
    pub value: T,
}

impl<T> JsonStore<T>
where
    T: Serialize + DeserializeOwned + Default,
{
    /// Open the file at `path`, writing `seed` when it does not exist yet
    pub async fn open(path: impl Into<PathBuf>, seed: T) -> Result<Self> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let store = Self {
            path,
            lock: Mutex::new(()),
            _marker: PhantomData,
        };
        if !tokio::fs::try_exists(&store.path).await? {
            tracing::info!(path = %store.path.display(), "Seeding collection file");
            store.write(&seed).await?;
        }
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current contents
    pub async fn load(&self) -> Result<T> {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    /// Lock the collection and load it for modification
    pub async fn lock(&self) -> Result<Locked<'_, T>> {
        let guard = self.lock.lock().await;
        let value = self.read().await?;
        Ok(Locked {
            store: self,
            _guard: guard,
            value,
        })
    }

    /// Replace the whole document
    pub async fn replace(&self, value: &T) -> Result<()> {
        let _guard = self.lock.lock().await;
        self.write(value).await
    }

    async fn read(&self) -> Result<T> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(T::default());
        }
        serde_json::from_str(&raw).map_err(|e| {
            DeskError::StorageError(format!("{} is not valid JSON: {e}", self.path.display()))
        })
    }

    async fn write(&self, value: &T) -> Result<()> {
        let body = serde_json::to_string_pretty(value)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp, body).await?;
        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

impl<T> Locked<'_, T>
where
    T: Serialize + DeserializeOwned + Default,
{
    /// Persist `value` and release the lock
    pub async fn commit(self) -> Result<()> {
        self.store.write(&self.value).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_open_seeds_missing_file() {
        let dir = TempDir::new().unwrap();
        let store = JsonStore::open(dir.path().join("offices.json"), vec!["HR".to_string()])
            .await
            .unwrap();
        assert_eq!(store.load().await.unwrap(), vec!["HR".to_string()]);

        // Existing content is never overwritten by the seed
        store.replace(&vec!["Accounts".to_string()]).await.unwrap();
        let reopened = JsonStore::open(store.path().to_path_buf(), vec!["HR".to_string()])
            .await
            .unwrap();
        assert_eq!(reopened.load().await.unwrap(), vec!["Accounts".to_string()]);
    }

    #[tokio::test]
    async fn test_locked_commit() {
        let dir = TempDir::new().unwrap();
        let store: JsonStore<Vec<u32>> = JsonStore::open(dir.path().join("n.json"), Vec::new())
            .await
            .unwrap();

        let mut locked = store.lock().await.unwrap();
        locked.value.push(7);
        locked.commit().await.unwrap();

        // Dropped without commit: no change
        let mut locked = store.lock().await.unwrap();
        locked.value.push(8);
        drop(locked);

        assert_eq!(store.load().await.unwrap(), vec![7]);
    }

    #[tokio::test]
    async fn test_malformed_file_is_a_storage_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.json");
        std::fs::write(&path, "{oops").unwrap();
        let store: JsonStore<Vec<u32>> = JsonStore::open(&path, Vec::new()).await.unwrap();
        assert!(matches!(store.load().await, Err(DeskError::StorageError(_))));
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_serialised() {
        let dir = TempDir::new().unwrap();
        let store: std::sync::Arc<JsonStore<Vec<u32>>> = std::sync::Arc::new(
            JsonStore::open(dir.path().join("c.json"), Vec::new())
                .await
                .unwrap(),
        );

        let mut handles = Vec::new();
        for i in 0..10 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let mut locked = store.lock().await.unwrap();
                locked.value.push(i);
                locked.commit().await.unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }
        assert_eq!(store.load().await.unwrap().len(), 10);
    }
}
