use super::{KeyValueStore, Result, StorageError};
use async_trait::async_trait;
use std::{
    collections::HashMap,
    io::ErrorKind,
    path::{Path, PathBuf},
};
use tokio::{fs, sync::RwLock};
use tracing::debug;

/// File-based storage keeping one `<key>.json` file per key
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    cache: RwLock<HashMap<String, String>>,
}

impl FileStore {
    /// Open a file store rooted at `path`, creating the directory if needed
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if !fs::try_exists(&path).await? {
            debug!(path = %path.display(), "Creating storage directory");
            fs::create_dir_all(&path).await?;
        }
        Ok(Self {
            path,
            cache: RwLock::new(HashMap::new()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the file path for a key
    fn get_file_path(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && !key.starts_with('.')
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'));
        if !valid {
            return Err(StorageError::InvalidKey(key.to_string()));
        }
        Ok(self.path.join(format!("{}.json", key)))
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let file_path = self.get_file_path(key)?;

        // Try cache first
        if let Some(value) = self.cache.read().await.get(key) {
            return Ok(Some(value.clone()));
        }

        match fs::read_to_string(&file_path).await {
            Ok(content) => {
                self.cache
                    .write()
                    .await
                    .insert(key.to_string(), content.clone());
                Ok(Some(content))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let file_path = self.get_file_path(key)?;

        // Write beside the target and rename so readers never observe a torn file
        let tmp_path = self.path.join(format!("{}.json.tmp", key));
        fs::write(&tmp_path, value.as_bytes()).await?;
        fs::rename(&tmp_path, &file_path).await?;
        debug!(key, bytes = value.len(), "Wrote value to disk");

        self.cache.write().await.insert(key.to_string(), value);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let file_path = self.get_file_path(key)?;
        self.cache.write().await.remove(key);

        match fs::remove_file(&file_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    async fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        let mut entries = fs::read_dir(&self.path).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            if let Some(name) = entry.file_name().to_str() {
                if let Some(key) = name.strip_suffix(".json") {
                    keys.push(key.to_string());
                }
            }
        }
        keys.sort();
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_file_storage() {
        let temp_dir = tempdir().unwrap();
        let store = FileStore::open(temp_dir.path()).await.unwrap();

        store
            .set("userProgress", "{\"p1\":{}}".to_string())
            .await
            .unwrap();
        assert_eq!(
            store.get("userProgress").await.unwrap().as_deref(),
            Some("{\"p1\":{}}")
        );
        assert_eq!(store.keys().await.unwrap(), vec!["userProgress".to_string()]);

        store.remove("userProgress").await.unwrap();
        assert!(store.get("userProgress").await.unwrap().is_none());
        assert!(store.keys().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_storage_persistence() {
        let temp_dir = tempdir().unwrap();
        let store = FileStore::open(temp_dir.path()).await.unwrap();
        store.set("notes", "[1,2,3]".to_string()).await.unwrap();

        // Create new store instance with same path
        let reopened = FileStore::open(temp_dir.path()).await.unwrap();
        assert_eq!(
            reopened.get("notes").await.unwrap().as_deref(),
            Some("[1,2,3]")
        );
    }

    #[tokio::test]
    async fn test_creates_missing_directory() {
        let temp_dir = tempdir().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        let store = FileStore::open(&nested).await.unwrap();
        assert!(nested.is_dir());
        assert_eq!(store.path(), nested.as_path());
    }

    #[tokio::test]
    async fn test_remove_absent_key_is_noop() {
        let temp_dir = tempdir().unwrap();
        let store = FileStore::open(temp_dir.path()).await.unwrap();
        store.remove("favorites").await.unwrap();
    }

    #[tokio::test]
    async fn test_rejects_path_like_keys() {
        let temp_dir = tempdir().unwrap();
        let store = FileStore::open(temp_dir.path()).await.unwrap();

        for key in ["", "../escape", ".hidden", "a/b", "with space"] {
            let err = store.set(key, "1".to_string()).await.unwrap_err();
            assert!(matches!(err, StorageError::InvalidKey(_)), "{key}");
        }
    }

    #[tokio::test]
    async fn test_no_temp_file_left_behind() {
        let temp_dir = tempdir().unwrap();
        let store = FileStore::open(temp_dir.path()).await.unwrap();
        store.set("notes", "[]".to_string()).await.unwrap();

        let names: Vec<_> = std::fs::read_dir(temp_dir.path())
            .unwrap()
            .flatten()
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["notes.json".to_string()]);
    }
}
