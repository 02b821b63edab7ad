//! Key/value persistence backends for client-side state

use crate::error::{ClientError, Result};
use papaya::HashMap;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

/// Persistent string key/value storage
pub trait Storage: Send + Sync + 'static {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;
}

/// Thread-safe in-memory storage using Papaya HashMap
#[derive(Clone)]
pub struct MemoryStorage {
    entries: Arc<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(HashMap::new()),
        }
    }
}

impl Default for MemoryStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for MemoryStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.pin().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries.pin().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries.pin().remove(key);
        Ok(())
    }
}

/// Storage backed by a single JSON object on disk
///
/// Every write goes to a sibling temp file that is then renamed over the
/// state file. A state file that no longer parses is rebuilt from empty on
/// the next write. Writers inside one process are serialized; other
/// processes sharing the file are not coordinated.
pub struct FileStorage {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn tmp_path(&self) -> PathBuf {
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        PathBuf::from(tmp)
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(BTreeMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(ClientError::Storage(format!(
                "failed to read {}: {e}",
                self.path.display()
            ))),
        }
    }

    fn write_all(&self, entries: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                ClientError::Storage(format!("failed to create {}: {e}", parent.display()))
            })?;
        }

        let raw = serde_json::to_string_pretty(entries)?;
        let tmp_path = self.tmp_path();
        fs::write(&tmp_path, raw).map_err(|e| {
            ClientError::Storage(format!("failed to write {}: {e}", tmp_path.display()))
        })?;

        if let Err(e) = fs::rename(&tmp_path, &self.path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(ClientError::Storage(format!(
                "failed to replace {}: {e}",
                self.path.display()
            )));
        }

        debug!(path = %self.path.display(), keys = entries.len(), "Storage file written");
        Ok(())
    }

    fn update<F>(&self, apply: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| ClientError::Storage("storage lock poisoned".to_string()))?;

        let mut entries = match self.read_all() {
            Ok(entries) => entries,
            Err(ClientError::Serialization(e)) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Storage file is corrupt, starting from empty"
                );
                BTreeMap::new()
            }
            Err(e) => return Err(e),
        };
        apply(&mut entries);
        self.write_all(&entries)
    }
}

impl Storage for FileStorage {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| ClientError::Storage("storage lock poisoned".to_string()))?;

        Ok(self.read_all()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_storage() {
        let storage = MemoryStorage::new();

        assert_eq!(storage.get("accessToken").unwrap(), None);

        storage.set("accessToken", "tok1").unwrap();
        storage.set("accessToken", "tok2").unwrap();
        assert_eq!(storage.get("accessToken").unwrap().as_deref(), Some("tok2"));

        storage.remove("accessToken").unwrap();
        assert_eq!(storage.get("accessToken").unwrap(), None);
    }

    #[test]
    fn test_memory_storage_clones_share_entries() {
        let storage = MemoryStorage::new();
        let other = storage.clone();

        storage.set("k", "v").unwrap();
        assert_eq!(other.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_file_storage_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("state.json");

        let storage = FileStorage::new(&path);
        storage.set("accessToken", "tok1").unwrap();
        storage.set("theme", "dark").unwrap();
        drop(storage);

        let reopened = FileStorage::new(&path);
        assert_eq!(reopened.get("accessToken").unwrap().as_deref(), Some("tok1"));
        assert_eq!(reopened.get("theme").unwrap().as_deref(), Some("dark"));

        reopened.remove("accessToken").unwrap();
        assert_eq!(reopened.get("accessToken").unwrap(), None);
        assert_eq!(reopened.get("theme").unwrap().as_deref(), Some("dark"));
    }

    #[test]
    fn test_file_storage_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileStorage::new(dir.path().join("absent.json"));

        assert_eq!(storage.get("accessToken").unwrap(), None);
    }

    #[test]
    fn test_file_storage_rejects_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        fs::write(&path, "not json").unwrap();

        let storage = FileStorage::new(&path);
        assert!(matches!(
            storage.get("accessToken"),
            Err(ClientError::Serialization(_))
        ));
    }

    #[test]
    fn test_file_storage_write_repairs_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        // Left behind by an interrupted write
        fs::write(&path, r#"{"accessToken": "tok"#).unwrap();

        let storage = FileStorage::new(&path);
        storage.set("accessToken", "tok1").unwrap();
        assert_eq!(storage.get("accessToken").unwrap().as_deref(), Some("tok1"));

        storage.remove("accessToken").unwrap();
        assert_eq!(storage.get("accessToken").unwrap(), None);
    }

    #[test]
    fn test_file_storage_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");

        let storage = FileStorage::new(&path);
        storage.set("accessToken", "tok1").unwrap();

        assert!(path.exists());
        assert!(!dir.path().join("state.json.tmp").exists());
    }
}
