use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

use super::{StoreError, TokenStore};

/// Session file name in cache directory
const SESSION_FILE: &str = "session.json";

/// Token store persisted as a JSON object on disk.
///
/// Every operation reads the file, applies the change and writes it back;
/// a mutex serializes operations within the process.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileTokenStore {
    /// Store tokens in `session.json` inside the given cache directory
    pub fn in_dir(cache_dir: &Path) -> Self {
        Self::new(cache_dir.join(SESSION_FILE))
    }

    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>, StoreError> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn save(&self, values: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if values.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path)?;
            }
            return Ok(());
        }
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, contents)?;
        debug!(path = %self.path.display(), "Saved session file");
        Ok(())
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut values = self.load()?;
        values.insert(key.to_string(), value.to_string());
        self.save(&values)
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let _guard = self.lock.lock().map_err(|_| StoreError::Poisoned)?;
        let mut values = self.load()?;
        if values.remove(key).is_some() {
            self.save(&values)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Credentials, ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

    #[test]
    fn test_file_store_persists_across_instances() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::in_dir(dir.path());
        store.save_credentials(&Credentials::new("A1", "R1")).unwrap();
        assert!(store.path().exists());

        let reopened = FileTokenStore::in_dir(dir.path());
        assert_eq!(reopened.access_token().unwrap().as_deref(), Some("A1"));
        assert_eq!(reopened.refresh_token().unwrap().as_deref(), Some("R1"));
    }

    #[test]
    fn test_file_store_layout_uses_stable_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::in_dir(dir.path());
        store.save_credentials(&Credentials::new("A1", "R1")).unwrap();

        let contents = std::fs::read_to_string(store.path()).unwrap();
        let parsed: BTreeMap<String, String> = serde_json::from_str(&contents).unwrap();
        assert_eq!(parsed.get(ACCESS_TOKEN_KEY).map(String::as_str), Some("A1"));
        assert_eq!(parsed.get(REFRESH_TOKEN_KEY).map(String::as_str), Some("R1"));
    }

    #[test]
    fn test_clear_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::in_dir(dir.path());
        store.save_credentials(&Credentials::new("A1", "R1")).unwrap();

        store.clear_credentials().unwrap();
        assert!(!store.path().exists());
        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap(), None);

        // Clearing an empty store is fine
        store.clear_credentials().unwrap();
    }

    #[test]
    fn test_corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::in_dir(dir.path());
        std::fs::write(store.path(), "{not json").unwrap();
        assert!(matches!(store.get(ACCESS_TOKEN_KEY), Err(StoreError::Json(_))));
    }
}
