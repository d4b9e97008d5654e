use std::collections::{hash_map, HashMap};
use std::sync::Mutex;

use keyring::Entry;
use serde::{Deserialize, Serialize};

use super::{StoreError, TokenStore};

/// Keychain service name
const SERVICE_NAME: &str = "mamanhub";

/// The access/refresh token pair issued by the backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub access_token: String,
    pub refresh_token: String,
}

impl Credentials {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
        }
    }
}

/// Token store backed by the OS keychain, one entry per key.
///
/// Entries are opened once per key and reused, so every read and write for
/// a key goes through the same credential.
#[derive(Debug)]
pub struct KeyringTokenStore {
    service: String,
    entries: Mutex<HashMap<String, Entry>>,
}

impl KeyringTokenStore {
    pub fn new() -> Self {
        Self::with_service(SERVICE_NAME)
    }

    pub fn with_service(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            entries: Mutex::new(HashMap::new()),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    fn with_entry<T>(
        &self,
        key: &str,
        f: impl FnOnce(&Entry) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Poisoned)?;
        let entry = match entries.entry(key.to_string()) {
            hash_map::Entry::Occupied(slot) => slot.into_mut(),
            hash_map::Entry::Vacant(slot) => slot.insert(Entry::new(&self.service, key)?),
        };
        f(entry)
    }
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for KeyringTokenStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.with_entry(key, |entry| match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e.into()),
        })
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        self.with_entry(key, |entry| Ok(entry.set_password(value)?))
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.with_entry(key, |entry| match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e.into()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY};

    /// Keychain store running on keyring's in-memory mock backend
    fn mock_store() -> KeyringTokenStore {
        keyring::set_default_credential_builder(keyring::mock::default_credential_builder());
        KeyringTokenStore::with_service("mamanhub-test")
    }

    #[test]
    fn test_set_then_get_through_one_store() {
        let store = mock_store();
        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap(), None);

        store.set(ACCESS_TOKEN_KEY, "A1").unwrap();
        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("A1"));

        store.set(ACCESS_TOKEN_KEY, "A2").unwrap();
        assert_eq!(store.access_token().unwrap().as_deref(), Some("A2"));
    }

    #[test]
    fn test_credentials_roundtrip_and_clear() {
        let store = mock_store();
        store
            .save_credentials(&Credentials::new("A1", "R1"))
            .unwrap();
        assert_eq!(
            store.credentials().unwrap(),
            Some(Credentials::new("A1", "R1"))
        );

        store.clear_credentials().unwrap();
        assert_eq!(store.get(ACCESS_TOKEN_KEY).unwrap(), None);
        assert_eq!(store.get(REFRESH_TOKEN_KEY).unwrap(), None);

        // Deleting again is not an error
        store.delete(REFRESH_TOKEN_KEY).unwrap();
    }

    #[test]
    fn test_service_name() {
        assert_eq!(KeyringTokenStore::new().service(), "mamanhub");
    }
}
