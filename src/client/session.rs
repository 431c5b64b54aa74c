use serde::{Serialize, de::DeserializeOwned};
use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};
use tracing::warn;

/// Client-side key/value store backing the login state.
///
/// Values are JSON encoded. With a path every write is flushed to disk;
/// a missing or corrupt file starts empty.
#[derive(Debug)]
pub struct SessionStore {
    path: Option<PathBuf>,
    entries: Mutex<BTreeMap<String, serde_json::Value>>,
}

impl SessionStore {
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let entries = match std::fs::read(&path) {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|err| {
                warn!(path = %path.display(), "discarding corrupt client state: {err}");
                BTreeMap::new()
            }),
            Err(_) => BTreeMap::new(),
        };
        Self {
            path: Some(path),
            entries: Mutex::new(entries),
        }
    }

    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let entries = self.lock();
        let value = entries.get(key)?.clone();
        serde_json::from_value(value).ok()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.lock().contains_key(key)
    }

    pub fn set<T: Serialize>(&self, key: &str, value: &T) {
        let Ok(value) = serde_json::to_value(value) else {
            warn!(key, "value could not be encoded");
            return;
        };
        let mut entries = self.lock();
        entries.insert(key.to_string(), value);
        self.flush(&entries);
    }

    pub fn remove(&self, key: &str) {
        let mut entries = self.lock();
        if entries.remove(key).is_some() {
            self.flush(&entries);
        }
    }

    pub fn clear(&self) {
        let mut entries = self.lock();
        entries.clear();
        self.flush(&entries);
    }

    fn lock(&self) -> MutexGuard<'_, BTreeMap<String, serde_json::Value>> {
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn flush(&self, entries: &BTreeMap<String, serde_json::Value>) {
        let Some(path) = &self.path else {
            return;
        };
        if let Some(parent) = path.parent() {
            if let Err(err) = std::fs::create_dir_all(parent) {
                warn!(path = %path.display(), "failed to create client state dir: {err}");
                return;
            }
        }
        let result = serde_json::to_vec_pretty(entries)
            .map_err(std::io::Error::other)
            .and_then(|payload| std::fs::write(path, payload));
        if let Err(err) = result {
            warn!(path = %path.display(), "failed to save client state: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn values_survive_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.json");

        let store = SessionStore::open(&path);
        store.set("fitlady_auth_token", &"abc");
        store.set("fitlady_remember_me", &true);
        drop(store);

        let store = SessionStore::open(&path);
        assert_eq!(store.get::<String>("fitlady_auth_token").as_deref(), Some("abc"));
        assert_eq!(store.get::<bool>("fitlady_remember_me"), Some(true));

        store.remove("fitlady_auth_token");
        assert!(!store.contains("fitlady_auth_token"));
        store.clear();
        assert!(SessionStore::open(&path).get::<bool>("fitlady_remember_me").is_none());
    }

    #[test]
    fn corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("client.json");
        std::fs::write(&path, b"][").unwrap();

        let store = SessionStore::open(&path);
        assert!(store.get::<String>("anything").is_none());
        store.set("k", &1);
        assert_eq!(store.get::<i32>("k"), Some(1));
    }

    #[test]
    fn last_write_wins() {
        let store = SessionStore::in_memory();
        store.set("mode", &"admin");
        store.set("mode", &"member");
        assert_eq!(store.get::<String>("mode").as_deref(), Some("member"));
    }
}
