use serde::de::DeserializeOwned;
use serde::Serialize;

/// String key/value persistence. Every operation fails silently: a broken
/// store degrades to "nothing persisted".
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str) -> bool;
    fn remove(&self, key: &str);
}

/// `window.localStorage`, or nothing at all when the browser denies access.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BrowserStorage {
    inner: Option<web_sys::Storage>,
}

impl BrowserStorage {
    pub fn open() -> Self {
        let mut inner = None;
        if let Some(window) = web_sys::window() {
            if let Ok(Some(storage)) = window.local_storage() {
                inner = Some(storage);
            }
        }
        if inner.is_none() {
            log::warn!("localStorage unavailable, nothing will be persisted");
        }
        Self { inner }
    }
}

impl KeyValueStore for BrowserStorage {
    fn get(&self, key: &str) -> Option<String> {
        if let Some(storage) = &self.inner {
            if let Ok(value) = storage.get_item(key) {
                return value;
            }
        }
        None
    }

    fn set(&self, key: &str, value: &str) -> bool {
        match &self.inner {
            Some(storage) => storage.set_item(key, value).is_ok(),
            None => false,
        }
    }

    fn remove(&self, key: &str) {
        if let Some(storage) = &self.inner {
            let _ = storage.remove_item(key);
        }
    }
}

pub fn load_json<T: DeserializeOwned>(store: &impl KeyValueStore, key: &str) -> Option<T> {
    let raw = store.get(key)?;
    match serde_json::from_str::<T>(&raw) {
        Ok(value) => Some(value),
        Err(err) => {
            log::warn!("Discarding unreadable `{}` entry: {}", key, err);
            store.remove(key);
            None
        }
    }
}

pub fn save_json<T: Serialize + ?Sized>(store: &impl KeyValueStore, key: &str, value: &T) -> bool {
    match serde_json::to_string(value) {
        Ok(raw) => store.set(key, &raw),
        Err(_) => false,
    }
}

#[cfg(test)]
pub(crate) mod memory {
    use super::KeyValueStore;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// In-memory stand-in for localStorage.
    #[derive(Default)]
    pub struct MemoryStore {
        items: RefCell<HashMap<String, String>>,
        read_only: bool,
    }

    impl MemoryStore {
        pub fn with(entries: &[(&str, &str)]) -> Self {
            let store = Self::default();
            for (k, v) in entries {
                store.items.borrow_mut().insert(k.to_string(), v.to_string());
            }
            store
        }

        pub fn read_only() -> Self {
            Self {
                read_only: true,
                ..Self::default()
            }
        }
    }

    impl KeyValueStore for MemoryStore {
        fn get(&self, key: &str) -> Option<String> {
            self.items.borrow().get(key).cloned()
        }

        fn set(&self, key: &str, value: &str) -> bool {
            if self.read_only {
                return false;
            }
            self.items
                .borrow_mut()
                .insert(key.to_string(), value.to_string());
            true
        }

        fn remove(&self, key: &str) {
            self.items.borrow_mut().remove(key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::memory::MemoryStore;
    use super::*;

    #[test]
    fn malformed_json_is_cleared() {
        let store = MemoryStore::with(&[("k", "{not json")]);
        assert_eq!(load_json::<Vec<u32>>(&store, "k"), None);
        assert_eq!(store.get("k"), None);
    }

    #[test]
    fn json_round_trip() {
        let store = MemoryStore::default();
        assert!(save_json(&store, "k", &vec![1, 2, 3]));
        assert_eq!(load_json::<Vec<u32>>(&store, "k"), Some(vec![1, 2, 3]));
    }

    #[test]
    fn failed_write_reports_false() {
        let store = MemoryStore::read_only();
        assert!(!save_json(&store, "k", &1));
        assert_eq!(store.get("k"), None);
    }
}
