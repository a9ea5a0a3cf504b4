use std::collections::HashMap;

use parking_lot::RwLock;
use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

pub const CARDS_KEY: &str = "cards_data";
pub const PREFERENCES_KEY: &str = "app_preferences";
pub const DISMISSALS_KEY: &str = "reminder_dismissals";
pub const GLOBAL_REMINDERS_KEY: &str = "global_custom_reminders";
pub const BILL_NUDGE_KEY: &str = "missing_bill_nudge";

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to read `{key}`")]
    Read {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write `{key}`")]
    Write {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to remove `{key}`")]
    Remove {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to encode value for `{key}`")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// String-keyed persistence shared by every store in this crate.
///
/// Platform adapters (secure storage, a file directory, ...) implement this trait. Values are
/// opaque strings; the typed stores layer JSON on top with [`read_json`] and [`write_json`].
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Outcome of decoding a stored JSON payload.
#[derive(Debug)]
pub enum Stored<T> {
    Missing,
    Corrupt(serde_json::Error),
    Value(T),
}

impl<T> Stored<T> {
    /// Treats missing and corrupt payloads alike, logging the latter.
    pub fn or_default_logged(self, key: &str) -> T
    where
        T: Default,
    {
        match self {
            Stored::Value(value) => value,
            Stored::Missing => T::default(),
            Stored::Corrupt(err) => {
                tracing::warn!(%key, %err, "discarding unreadable payload");
                T::default()
            }
        }
    }
}

pub fn read_json<T: DeserializeOwned>(
    store: &dyn KeyValueStore,
    key: &str,
) -> Result<Stored<T>, StorageError> {
    let Some(raw) = store.get(key)? else {
        return Ok(Stored::Missing);
    };
    if raw.trim().is_empty() {
        return Ok(Stored::Missing);
    }
    Ok(match serde_json::from_str(&raw) {
        Ok(value) => Stored::Value(value),
        Err(err) => Stored::Corrupt(err),
    })
}

pub fn write_json<T: Serialize + ?Sized>(
    store: &dyn KeyValueStore,
    key: &str,
    value: &T,
) -> Result<(), StorageError> {
    let payload = serde_json::to_string(value).map_err(|source| StorageError::Encode {
        key: key.to_string(),
        source,
    })?;
    store.set(key, &payload)
}

/// Volatile store, used by tests and as a scratch backend.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries.read().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.entries
            .write()
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.entries.write().remove(key);
        Ok(())
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn json_helpers_distinguish_missing_corrupt_and_present() {
        let store = MemoryStore::new();
        let missing: Stored<BTreeMap<String, i64>> = read_json(&store, "k").unwrap();
        assert!(matches!(missing, Stored::Missing));

        store.set("k", "{not json").unwrap();
        let corrupt: Stored<BTreeMap<String, i64>> = read_json(&store, "k").unwrap();
        assert!(matches!(corrupt, Stored::Corrupt(_)));

        let mut map = BTreeMap::new();
        map.insert("a".to_string(), 3_i64);
        write_json(&store, "k", &map).unwrap();
        let present: Stored<BTreeMap<String, i64>> = read_json(&store, "k").unwrap();
        match present {
            Stored::Value(value) => assert_eq!(value, map),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn corrupt_payload_falls_back_to_default() {
        let store = MemoryStore::new();
        store.set("k", "[1,2").unwrap();
        let value: Vec<u32> = read_json(&store, "k").unwrap().or_default_logged("k");
        assert!(value.is_empty());
    }

    #[test]
    fn memory_store_removes_entries() {
        let store = MemoryStore::new();
        store.set("a", "1").unwrap();
        assert_eq!(store.len(), 1);
        store.remove("a").unwrap();
        assert!(store.is_empty());
        assert_eq!(store.get("a").unwrap(), None);
    }
}
