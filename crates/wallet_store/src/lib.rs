use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::instrument;
use walkdir::WalkDir;

use wallet_domain::storage::{KeyValueStore, StorageError};
use wallet_domain::WalletService;

pub const DATA_DIR_ENV: &str = "CARD_WALLET_DATA_DIR";
const DEFAULT_DATA_DIR: &str = "wallet-data";
const EXTENSION: &str = "json";

/// Where the wallet keeps its data on this device.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StoreConfig {
    pub data_dir: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
        }
    }
}

impl StoreConfig {
    pub fn from_env() -> Self {
        match std::env::var(DATA_DIR_ENV) {
            Ok(dir) if !dir.trim().is_empty() => Self {
                data_dir: PathBuf::from(dir),
            },
            _ => Self::default(),
        }
    }

    pub fn open(&self) -> Result<FileStore> {
        FileStore::open(&self.data_dir)
    }
}

/// Key-value store keeping one file per key inside a data directory.
///
/// Writes go to a temporary sibling first and are renamed into place, so a reader never sees a
/// half-written value.
#[derive(Debug)]
pub struct FileStore {
    root: PathBuf,
    write_lock: Mutex<()>,
}

impl FileStore {
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root)
            .with_context(|| format!("failed to create data directory `{}`", root.display()))?;
        anyhow::ensure!(
            root.is_dir(),
            "data directory `{}` is not a directory",
            root.display()
        );
        Ok(Self {
            root,
            write_lock: Mutex::new(()),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.root.join(format!("{}.{EXTENSION}", encode_key(key)))
    }

    /// Keys currently stored, sorted.
    pub fn keys(&self) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for entry in WalkDir::new(&self.root).min_depth(1).max_depth(1) {
            let entry = entry?;
            let path = entry.path();
            if !entry.file_type().is_file() || !has_store_extension(path) {
                continue;
            }
            if let Some(key) = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .and_then(decode_key)
            {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }

    /// Removes every stored key.
    #[instrument(skip(self), fields(root = %self.root.display()))]
    pub fn clear(&self) -> Result<()> {
        for key in self.keys()? {
            self.remove(&key)?;
        }
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        match fs::read_to_string(self.path_for(key)) {
            Ok(raw) => Ok(Some(raw)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(source) => Err(StorageError::Read {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        let target = self.path_for(key);
        let staging = self.root.join(format!(".{}.tmp", encode_key(key)));
        let write = || -> std::io::Result<()> {
            let mut file = fs::File::create(&staging)?;
            file.write_all(value.as_bytes())?;
            file.sync_all()?;
            fs::rename(&staging, &target)
        };
        write().map_err(|source| {
            let _ = fs::remove_file(&staging);
            StorageError::Write {
                key: key.to_string(),
                source,
            }
        })?;
        tracing::debug!(%key, bytes = value.len(), "stored value");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        let _guard = self.write_lock.lock();
        match fs::remove_file(self.path_for(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Remove {
                key: key.to_string(),
                source,
            }),
        }
    }
}

/// Wires a [`WalletService`] onto the configured data directory.
pub fn build_wallet_service(config: &StoreConfig) -> Result<WalletService> {
    let store: Arc<dyn KeyValueStore> = Arc::new(config.open()?);
    tracing::debug!(data_dir = %config.data_dir.display(), "opening wallet store");
    WalletService::builder().with_store(store).build()
}

fn has_store_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(EXTENSION))
        .unwrap_or(false)
}

/// File-name-safe form of a key: ASCII alphanumerics, `_` and `-` pass through, everything else
/// becomes `%XX` per UTF-8 byte.
fn encode_key(key: &str) -> String {
    let mut encoded = String::with_capacity(key.len());
    for byte in key.bytes() {
        if byte.is_ascii_alphanumeric() || byte == b'_' || byte == b'-' {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    encoded
}

fn decode_key(encoded: &str) -> Option<String> {
    let bytes = encoded.as_bytes();
    let mut decoded = Vec::with_capacity(bytes.len());
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx] == b'%' {
            let hex = encoded.get(idx + 1..idx + 3)?;
            decoded.push(u8::from_str_radix(hex, 16).ok()?);
            idx += 3;
        } else {
            decoded.push(bytes[idx]);
            idx += 1;
        }
    }
    String::from_utf8(decoded).ok()
}
