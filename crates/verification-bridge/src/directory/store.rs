//! Backing stores for the handle directory.

use super::DeliveryAddress;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::fs;
use tracing::{debug, info, instrument};

/// Persisted document: lowercase handle to delivery address.
pub type HandleMap = HashMap<String, DeliveryAddress>;

/// Failure reading or writing the backing file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// JSON file holding the whole directory.
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the whole document.
    #[instrument(skip(self), fields(path = ?self.path))]
    pub async fn load(&self) -> Result<HandleMap, StoreError> {
        let data = fs::read(&self.path).await?;
        let map: HandleMap = serde_json::from_slice(&data)?;
        debug!("Read {} handles from disk", map.len());
        Ok(map)
    }

    /// Merge one entry into the file, rewriting it entirely.
    ///
    /// Starts from whatever the file currently holds; an absent or
    /// unreadable file counts as empty.
    #[instrument(skip(self), fields(path = ?self.path))]
    pub async fn upsert(&self, handle: &str, address: DeliveryAddress) -> Result<(), StoreError> {
        let mut map = match self.load().await {
            Ok(map) => map,
            Err(e) => {
                debug!("Starting from an empty document: {}", e);
                HandleMap::new()
            }
        };
        map.insert(handle.to_string(), address);

        let data = serde_json::to_vec_pretty(&map)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).await?;
            }
        }

        // Write atomically using temp file + rename
        let temp_path = self.path.with_extension("tmp");
        fs::write(&temp_path, &data).await?;
        fs::rename(&temp_path, &self.path).await?;

        debug!("Saved {} handles ({} bytes)", map.len(), data.len());
        Ok(())
    }
}

/// Store that keeps nothing, for tests or when persistence is disabled.
pub struct MemoryStore;

impl MemoryStore {
    /// "Load" returns an empty document.
    pub async fn load(&self) -> Result<HandleMap, StoreError> {
        debug!("Memory store: returning empty directory");
        Ok(HandleMap::new())
    }

    /// "Upsert" does nothing for memory store.
    pub async fn upsert(&self, _handle: &str, _address: DeliveryAddress) -> Result<(), StoreError> {
        debug!("Memory store: upsert is a no-op");
        Ok(())
    }
}

/// Storage backend with or without persistence.
pub enum Store {
    /// JSON file on disk
    File(FileStore),
    /// In-memory only (no persistence)
    Memory(MemoryStore),
}

impl Store {
    /// File-backed store at `path`.
    pub fn file(path: impl Into<PathBuf>) -> Self {
        let store = FileStore::new(path);
        info!("Using handle directory file {:?}", store.path());
        Store::File(store)
    }

    /// Store without persistence.
    pub fn memory() -> Self {
        Store::Memory(MemoryStore)
    }

    pub async fn load(&self) -> Result<HandleMap, StoreError> {
        match self {
            Store::File(s) => s.load().await,
            Store::Memory(s) => s.load().await,
        }
    }

    pub async fn upsert(&self, handle: &str, address: DeliveryAddress) -> Result<(), StoreError> {
        match self {
            Store::File(s) => s.upsert(handle, address).await,
            Store::Memory(s) => s.upsert(handle, address).await,
        }
    }
}
