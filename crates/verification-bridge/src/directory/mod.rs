//! Handle directory: which Telegram chat belongs to which username.

mod store;

pub use store::{FileStore, HandleMap, MemoryStore, Store, StoreError};

use code_ledger::normalize_handle;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// Opaque messaging address; a Telegram chat id.
pub type DeliveryAddress = i64;

/// Lowercase handle to delivery address, backed by a [`Store`].
///
/// The in-memory map is authoritative. Persistence is best effort: a failed
/// write is logged and the registration still counts.
pub struct HandleDirectory {
    records: RwLock<HandleMap>,
    store: Store,
}

impl HandleDirectory {
    /// Empty directory that persists to `store`.
    pub fn new(store: Store) -> Self {
        Self {
            records: RwLock::new(HandleMap::new()),
            store,
        }
    }

    /// Load every record the store holds.
    ///
    /// A missing or unreadable backing file yields an empty directory.
    pub async fn load_all(store: Store) -> Self {
        let records = match store.load().await {
            Ok(map) => {
                let records: HandleMap = map
                    .into_iter()
                    .map(|(handle, address)| (normalize_handle(&handle), address))
                    .collect();
                info!("Loaded {} handles", records.len());
                records
            }
            Err(StoreError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                info!("No saved handles found, starting with empty directory");
                HandleMap::new()
            }
            Err(e) => {
                warn!("Failed to load handles, starting with empty directory: {}", e);
                HandleMap::new()
            }
        };

        Self {
            records: RwLock::new(records),
            store,
        }
    }

    /// Record that `handle` is reachable at `address`, then persist.
    pub async fn register(&self, handle: &str, address: DeliveryAddress) {
        let key = normalize_handle(handle);

        let mut records = self.records.write().await;
        records.insert(key.clone(), address);

        // Held across the write so concurrent registrations reach the file in order.
        match self.store.upsert(&key, address).await {
            Ok(()) => info!(handle = %key, chat_id = address, "Saved chat id"),
            Err(e) => error!(handle = %key, "Failed to persist chat id: {}", e),
        }
    }

    /// Case-insensitive exact lookup.
    pub async fn lookup(&self, handle: &str) -> Option<DeliveryAddress> {
        self.records
            .read()
            .await
            .get(&normalize_handle(handle))
            .copied()
    }

    /// Number of known handles.
    pub async fn count(&self) -> usize {
        self.records.read().await.len()
    }
}
