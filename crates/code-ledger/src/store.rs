//! In-memory verification ledger with lazy expiry.

use crate::clock::{Clock, SystemClock};
use crate::error::LedgerError;
use crate::types::{generate_code, normalize_handle, VerificationEntry};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument};

/// Default validity window for an issued code.
pub const DEFAULT_CODE_TTL: Duration = Duration::from_secs(10 * 60);

/// Pending verification codes keyed by lowercase handle.
///
/// Holds at most one code per handle. Expiry is checked when a code is
/// verified; [`VerificationLedger::sweep_expired`] only reclaims memory.
#[derive(Clone)]
pub struct VerificationLedger {
    entries: Arc<RwLock<HashMap<String, VerificationEntry>>>,
    ttl: Duration,
    clock: Arc<dyn Clock>,
}

impl VerificationLedger {
    /// Create a ledger backed by the wall clock.
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    /// Create a ledger with an explicit time source.
    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            clock,
        }
    }

    /// Validity window applied to newly issued codes.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Issue a fresh code for `handle`, replacing any pending one.
    #[instrument(skip(self))]
    pub async fn issue(&self, handle: &str) -> String {
        let key = normalize_handle(handle);
        let code = generate_code();
        let ttl = chrono::Duration::from_std(self.ttl).unwrap_or(chrono::Duration::MAX);
        let expires_at = self
            .clock
            .now()
            .checked_add_signed(ttl)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let mut entries = self.entries.write().await;
        let replaced = entries
            .insert(
                key.clone(),
                VerificationEntry {
                    handle: key.clone(),
                    code: code.clone(),
                    expires_at,
                },
            )
            .is_some();

        debug!(handle = %key, replaced, %expires_at, "Issued verification code");
        code
    }

    /// Check `submitted` against the pending code for `handle`.
    ///
    /// Consumes the entry on success and on expiry. A wrong code leaves the
    /// entry in place so the user can retry until it expires.
    #[instrument(skip(self, submitted))]
    pub async fn verify(&self, handle: &str, submitted: &str) -> Result<(), LedgerError> {
        let key = normalize_handle(handle);
        let now = self.clock.now();

        let mut entries = self.entries.write().await;
        let entry = entries
            .get(&key)
            .ok_or_else(|| LedgerError::NotFound(key.clone()))?;

        if entry.is_expired(now) {
            entries.remove(&key);
            info!(handle = %key, "Verification code expired");
            return Err(LedgerError::Expired(key));
        }

        if entry.code != submitted {
            info!(handle = %key, "Verification code mismatch");
            return Err(LedgerError::Mismatch);
        }

        entries.remove(&key);
        info!(handle = %key, "Verification succeeded");
        Ok(())
    }

    /// Number of entries held in memory, expired or not.
    pub async fn pending_count(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Drop every entry whose window has passed. Returns how many went.
    pub async fn sweep_expired(&self) -> usize {
        let now = self.clock.now();
        let mut entries = self.entries.write().await;
        let before = entries.len();

        entries.retain(|_, entry| !entry.is_expired(now));

        let removed = before - entries.len();
        if removed > 0 {
            debug!("Swept {} expired verification codes", removed);
        }
        removed
    }

    /// Run [`VerificationLedger::sweep_expired`] every `interval`.
    pub fn spawn_sweeper(&self, interval: Duration) -> JoinHandle<()> {
        let ledger = self.clone();
        info!(?interval, "Starting verification code sweeper");
        tokio::spawn(async move {
            loop {
                tokio::time::sleep(interval).await;
                ledger.sweep_expired().await;
            }
        })
    }
}
