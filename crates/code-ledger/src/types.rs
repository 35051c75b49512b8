//! Verification entry and code types.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::Serialize;

/// Smallest code the generator produces.
pub const CODE_MIN: u32 = 100_000;

/// Largest code the generator produces.
pub const CODE_MAX: u32 = 999_999;

/// A pending one-time code bound to a handle.
#[derive(Debug, Clone, Serialize)]
pub struct VerificationEntry {
    pub handle: String,
    pub code: String,
    pub expires_at: DateTime<Utc>,
}

impl VerificationEntry {
    /// Whether the entry is past its validity window at `now`.
    ///
    /// The code is still accepted at exactly `expires_at`.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Generate a six digit code in `CODE_MIN..=CODE_MAX`.
pub fn generate_code() -> String {
    let n = rand::thread_rng().gen_range(CODE_MIN..=CODE_MAX);
    format!("{:06}", n)
}

/// Case-fold a messaging handle into its lookup key.
pub fn normalize_handle(handle: &str) -> String {
    handle.to_lowercase()
}
