//! One-time verification codes bound to messaging handles.
//!
//! Codes live only in memory and are checked for expiry when verified.
//! A restart drops every pending code.

mod clock;
mod error;
mod store;
mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::LedgerError;
pub use store::{VerificationLedger, DEFAULT_CODE_TTL};
pub use types::*;
