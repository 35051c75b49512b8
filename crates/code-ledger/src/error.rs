//! Verification ledger errors.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("No pending verification code for {0}")]
    NotFound(String),

    #[error("Verification code for {0} has expired")]
    Expired(String),

    #[error("Invalid verification code")]
    Mismatch,
}
