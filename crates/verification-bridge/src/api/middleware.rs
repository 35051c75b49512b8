//! Per-handle attempt limits and request logging.

use crate::error::{BridgeError, BridgeResult};
use axum::{extract::Request, middleware::Next, response::Response};
use code_ledger::normalize_handle;
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::{num::NonZeroU32, sync::Arc};
use tracing::{debug, warn};

/// Limiter keyed by lowercased handle.
pub type HandleLimiter = DefaultKeyedRateLimiter<String>;

/// Attempt budgets for code delivery and code checks.
///
/// Keyed by handle so one user hammering the API cannot lock out another,
/// and so guessing against a single pending code stays slow.
#[derive(Clone)]
pub struct RateLimitState {
    send: Arc<HandleLimiter>,
    verify: Arc<HandleLimiter>,
}

impl RateLimitState {
    /// Allow `send_per_minute` code requests and `verify_per_minute` checks
    /// per handle. Zero is treated as one.
    pub fn new(send_per_minute: u32, verify_per_minute: u32) -> Self {
        Self {
            send: Arc::new(RateLimiter::keyed(per_minute(send_per_minute))),
            verify: Arc::new(RateLimiter::keyed(per_minute(verify_per_minute))),
        }
    }

    /// Create a permissive rate limiter for testing.
    pub fn permissive() -> Self {
        Self::new(1000, 1000)
    }

    /// Spend one code request for `handle`.
    pub fn check_send(&self, handle: &str) -> BridgeResult<()> {
        check(&self.send, handle)
    }

    /// Spend one verification attempt for `handle`.
    pub fn check_verify(&self, handle: &str) -> BridgeResult<()> {
        check(&self.verify, handle)
    }

    /// Forget handles whose budget has fully refilled.
    pub fn prune(&self) {
        self.send.retain_recent();
        self.verify.retain_recent();
    }
}

fn per_minute(n: u32) -> Quota {
    Quota::per_minute(NonZeroU32::new(n).unwrap_or(NonZeroU32::MIN))
}

fn check(limiter: &HandleLimiter, handle: &str) -> BridgeResult<()> {
    let key = normalize_handle(handle);
    if limiter.check_key(&key).is_err() {
        warn!(handle = %key, "Attempt limit reached");
        return Err(BridgeError::RateLimitExceeded(key));
    }
    Ok(())
}

/// Logging middleware for requests.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = std::time::Instant::now();

    debug!(%method, %uri, "Request started");

    let response = next.run(request).await;

    let duration = start.elapsed();
    let status = response.status();

    if status.is_success() {
        debug!(%method, %uri, %status, ?duration, "Request completed");
    } else {
        warn!(%method, %uri, %status, ?duration, "Request failed");
    }

    response
}
