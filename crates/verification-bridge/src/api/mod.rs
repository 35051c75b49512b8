//! HTTP API for the verification bridge.

mod handlers;
mod middleware;
mod types;

pub use handlers::*;
pub use middleware::{logging_middleware, HandleLimiter, RateLimitState};
pub use types::*;

use crate::service::VerificationService;
use axum::{
    http::{header, HeaderName, Method},
    middleware as axum_middleware,
    routing::{get, post},
    Extension, Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<VerificationService>,
}

impl AppState {
    pub fn new(service: Arc<VerificationService>) -> Self {
        Self { service }
    }
}

/// CORS policy for the registration frontend: any origin.
pub fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-student-id"),
            HeaderName::from_static("x-student-name"),
        ])
}

/// Create the API router with the default attempt limits.
pub fn create_router(state: AppState) -> Router {
    create_router_with_rate_limit(state, RateLimitState::new(3, 5))
}

/// Create the API router with custom per-handle attempt limits.
pub fn create_router_with_rate_limit(state: AppState, rate_limit: RateLimitState) -> Router {
    Router::new()
        .route("/health", get(handlers::health))
        .route(
            "/api/auth/send-verification-code",
            post(handlers::send_verification_code),
        )
        .route("/api/auth/verify-code", post(handlers::verify_code))
        .route("/api/register", post(handlers::register))
        .layer(Extension(rate_limit))
        .layer(axum_middleware::from_fn(logging_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}
