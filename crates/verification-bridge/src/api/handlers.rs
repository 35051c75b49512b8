//! HTTP request handlers.

use super::middleware::RateLimitState;
use super::types::{
    required, required_value, HealthResponse, RegisterRequest, RegisterResponse, SendCodeRequest,
    SuccessResponse, VerifyCodeRequest,
};
use super::AppState;
use crate::error::BridgeResult;
use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};
use tracing::info;

/// Health check endpoint.
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        handles: state.service.directory().count().await,
        pending_codes: state.service.ledger().pending_count().await,
    })
}

/// Issue a verification code and send it over Telegram.
pub async fn send_verification_code(
    State(state): State<AppState>,
    Extension(limits): Extension<RateLimitState>,
    payload: Result<Json<SendCodeRequest>, JsonRejection>,
) -> BridgeResult<Json<SuccessResponse>> {
    let Json(request) = payload?;
    let telegram = required(request.telegram, "telegram")?;
    limits.check_send(&telegram)?;
    info!(handle = %telegram, "Verification code requested");

    state.service.issue_code(&telegram).await?;

    Ok(Json(SuccessResponse::ok()))
}

/// Check a verification code.
pub async fn verify_code(
    State(state): State<AppState>,
    Extension(limits): Extension<RateLimitState>,
    payload: Result<Json<VerifyCodeRequest>, JsonRejection>,
) -> BridgeResult<Json<SuccessResponse>> {
    let Json(request) = payload?;
    let telegram = required(request.telegram, "telegram")?;
    let code = required_value(request.code, "code")?;
    limits.check_verify(&telegram)?;
    info!(handle = %telegram, "Verification code submitted");

    state.service.verify_code(&telegram, &code).await?;

    Ok(Json(SuccessResponse::ok()))
}

/// Complete a registration.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> BridgeResult<Json<RegisterResponse>> {
    let Json(request) = payload?;
    let record = request.into_record()?;

    let user_id = state.service.complete_registration(&record).await?;

    Ok(Json(RegisterResponse {
        success: true,
        user_id,
    }))
}
