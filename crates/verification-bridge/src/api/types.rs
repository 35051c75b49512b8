//! API request and response types.

use crate::error::{BridgeError, BridgeResult};
use crate::registration::RegistrationRecord;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Request to send a verification code.
#[derive(Debug, Deserialize)]
pub struct SendCodeRequest {
    /// Telegram username
    pub telegram: Option<String>,
}

/// Request to check a verification code.
#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    /// Telegram username
    pub telegram: Option<String>,
    /// Code the user received, as a string or a number
    pub code: Option<Value>,
}

/// Registration form. Every field is required; they are checked in
/// declaration order and the first missing one is reported.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub full_name: Option<Value>,
    pub student_id: Option<Value>,
    pub email: Option<Value>,
    pub phone: Option<Value>,
    pub telegram: Option<Value>,
    pub login: Option<Value>,
    pub password: Option<Value>,
}

impl RegisterRequest {
    /// Validate presence of every field.
    pub fn into_record(self) -> BridgeResult<RegistrationRecord> {
        Ok(RegistrationRecord {
            full_name: required_value(self.full_name, "fullName")?,
            student_id: required_value(self.student_id, "studentId")?,
            email: required_value(self.email, "email")?,
            phone: required_value(self.phone, "phone")?,
            telegram: required_value(self.telegram, "telegram")?,
            login: required_value(self.login, "login")?,
            password: SecretString::new(required_value(self.password, "password")?),
        })
    }
}

/// Plain success response.
#[derive(Debug, Serialize)]
pub struct SuccessResponse {
    pub success: bool,
}

impl SuccessResponse {
    pub fn ok() -> Self {
        Self { success: true }
    }
}

/// Response after a completed registration.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub success: bool,
    pub user_id: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub handles: usize,
    pub pending_codes: usize,
}

/// A missing, null or empty string field is reported as missing.
pub fn required(value: Option<String>, field: &'static str) -> BridgeResult<String> {
    match value {
        Some(s) if !s.is_empty() => Ok(s),
        _ => Err(BridgeError::MissingField(field)),
    }
}

/// Like [`required`], but also accepts a JSON number.
pub fn required_value(value: Option<Value>, field: &'static str) -> BridgeResult<String> {
    match value {
        Some(Value::String(s)) if !s.is_empty() => Ok(s),
        Some(Value::Number(n)) => Ok(n.to_string()),
        _ => Err(BridgeError::MissingField(field)),
    }
}
