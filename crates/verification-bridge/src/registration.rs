//! Registration completion against an external backend.

use async_trait::async_trait;
use chrono::Utc;
use secrecy::SecretString;
use thiserror::Error;
use tracing::info;

/// A validated registration with every required field present.
#[derive(Debug)]
pub struct RegistrationRecord {
    pub full_name: String,
    pub student_id: String,
    pub email: String,
    pub phone: String,
    pub telegram: String,
    pub login: String,
    pub password: SecretString,
}

/// Failure reported by a registration backend.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct RegistrationError(pub String);

/// Completes a registration and returns the new registration's id.
#[async_trait]
pub trait RegistrationBackend: Send + Sync {
    async fn complete(&self, record: &RegistrationRecord) -> Result<String, RegistrationError>;
}

/// Backend that accepts every registration and hands out a
/// millisecond-timestamp id. Stands in until a real backend is wired up.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalRegistrationBackend;

#[async_trait]
impl RegistrationBackend for LocalRegistrationBackend {
    async fn complete(&self, record: &RegistrationRecord) -> Result<String, RegistrationError> {
        let id = Utc::now().timestamp_millis().to_string();
        info!(login = %record.login, user_id = %id, "Registration accepted");
        Ok(id)
    }
}
