//! Verification service tying the directory, ledger and delivery together.

use crate::directory::HandleDirectory;
use crate::dispatch::{code_message, registration_message, Dispatcher};
use crate::error::{BridgeError, BridgeResult};
use crate::registration::{RegistrationBackend, RegistrationRecord};
use code_ledger::VerificationLedger;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Owns the handle directory and the verification ledger.
///
/// Built once at startup and shared between the HTTP API and the bot.
pub struct VerificationService {
    directory: Arc<HandleDirectory>,
    ledger: VerificationLedger,
    dispatcher: Arc<dyn Dispatcher>,
    registration: Arc<dyn RegistrationBackend>,
}

impl VerificationService {
    pub fn new(
        directory: Arc<HandleDirectory>,
        ledger: VerificationLedger,
        dispatcher: Arc<dyn Dispatcher>,
        registration: Arc<dyn RegistrationBackend>,
    ) -> Self {
        Self {
            directory,
            ledger,
            dispatcher,
            registration,
        }
    }

    pub fn directory(&self) -> &Arc<HandleDirectory> {
        &self.directory
    }

    pub fn ledger(&self) -> &VerificationLedger {
        &self.ledger
    }

    /// Issue a code for `handle` and send it to the handle's chat.
    ///
    /// Unknown handles get no code. If delivery fails the code stays
    /// pending; the caller can ask for a new one.
    #[instrument(skip(self))]
    pub async fn issue_code(&self, handle: &str) -> BridgeResult<()> {
        let address = match self.directory.lookup(handle).await {
            Some(address) => address,
            None => {
                info!(handle, "No chat id on file");
                return Err(BridgeError::NotRegistered(handle.to_string()));
            }
        };

        let code = self.ledger.issue(handle).await;
        let text = code_message(&code, self.ledger.ttl());

        self.dispatcher.send(address, &text).await.map_err(|e| {
            error!(handle, chat_id = address, "Failed to deliver verification code: {}", e);
            BridgeError::Dispatch(e.to_string())
        })?;

        info!(handle, "Verification code sent");
        Ok(())
    }

    /// Check a submitted code, consuming it on success.
    #[instrument(skip(self, code))]
    pub async fn verify_code(&self, handle: &str, code: &str) -> BridgeResult<()> {
        self.ledger.verify(handle, code).await?;
        Ok(())
    }

    /// Hand a completed registration to the backend and congratulate the user.
    ///
    /// The notification is only sent when the handle has a chat on file. A
    /// failed notification is reported as a dispatch failure even though the
    /// backend has already accepted the registration.
    #[instrument(skip(self, record), fields(login = %record.login))]
    pub async fn complete_registration(&self, record: &RegistrationRecord) -> BridgeResult<String> {
        let user_id = self
            .registration
            .complete(record)
            .await
            .map_err(|e| BridgeError::Registration(e.to_string()))?;

        let handle = record.telegram.trim_start_matches('@');
        if let Some(address) = self.directory.lookup(handle).await {
            let text = registration_message(&record.full_name, &record.login);
            self.dispatcher.send(address, &text).await.map_err(|e| {
                error!(handle, chat_id = address, "Failed to send registration notice: {}", e);
                BridgeError::Dispatch(e.to_string())
            })?;
        }

        Ok(user_id)
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use crate::directory::DeliveryAddress;
    use crate::dispatch::DispatchError;
    use crate::registration::RegistrationError;
    use async_trait::async_trait;
    use std::sync::Mutex;

    /// Dispatcher that records every message and optionally fails.
    #[derive(Default)]
    pub struct RecordingDispatcher {
        pub sent: Mutex<Vec<(DeliveryAddress, String)>>,
        pub fail: bool,
    }

    impl RecordingDispatcher {
        pub fn failing() -> Self {
            Self {
                sent: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        pub fn sent(&self) -> Vec<(DeliveryAddress, String)> {
            self.sent.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Dispatcher for RecordingDispatcher {
        async fn send(&self, address: DeliveryAddress, text: &str) -> Result<(), DispatchError> {
            self.sent.lock().unwrap().push((address, text.to_string()));
            if self.fail {
                return Err(DispatchError::Other("chat not found".into()));
            }
            Ok(())
        }
    }

    /// Backend returning a fixed id, or an error when `fail` is set.
    pub struct FixedBackend {
        pub fail: bool,
    }

    #[async_trait]
    impl RegistrationBackend for FixedBackend {
        async fn complete(&self, _record: &RegistrationRecord) -> Result<String, RegistrationError> {
            if self.fail {
                return Err(RegistrationError("backend unavailable".into()));
            }
            Ok("user-1".into())
        }
    }

    pub fn extract_code(text: &str) -> String {
        text.chars()
            .skip_while(|c| !c.is_ascii_digit())
            .take_while(|c| c.is_ascii_digit())
            .collect()
    }
}
