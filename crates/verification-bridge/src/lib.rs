//! Telegram verification bridge.
//!
//! Issues short-lived numeric codes to Telegram users identified by their
//! username and confirms them for a web registration flow:
//! - users link their username to a chat by sending `/start` to the bot
//! - the registration frontend asks for a code, which the bot delivers
//! - the frontend submits the code back and gets a yes or no

pub mod api;
pub mod bot;
pub mod commands;
pub mod config;
pub mod directory;
pub mod dispatch;
pub mod error;
pub mod registration;
pub mod service;

pub use config::Config;
pub use directory::{DeliveryAddress, HandleDirectory, Store};
pub use dispatch::{DispatchError, Dispatcher};
pub use error::{BridgeError, BridgeResult};
pub use registration::{LocalRegistrationBackend, RegistrationBackend, RegistrationRecord};
pub use service::VerificationService;
