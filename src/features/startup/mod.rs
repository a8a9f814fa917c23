//! # Restart Notification Feature
//!
//! Webhook notice when the bot comes online.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.4.0
//! - **Toggleable**: true

pub mod notification;

pub use notification::{parse_webhook_url, RestartNotifier};
