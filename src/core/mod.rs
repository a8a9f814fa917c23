//! # Core Module
//!
//! Configuration and shared message helpers.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod config;
pub mod response;

pub use config::{Config, SettingsFile};
pub use response::chunk_for_message;
