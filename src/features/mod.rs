//! # Features
//!
//! Optional behavior layered on top of the command system.

pub mod startup;

pub use startup::RestartNotifier;
