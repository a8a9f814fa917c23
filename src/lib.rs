// Core layer - shared types and configuration
pub mod core;

// Features layer
pub mod features;

// Infrastructure
pub mod database;
pub mod transport;

// Application layer
pub mod commands;
pub mod events;

#[cfg(test)]
mod testing;

pub use core::Config;
