//! # Command System
//!
//! Prefix command handling for guild text messages.
//!
//! - **Version**: 3.0.0
//! - **Since**: 0.2.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 3.0.0: Prefix commands with declarative descriptors, role-based permission gate
//! - 2.1.0: Add modular handler infrastructure (handler trait, context, registry)
//! - 1.0.0: Initial reorganization with modular command structure

pub mod context;
pub mod dispatcher;
pub mod handler;
pub mod handlers;
pub mod permissions;
pub mod registry;

pub use context::{CommandContext, Services};
pub use dispatcher::{DispatchError, DispatchOutcome, Dispatcher, InvocationState};
pub use handler::{CommandAction, CommandCategory, HandlerDescriptor};
pub use permissions::{AdminRoleLookup, AdminRoleStore, PermissionGate, PermissionLookupError};
pub use registry::{CommandRegistry, DuplicateHandlerError, Namespace};
