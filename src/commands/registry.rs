//! Command handler registry
//!
//! - **Version**: 2.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 2.0.0: Reject duplicate names/aliases, resolve `${prefix}` at registration, namespace discovery
//! - 1.0.0: Initial implementation for handler dispatch

use log::{debug, info};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use thiserror::Error;

use super::handler::HandlerDescriptor;

/// A command name or alias is already taken
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("command name or alias `{key}` is already registered by `{existing}`")]
pub struct DuplicateHandlerError {
    pub key: String,
    pub existing: String,
}

/// One entry of a compiled handler namespace
#[derive(Clone, Copy)]
pub struct HandlerEntry {
    /// Stable implementation identifier, used to order registration
    pub id: &'static str,
    pub build: fn() -> HandlerDescriptor,
}

/// A named, compiled list of handler implementations
///
/// Stands in for runtime discovery: every module contributes an entry here and
/// the registry picks them all up at startup.
pub struct Namespace {
    name: &'static str,
    entries: Vec<HandlerEntry>,
}

impl Namespace {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            entries: Vec::new(),
        }
    }

    pub fn entry(mut self, id: &'static str, build: fn() -> HandlerDescriptor) -> Self {
        self.entries.push(HandlerEntry { id, build });
        self
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Entries ordered by identifier
    pub fn sorted_entries(&self) -> Vec<HandlerEntry> {
        let mut entries = self.entries.clone();
        entries.sort_by_key(|entry| entry.id);
        entries
    }
}

/// Index of command names and aliases to their descriptor
///
/// Built once before any message is dispatched, then shared read-only behind
/// an `Arc`.
///
/// # Example
///
/// ```ignore
/// let mut registry = CommandRegistry::new(">");
/// registry.discover_and_register_all(&handlers::builtin_namespace())?;
///
/// if let Some(descriptor) = registry.resolve(">clear") {
///     // dispatch
/// }
/// ```
pub struct CommandRegistry {
    prefix: String,
    index: HashMap<String, Arc<HandlerDescriptor>>,
    handlers: Vec<Arc<HandlerDescriptor>>,
}

impl CommandRegistry {
    /// Create an empty registry whose descriptors resolve `${prefix}` to `prefix`
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            index: HashMap::new(),
            handlers: Vec::new(),
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Register a descriptor under its resolved name and every alias
    ///
    /// Fails without touching the registry if any key is already taken,
    /// including a descriptor repeating its own name among its aliases.
    pub fn register(
        &mut self,
        descriptor: HandlerDescriptor,
    ) -> Result<Arc<HandlerDescriptor>, DuplicateHandlerError> {
        let descriptor = descriptor.resolved(&self.prefix);

        let mut seen = HashSet::new();
        for key in descriptor.keys() {
            if let Some(existing) = self.index.get(key) {
                return Err(DuplicateHandlerError {
                    key: key.to_string(),
                    existing: existing.name().to_string(),
                });
            }
            if !seen.insert(key) {
                return Err(DuplicateHandlerError {
                    key: key.to_string(),
                    existing: descriptor.name().to_string(),
                });
            }
        }

        let descriptor = Arc::new(descriptor);
        for key in descriptor.keys() {
            self.index.insert(key.to_string(), Arc::clone(&descriptor));
        }
        self.handlers.push(Arc::clone(&descriptor));
        debug!(
            "Registered command {} ({} aliases)",
            descriptor.name(),
            descriptor.aliases().len()
        );
        Ok(descriptor)
    }

    /// Build and register every handler in `namespace`, ordered by identifier
    ///
    /// Returns the number of handlers registered.
    pub fn discover_and_register_all(
        &mut self,
        namespace: &Namespace,
    ) -> Result<usize, DuplicateHandlerError> {
        let entries = namespace.sorted_entries();
        for entry in &entries {
            debug!("Discovered handler '{}' in {}", entry.id, namespace.name());
            self.register((entry.build)())?;
        }
        info!(
            "Registered {} handlers from namespace '{}'",
            entries.len(),
            namespace.name()
        );
        Ok(entries.len())
    }

    /// Exact, case-sensitive lookup of a command token such as `>clear`
    pub fn resolve(&self, token: &str) -> Option<Arc<HandlerDescriptor>> {
        self.index.get(token).cloned()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.index.contains_key(token)
    }

    /// Every registered descriptor once, in registration order
    ///
    /// Each call starts a fresh iteration.
    pub fn handlers(&self) -> impl Iterator<Item = &Arc<HandlerDescriptor>> + '_ {
        self.handlers.iter()
    }

    /// Number of distinct handlers (not names)
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
