//! Per-command handler implementations
//!
//! - **Version**: 1.2.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.2.0: Add AdministratorsHandler (administrators add/remove/list)
//! - 1.1.0: Add SomeoneHandler, PrefixHandler
//! - 1.0.0: Initial handlers (clear, help, ping)

pub mod administrators;
pub mod clear;
pub mod help;
pub mod someone;
pub mod utility;

use super::registry::Namespace;

/// Every built-in command, ready for `CommandRegistry::discover_and_register_all`
pub fn builtin_namespace() -> Namespace {
    Namespace::new("builtin")
        .entry("administrators", administrators::descriptor)
        .entry("clear", clear::descriptor)
        .entry("help", help::descriptor)
        .entry("ping", utility::ping_descriptor)
        .entry("prefix", utility::prefix_descriptor)
        .entry("someone", someone::descriptor)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::registry::CommandRegistry;

    #[test]
    fn test_builtin_namespace_registers_cleanly() {
        let mut registry = CommandRegistry::new(">");
        let count = registry
            .discover_and_register_all(&builtin_namespace())
            .unwrap();

        assert_eq!(count, 6);
        for token in [">clear", ">purge", ">admins", ">commands", ">ping", ">someone"] {
            assert!(registry.contains(token), "missing {token}");
        }
    }
}
