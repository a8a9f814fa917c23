//! Command handler descriptor and execution trait
//!
//! - **Version**: 2.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 2.0.0: Split metadata into `HandlerDescriptor`, behavior into `CommandAction`
//! - 1.0.0: Initial implementation for prefix command handling

use anyhow::Result;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

use super::context::CommandContext;

/// Placeholder substituted with the live command prefix at registration time
pub const PREFIX_PLACEHOLDER: &str = "${prefix}";

/// Command category, used for permission checks and help listings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CommandCategory {
    Administration,
    Moderation,
    Utility,
    Other,
}

impl CommandCategory {
    /// All categories in help-listing order
    pub const ALL: [CommandCategory; 4] = [
        CommandCategory::Administration,
        CommandCategory::Moderation,
        CommandCategory::Utility,
        CommandCategory::Other,
    ];

    /// Privileged categories require an administrator role
    pub fn is_privileged(self) -> bool {
        matches!(
            self,
            CommandCategory::Administration | CommandCategory::Moderation
        )
    }

    pub fn display_name(self) -> &'static str {
        match self {
            CommandCategory::Administration => "Administration",
            CommandCategory::Moderation => "Moderation",
            CommandCategory::Utility => "Utility",
            CommandCategory::Other => "Other",
        }
    }
}

impl fmt::Display for CommandCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Behavior of a single command
///
/// Implementations receive an owned [`CommandContext`] and run on their own
/// task. Errors are reported to the channel by the dispatcher; anything the
/// user should see in detail (bad numbers, out-of-range values) must be
/// replied by the action itself.
///
/// # Example
///
/// ```ignore
/// pub struct Ping;
///
/// #[async_trait]
/// impl CommandAction for Ping {
///     async fn execute(&self, ctx: CommandContext) -> Result<()> {
///         ctx.reply("Pong!").await?;
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait CommandAction: Send + Sync {
    async fn execute(&self, ctx: CommandContext) -> Result<()>;
}

/// Immutable metadata plus behavior for one command
///
/// Built from templates where `${prefix}` stands for the command prefix.
/// The registry stores a resolved copy; descriptors are never mutated after
/// registration.
#[derive(Clone)]
pub struct HandlerDescriptor {
    name: String,
    aliases: Vec<String>,
    usage: String,
    description: String,
    category: CommandCategory,
    minimum_arguments: usize,
    action: Arc<dyn CommandAction>,
}

impl HandlerDescriptor {
    /// Start building a descriptor from a name template such as `${prefix}clear`
    pub fn builder(name: impl Into<String>, action: impl CommandAction + 'static) -> DescriptorBuilder {
        let name = name.into();
        DescriptorBuilder {
            usage: name.clone(),
            name,
            aliases: Vec::new(),
            description: String::new(),
            category: CommandCategory::Other,
            minimum_arguments: 0,
            action: Arc::new(action),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    pub fn usage(&self) -> &str {
        &self.usage
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn category(&self) -> CommandCategory {
        self.category
    }

    /// Minimum number of argument tokens after the command name
    pub fn minimum_arguments(&self) -> usize {
        self.minimum_arguments
    }

    pub fn action(&self) -> Arc<dyn CommandAction> {
        Arc::clone(&self.action)
    }

    /// Name followed by every alias
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        std::iter::once(self.name.as_str()).chain(self.aliases.iter().map(String::as_str))
    }

    /// Copy with every `${prefix}` placeholder replaced by `prefix`
    pub fn resolved(&self, prefix: &str) -> Self {
        let resolve = |template: &str| template.replace(PREFIX_PLACEHOLDER, prefix);
        Self {
            name: resolve(&self.name),
            aliases: self.aliases.iter().map(|a| resolve(a)).collect(),
            usage: resolve(&self.usage),
            description: resolve(&self.description),
            category: self.category,
            minimum_arguments: self.minimum_arguments,
            action: Arc::clone(&self.action),
        }
    }
}

impl fmt::Debug for HandlerDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerDescriptor")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("usage", &self.usage)
            .field("category", &self.category)
            .field("minimum_arguments", &self.minimum_arguments)
            .finish_non_exhaustive()
    }
}

/// Builder for [`HandlerDescriptor`]
pub struct DescriptorBuilder {
    name: String,
    aliases: Vec<String>,
    usage: String,
    description: String,
    category: CommandCategory,
    minimum_arguments: usize,
    action: Arc<dyn CommandAction>,
}

impl DescriptorBuilder {
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Usage line shown when too few arguments are given; defaults to the name
    pub fn usage(mut self, usage: impl Into<String>) -> Self {
        self.usage = usage.into();
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn category(mut self, category: CommandCategory) -> Self {
        self.category = category;
        self
    }

    pub fn minimum_arguments(mut self, count: usize) -> Self {
        self.minimum_arguments = count;
        self
    }

    pub fn build(self) -> HandlerDescriptor {
        HandlerDescriptor {
            name: self.name,
            aliases: self.aliases,
            usage: self.usage,
            description: self.description,
            category: self.category,
            minimum_arguments: self.minimum_arguments,
            action: self.action,
        }
    }
}
