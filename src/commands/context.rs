//! Per-invocation context for command handlers
//!
//! - **Version**: 2.0.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 2.0.0: One owned context per invocation, carrying actor, origin and arguments
//! - 1.0.0: Initial implementation with core shared state

use anyhow::Result;
use log::debug;
use serenity::model::id::{ChannelId, GuildId, MessageId};
use std::sync::Arc;
use uuid::Uuid;

use super::handler::HandlerDescriptor;
use super::permissions::AdminRoleStore;
use super::registry::CommandRegistry;
use crate::events::Actor;
use crate::transport::Transport;

/// Process-wide services shared by every invocation
///
/// Everything in here is read-only after startup or internally synchronized.
#[derive(Clone)]
pub struct Services {
    pub registry: Arc<CommandRegistry>,
    pub admin_roles: Arc<dyn AdminRoleStore>,
}

/// Everything a command handler gets to see about one invocation
#[derive(Clone)]
pub struct CommandContext {
    pub request_id: Uuid,
    pub actor: Actor,
    pub guild_id: GuildId,
    pub channel_id: ChannelId,
    pub message_id: MessageId,
    /// Full message content, prefix and command name included
    pub raw_content: String,
    /// Whitespace-separated tokens after the command name
    pub args: Vec<String>,
    pub command: Arc<HandlerDescriptor>,
    pub transport: Arc<dyn Transport>,
    pub services: Arc<Services>,
}

impl CommandContext {
    /// Send a message to the channel the command came from
    pub async fn reply(&self, content: impl AsRef<str>) -> Result<MessageId> {
        let content = content.as_ref();
        debug!(
            "[{}] Replying in channel {} ({} chars)",
            self.request_id,
            self.channel_id,
            content.len()
        );
        self.transport.send_message(self.channel_id, content).await
    }

    /// Argument at `index`, if present
    pub fn arg(&self, index: usize) -> Option<&str> {
        self.args.get(index).map(String::as_str)
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.services.registry
    }

    pub fn prefix(&self) -> &str {
        self.services.registry.prefix()
    }

    pub fn admin_roles(&self) -> &Arc<dyn AdminRoleStore> {
        &self.services.admin_roles
    }
}
