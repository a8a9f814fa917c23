//! # Transport
//!
//! Outbound chat actions used by the dispatcher and command handlers. The
//! gateway client sits behind the [`Transport`] trait so the command framework
//! never touches serenity directly.
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false

pub mod discord;

pub use discord::{inbound_from_message, SerenityTransport};

use anyhow::Result;
use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId, MessageId, UserId};
use thiserror::Error;

/// Largest batch the platform accepts for history retrieval and bulk deletion
pub const MAX_BATCH: usize = 100;

/// Failures callers react to specifically; anything else is an opaque `anyhow::Error`
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("missing permissions in channel {0}")]
    MissingPermissions(ChannelId),
}

/// Whether `error` says the bot lacks the permissions for the action
pub fn is_missing_permissions(error: &anyhow::Error) -> bool {
    matches!(
        error.downcast_ref::<TransportError>(),
        Some(TransportError::MissingPermissions(_))
    )
}

/// Asynchronous, independently fallible chat operations
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a plain text message, returning the id of the created message
    async fn send_message(&self, channel: ChannelId, content: &str) -> Result<MessageId>;

    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> Result<()>;

    /// Up to `limit` most recent messages posted before `before`, newest first
    async fn recent_messages(
        &self,
        channel: ChannelId,
        before: MessageId,
        limit: usize,
    ) -> Result<Vec<MessageId>>;

    /// Delete a batch of at most [`MAX_BATCH`] messages
    async fn bulk_delete(&self, channel: ChannelId, messages: &[MessageId]) -> Result<()>;

    async fn guild_members(&self, guild: GuildId) -> Result<Vec<UserId>>;

    async fn guild_owner(&self, guild: GuildId) -> Result<UserId>;
}
