//! # Inbound Events
//!
//! Gateway-independent model of a received chat message, plus the filter
//! pipeline that decides which messages are handed to the command dispatcher.
//!
//! - **Version**: 1.2.0
//! - **Since**: 1.0.0
//! - **Toggleable**: false
//!
//! ## Changelog
//! - 1.2.0: Guild-owner flag resolved by the dispatcher instead of at conversion
//! - 1.1.0: Carry the guild-owner flag on the member snapshot
//! - 1.0.0: Initial extraction from the serenity event handler

pub mod filters;

pub use filters::{
    AuthorPresent, EventFilter, FilterPipeline, MemberPresent, MessageSink, NonEmptyContent,
    NotAutomated,
};

use serenity::model::id::{ChannelId, GuildId, MessageId, RoleId, UserId};

/// Author of a message as reported by the gateway
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Author {
    pub id: UserId,
    pub name: String,
    pub bot: bool,
}

/// Guild membership snapshot attached to a guild message
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberInfo {
    pub roles: Vec<RoleId>,
}

/// A single inbound message, detached from the gateway client types
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub id: MessageId,
    pub channel_id: ChannelId,
    pub guild_id: Option<GuildId>,
    pub content: String,
    pub author: Option<Author>,
    pub member: Option<MemberInfo>,
}

/// The invoking actor of a command: who they are and what they hold in the guild
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Actor {
    pub id: UserId,
    pub name: String,
    pub roles: Vec<RoleId>,
    /// Filled in by the dispatcher, and only for privileged commands
    pub is_guild_owner: bool,
}

impl InboundMessage {
    /// Build the actor for this message.
    ///
    /// Returns `None` unless both the author and the member snapshot are present.
    /// The owner flag starts out unset.
    pub fn actor(&self) -> Option<Actor> {
        let author = self.author.as_ref()?;
        let member = self.member.as_ref()?;
        Some(Actor {
            id: author.id,
            name: author.name.clone(),
            roles: member.roles.clone(),
            is_guild_owner: false,
        })
    }
}
