//! Serenity-backed transport and message conversion
//!
//! - **Version**: 1.2.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.2.0: Owner lookup moved behind `Transport::guild_owner`; typed missing-permissions errors
//! - 1.1.0: Resolve guild owner from the cache before falling back to HTTP
//! - 1.0.0: Initial implementation

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::debug;
use serde_json::json;
use serenity::cache::Cache;
use serenity::http::{Http, HttpError};
use serenity::model::channel::Message;
use serenity::model::id::{ChannelId, GuildId, MessageId, UserId};
use serenity::Error as SerenityError;
use std::sync::Arc;

use super::{Transport, TransportError, MAX_BATCH};
use crate::events::{Author, InboundMessage, MemberInfo};

/// Discord JSON error code for "Missing Permissions"
const MISSING_PERMISSIONS_CODE: isize = 50013;

/// [`Transport`] implementation over serenity's HTTP client
#[derive(Clone)]
pub struct SerenityTransport {
    http: Arc<Http>,
    cache: Option<Arc<Cache>>,
}

impl SerenityTransport {
    pub fn new(http: Arc<Http>) -> Self {
        Self { http, cache: None }
    }

    /// Consult the gateway cache before falling back to HTTP where possible
    pub fn with_cache(mut self, cache: Arc<Cache>) -> Self {
        self.cache = Some(cache);
        self
    }
}

#[async_trait]
impl Transport for SerenityTransport {
    async fn send_message(&self, channel: ChannelId, content: &str) -> Result<MessageId> {
        let message = channel.say(&self.http, content).await?;
        Ok(message.id)
    }

    async fn delete_message(&self, channel: ChannelId, message: MessageId) -> Result<()> {
        channel
            .delete_message(&self.http, message)
            .await
            .map_err(|e| classify(channel, e))
    }

    async fn recent_messages(
        &self,
        channel: ChannelId,
        before: MessageId,
        limit: usize,
    ) -> Result<Vec<MessageId>> {
        let limit = limit.min(MAX_BATCH) as u64;
        let messages = channel
            .messages(&self.http, |retriever| retriever.before(before).limit(limit))
            .await?;
        Ok(messages.into_iter().map(|m| m.id).collect())
    }

    async fn bulk_delete(&self, channel: ChannelId, messages: &[MessageId]) -> Result<()> {
        match messages.len() {
            0 => Ok(()),
            // The bulk endpoint only accepts 2..=100 ids
            1 => self.delete_message(channel, messages[0]).await,
            n if n > MAX_BATCH => Err(anyhow!(
                "cannot bulk delete {n} messages (max {MAX_BATCH})"
            )),
            _ => {
                let ids: Vec<String> = messages.iter().map(|id| id.0.to_string()).collect();
                self.http
                    .delete_messages(channel.0, &json!({ "messages": ids }))
                    .await
                    .map_err(|e| classify(channel, e))
            }
        }
    }

    async fn guild_members(&self, guild: GuildId) -> Result<Vec<UserId>> {
        let members = guild.members(&self.http, Some(1000), None::<UserId>).await?;
        Ok(members.into_iter().map(|m| m.user.id).collect())
    }

    async fn guild_owner(&self, guild: GuildId) -> Result<UserId> {
        if let Some(owner_id) = self
            .cache
            .as_ref()
            .and_then(|cache| cache.guild_field(guild, |g| g.owner_id))
        {
            return Ok(owner_id);
        }

        debug!("Guild {guild} not cached, fetching owner over HTTP");
        let partial = guild.to_partial_guild(&self.http).await?;
        Ok(partial.owner_id)
    }
}

/// Convert a serenity message into an [`InboundMessage`]
///
/// Pure data mapping with no lookups; the guild owner is resolved later
/// through [`Transport::guild_owner`], and only for privileged commands.
pub fn inbound_from_message(msg: &Message) -> InboundMessage {
    let member = match (&msg.member, msg.guild_id) {
        (Some(partial), Some(_)) => Some(MemberInfo {
            roles: partial.roles.clone(),
        }),
        _ => None,
    };

    InboundMessage {
        id: msg.id,
        channel_id: msg.channel_id,
        guild_id: msg.guild_id,
        content: msg.content.clone(),
        author: Some(Author {
            id: msg.author.id,
            name: msg.author.name.clone(),
            bot: msg.author.bot,
        }),
        member,
    }
}

/// Map Discord's "Missing Permissions" response to [`TransportError`]
fn classify(channel: ChannelId, error: SerenityError) -> anyhow::Error {
    if let SerenityError::Http(http_error) = &error {
        if let HttpError::UnsuccessfulRequest(response) = http_error.as_ref() {
            if response.error.code == MISSING_PERMISSIONS_CODE
                || response.status_code.as_u16() == 403
            {
                return TransportError::MissingPermissions(channel).into();
            }
        }
    }
    error.into()
}
