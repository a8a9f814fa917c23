//! Test doubles shared by the unit tests

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serenity::model::id::{ChannelId, GuildId, MessageId, RoleId, UserId};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use crate::commands::permissions::{AdminRoleLookup, AdminRoleStore};
use crate::events::{Author, InboundMessage, MemberInfo};
use crate::transport::{Transport, TransportError};

pub const GUILD: GuildId = GuildId(1);
pub const CHANNEL: ChannelId = ChannelId(10);
pub const AUTHOR: UserId = UserId(100);
pub const MEMBER_ROLE: RoleId = RoleId(50);
pub const ADMIN_ROLE: RoleId = RoleId(60);

/// Id given to messages built by [`guild_message`]; history ids stay below it
pub const COMMAND_MESSAGE: MessageId = MessageId(10_000);

/// A guild message from a regular member holding [`MEMBER_ROLE`]
pub fn guild_message(content: &str) -> InboundMessage {
    InboundMessage {
        id: COMMAND_MESSAGE,
        channel_id: CHANNEL,
        guild_id: Some(GUILD),
        content: content.to_string(),
        author: Some(Author {
            id: AUTHOR,
            name: "tester".to_string(),
            bot: false,
        }),
        member: Some(MemberInfo {
            roles: vec![MEMBER_ROLE],
        }),
    }
}

/// Same as [`guild_message`] but the member also holds [`ADMIN_ROLE`]
pub fn admin_message(content: &str) -> InboundMessage {
    let mut message = guild_message(content);
    if let Some(member) = message.member.as_mut() {
        member.roles.push(ADMIN_ROLE);
    }
    message
}

/// How [`MockTransport::bulk_delete`] fails, if at all
#[derive(Default, Clone, Copy)]
enum BulkDeleteFailure {
    #[default]
    None,
    MissingPermissions,
    Rejected,
}

#[derive(Default)]
struct MockState {
    sent: Vec<(ChannelId, String)>,
    deleted: Vec<MessageId>,
    bulk_deleted: Vec<MessageId>,
    /// Oldest first
    history: HashMap<ChannelId, Vec<MessageId>>,
    history_requests: usize,
    history_delay: Option<Duration>,
    members: Vec<UserId>,
    owner: Option<UserId>,
    owner_lookups: usize,
    /// `history` and `bulk_delete` calls in the order they started
    calls: Vec<&'static str>,
    next_id: u64,
    bulk_delete_failure: BulkDeleteFailure,
}

/// In-memory [`Transport`] that records every call
pub struct MockTransport {
    state: Mutex<MockState>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(MockState {
                next_id: 50_000,
                ..Default::default()
            }),
        }
    }

    /// Seed `count` messages in `channel`, all older than [`COMMAND_MESSAGE`]
    pub fn with_history(self, channel: ChannelId, count: u64) -> Self {
        {
            let mut state = self.state.lock().unwrap();
            let history = state.history.entry(channel).or_default();
            history.extend((1..=count).map(MessageId));
        }
        self
    }

    pub fn with_members(self, members: Vec<UserId>) -> Self {
        self.state.lock().unwrap().members = members;
        self
    }

    /// Make the guild report `owner` as its owner
    pub fn with_owner(self, owner: UserId) -> Self {
        self.state.lock().unwrap().owner = Some(owner);
        self
    }

    /// Every history request takes `delay` before answering
    pub fn with_history_delay(self, delay: Duration) -> Self {
        self.state.lock().unwrap().history_delay = Some(delay);
        self
    }

    /// Bulk deletes fail as if the bot lacked Manage Messages
    pub fn failing_bulk_delete(self) -> Self {
        self.state.lock().unwrap().bulk_delete_failure = BulkDeleteFailure::MissingPermissions;
        self
    }

    /// Bulk deletes fail for a reason other than permissions
    pub fn rejecting_bulk_delete(self) -> Self {
        self.state.lock().unwrap().bulk_delete_failure = BulkDeleteFailure::Rejected;
        self
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.state.lock().unwrap().calls.clone()
    }

    pub fn owner_lookups(&self) -> usize {
        self.state.lock().unwrap().owner_lookups
    }

    pub fn sent(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.sent.iter().map(|(_, text)| text.clone()).collect()
    }

    pub fn last_reply(&self) -> Option<String> {
        self.sent().pop()
    }

    pub fn bulk_deleted(&self) -> Vec<MessageId> {
        self.state.lock().unwrap().bulk_deleted.clone()
    }

    pub fn deleted(&self) -> Vec<MessageId> {
        self.state.lock().unwrap().deleted.clone()
    }

    pub fn history_requests(&self) -> usize {
        self.state.lock().unwrap().history_requests
    }

    pub fn remaining_history(&self, channel: ChannelId) -> usize {
        let state = self.state.lock().unwrap();
        state.history.get(&channel).map(Vec::len).unwrap_or(0)
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send_message(&self, channel: ChannelId, content: &str) -> Result<MessageId> {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        state.sent.push((channel, content.to_string()));
        Ok(MessageId(state.next_id))
    }

    async fn delete_message(&self, _channel: ChannelId, message: MessageId) -> Result<()> {
        self.state.lock().unwrap().deleted.push(message);
        Ok(())
    }

    async fn recent_messages(
        &self,
        channel: ChannelId,
        before: MessageId,
        limit: usize,
    ) -> Result<Vec<MessageId>> {
        let delay = {
            let mut state = self.state.lock().unwrap();
            state.history_requests += 1;
            state.calls.push("history");
            state.history_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let state = self.state.lock().unwrap();
        let history = state.history.get(&channel).cloned().unwrap_or_default();
        Ok(history
            .into_iter()
            .rev()
            .filter(|id| id.0 < before.0)
            .take(limit)
            .collect())
    }

    async fn bulk_delete(&self, channel: ChannelId, messages: &[MessageId]) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.calls.push("bulk_delete");
        match state.bulk_delete_failure {
            BulkDeleteFailure::None => {}
            BulkDeleteFailure::MissingPermissions => {
                return Err(TransportError::MissingPermissions(channel).into());
            }
            BulkDeleteFailure::Rejected => {
                return Err(anyhow!("You can only bulk delete messages that are under 14 days old."));
            }
        }
        if let Some(history) = state.history.get_mut(&channel) {
            history.retain(|id| !messages.contains(id));
        }
        state.bulk_deleted.extend_from_slice(messages);
        Ok(())
    }

    async fn guild_members(&self, _guild: GuildId) -> Result<Vec<UserId>> {
        Ok(self.state.lock().unwrap().members.clone())
    }

    async fn guild_owner(&self, guild: GuildId) -> Result<UserId> {
        let mut state = self.state.lock().unwrap();
        state.owner_lookups += 1;
        state.owner.ok_or_else(|| anyhow!("Unknown Guild {guild}"))
    }
}

/// In-memory administrator role store
#[derive(Default)]
pub struct MemoryAdminRoles {
    roles: Mutex<HashMap<GuildId, HashMap<RoleId, u8>>>,
    unavailable: bool,
}

impl MemoryAdminRoles {
    pub fn with_role(guild: GuildId, role: RoleId) -> Self {
        let store = Self::default();
        store
            .roles
            .lock()
            .unwrap()
            .entry(guild)
            .or_default()
            .insert(role, 1);
        store
    }

    /// A store whose every call fails, as if the database were down
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Default::default()
        }
    }

    fn check(&self) -> Result<()> {
        if self.unavailable {
            Err(anyhow!("database is unavailable"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AdminRoleLookup for MemoryAdminRoles {
    async fn is_administrator_role(&self, guild: GuildId, role: RoleId) -> Result<bool> {
        self.check()?;
        let roles = self.roles.lock().unwrap();
        Ok(roles.get(&guild).is_some_and(|r| r.contains_key(&role)))
    }
}

#[async_trait]
impl AdminRoleStore for MemoryAdminRoles {
    async fn add_administrator_role(&self, guild: GuildId, role: RoleId, level: u8) -> Result<bool> {
        self.check()?;
        let mut roles = self.roles.lock().unwrap();
        Ok(roles.entry(guild).or_default().insert(role, level).is_none())
    }

    async fn remove_administrator_role(&self, guild: GuildId, role: RoleId) -> Result<bool> {
        self.check()?;
        let mut roles = self.roles.lock().unwrap();
        Ok(roles
            .get_mut(&guild)
            .is_some_and(|r| r.remove(&role).is_some()))
    }

    async fn administrator_roles(&self, guild: GuildId) -> Result<Vec<(RoleId, u8)>> {
        self.check()?;
        let roles = self.roles.lock().unwrap();
        let mut list: Vec<_> = roles
            .get(&guild)
            .map(|r| r.iter().map(|(id, level)| (*id, *level)).collect())
            .unwrap_or_default();
        list.sort();
        Ok(list)
    }
}
