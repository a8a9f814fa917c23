//! Permission gate for privileged command categories
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: Bot administrators bypass the gate like guild owners
//! - 1.0.0: Initial implementation with administrator role lookups

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use serenity::model::id::{GuildId, RoleId, UserId};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

use super::handler::CommandCategory;
use crate::events::Actor;

/// Read side of the administrator role store
#[async_trait]
pub trait AdminRoleLookup: Send + Sync {
    async fn is_administrator_role(&self, guild: GuildId, role: RoleId) -> Result<bool>;
}

/// Write side of the administrator role store, used by the administrators command
#[async_trait]
pub trait AdminRoleStore: AdminRoleLookup {
    /// Returns `false` when the role was already an administrator role (its level is updated)
    async fn add_administrator_role(&self, guild: GuildId, role: RoleId, level: u8) -> Result<bool>;

    /// Returns `false` when the role was not an administrator role
    async fn remove_administrator_role(&self, guild: GuildId, role: RoleId) -> Result<bool>;

    /// Administrator roles of a guild with their level, ordered by role id
    async fn administrator_roles(&self, guild: GuildId) -> Result<Vec<(RoleId, u8)>>;
}

/// The administrator role lookup failed; the gate denies in that case
#[derive(Debug, Error)]
#[error("administrator role lookup failed for guild {guild}")]
pub struct PermissionLookupError {
    pub guild: GuildId,
    #[source]
    pub source: anyhow::Error,
}

/// Decides whether an actor may run a command of a given category
#[derive(Clone)]
pub struct PermissionGate {
    lookup: Arc<dyn AdminRoleLookup>,
    bot_administrators: HashSet<UserId>,
}

impl PermissionGate {
    pub fn new(lookup: Arc<dyn AdminRoleLookup>) -> Self {
        Self {
            lookup,
            bot_administrators: HashSet::new(),
        }
    }

    /// Users allowed to run every command in every guild
    pub fn with_bot_administrators(mut self, users: impl IntoIterator<Item = UserId>) -> Self {
        self.bot_administrators.extend(users);
        self
    }

    pub fn is_bot_administrator(&self, user: UserId) -> bool {
        self.bot_administrators.contains(&user)
    }

    /// Authorize `actor` for `category` in `guild`
    ///
    /// Owners and bot administrators always pass. Non-privileged categories
    /// always pass. Privileged categories need at least one of the actor's
    /// roles in the guild's administrator set; a failed lookup is returned as
    /// an error rather than a plain denial.
    pub async fn authorize(
        &self,
        guild: GuildId,
        actor: &Actor,
        category: CommandCategory,
    ) -> Result<bool, PermissionLookupError> {
        if actor.is_guild_owner || self.is_bot_administrator(actor.id) {
            return Ok(true);
        }
        if !category.is_privileged() {
            return Ok(true);
        }

        for role in &actor.roles {
            let is_admin = self
                .lookup
                .is_administrator_role(guild, *role)
                .await
                .map_err(|source| PermissionLookupError { guild, source })?;
            if is_admin {
                debug!("User {} authorized for {category} via role {role}", actor.id);
                return Ok(true);
            }
        }

        Ok(false)
    }
}
