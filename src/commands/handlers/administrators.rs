//! Administrator role management
//!
//! Handles: administrators (alias: admins) with `add`, `remove` and `list`
//!
//! - **Version**: 1.0.0
//! - **Since**: 1.1.0

use anyhow::Result;
use async_trait::async_trait;
use log::info;
use serenity::model::id::RoleId;

use crate::commands::context::CommandContext;
use crate::commands::handler::{CommandAction, CommandCategory, HandlerDescriptor};

const DEFAULT_LEVEL: u8 = 1;
const MAX_LEVEL: u8 = 4;

pub fn descriptor() -> HandlerDescriptor {
    HandlerDescriptor::builder("${prefix}administrators", AdministratorsHandler)
        .alias("${prefix}admins")
        .usage("${prefix}administrators <add|remove|list> [role] [level]")
        .description(
            "Manages the roles allowed to use administration and moderation commands.",
        )
        .category(CommandCategory::Administration)
        .minimum_arguments(1)
        .build()
}

pub struct AdministratorsHandler;

#[async_trait]
impl CommandAction for AdministratorsHandler {
    async fn execute(&self, ctx: CommandContext) -> Result<()> {
        match ctx.arg(0).unwrap_or_default() {
            "add" => self.handle_add(&ctx).await,
            "remove" => self.handle_remove(&ctx).await,
            "list" => self.handle_list(&ctx).await,
            other => {
                ctx.reply(format!(
                    "Unknown action `{other}`. The usage of this command is: `{}`.",
                    ctx.command.usage()
                ))
                .await?;
                Ok(())
            }
        }
    }
}

impl AdministratorsHandler {
    /// Handle `administrators add <role> [level]`
    async fn handle_add(&self, ctx: &CommandContext) -> Result<()> {
        let Some(role) = Self::role_argument(ctx).await? else {
            return Ok(());
        };

        let level = match ctx.arg(2) {
            None => DEFAULT_LEVEL,
            Some(raw) => match raw.parse::<u8>() {
                Ok(level) if (1..=MAX_LEVEL).contains(&level) => level,
                _ => {
                    ctx.reply(format!(
                        "The administrator level must be a number from 1 to {MAX_LEVEL}!"
                    ))
                    .await?;
                    return Ok(());
                }
            },
        };

        let added = ctx
            .admin_roles()
            .add_administrator_role(ctx.guild_id, role, level)
            .await?;
        info!(
            "[{}] Administrator role {role} (level {level}) set in guild {}",
            ctx.request_id, ctx.guild_id
        );

        let reply = if added {
            format!("Successfully added <@&{role}> as an administrator role with level {level}.")
        } else {
            format!("Updated <@&{role}> to administrator level {level}.")
        };
        ctx.reply(reply).await?;
        Ok(())
    }

    /// Handle `administrators remove <role>`
    async fn handle_remove(&self, ctx: &CommandContext) -> Result<()> {
        let Some(role) = Self::role_argument(ctx).await? else {
            return Ok(());
        };

        let removed = ctx
            .admin_roles()
            .remove_administrator_role(ctx.guild_id, role)
            .await?;

        let reply = if removed {
            info!(
                "[{}] Administrator role {role} removed in guild {}",
                ctx.request_id, ctx.guild_id
            );
            format!("Successfully removed <@&{role}> from the administrator roles.")
        } else {
            format!("<@&{role}> is not an administrator role!")
        };
        ctx.reply(reply).await?;
        Ok(())
    }

    /// Handle `administrators list`
    async fn handle_list(&self, ctx: &CommandContext) -> Result<()> {
        let roles = ctx.admin_roles().administrator_roles(ctx.guild_id).await?;
        if roles.is_empty() {
            ctx.reply("There are no administrator roles in this server.")
                .await?;
            return Ok(());
        }

        let mut output = String::from("**Administrator Roles:**\n");
        for (role, level) in roles {
            output.push_str(&format!("<@&{role}> - level {level}\n"));
        }
        ctx.reply(output.trim_end()).await?;
        Ok(())
    }

    /// Second argument as a role, replying with usage when missing or malformed
    async fn role_argument(ctx: &CommandContext) -> Result<Option<RoleId>> {
        match ctx.arg(1).and_then(parse_role) {
            Some(role) => Ok(Some(role)),
            None => {
                ctx.reply("Please give a role mention or role id!").await?;
                Ok(None)
            }
        }
    }
}

/// Accepts `123` or a role mention `<@&123>`
fn parse_role(raw: &str) -> Option<RoleId> {
    let id = raw
        .strip_prefix("<@&")
        .and_then(|s| s.strip_suffix('>'))
        .unwrap_or(raw);
    id.parse::<u64>().ok().map(RoleId)
}
