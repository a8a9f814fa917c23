//! Someone command handler
//!
//! Handles: someone

use anyhow::Result;
use async_trait::async_trait;
use rand::seq::IndexedRandom;
use serenity::model::mention::Mentionable;

use crate::commands::context::CommandContext;
use crate::commands::handler::{CommandAction, CommandCategory, HandlerDescriptor};

pub fn descriptor() -> HandlerDescriptor {
    HandlerDescriptor::builder("${prefix}someone", SomeoneHandler)
        .description("Pings a random person.")
        .category(CommandCategory::Other)
        .build()
}

pub struct SomeoneHandler;

#[async_trait]
impl CommandAction for SomeoneHandler {
    async fn execute(&self, ctx: CommandContext) -> Result<()> {
        let members = ctx.transport.guild_members(ctx.guild_id).await?;

        let chosen = members.choose(&mut rand::rng()).copied();
        match chosen {
            Some(member) => ctx.reply(member.mention().to_string()).await?,
            None => ctx.reply("There is nobody here to ping!").await?,
        };
        Ok(())
    }
}
