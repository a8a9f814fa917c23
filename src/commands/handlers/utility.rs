//! Utility command handlers
//!
//! Handles: ping, prefix

use anyhow::Result;
use async_trait::async_trait;
use log::info;
use std::time::Instant;

use crate::commands::context::CommandContext;
use crate::commands::handler::{CommandAction, CommandCategory, HandlerDescriptor};

pub fn ping_descriptor() -> HandlerDescriptor {
    HandlerDescriptor::builder("${prefix}ping", PingHandler)
        .description("Checks that the bot is responsive.")
        .category(CommandCategory::Utility)
        .build()
}

pub fn prefix_descriptor() -> HandlerDescriptor {
    HandlerDescriptor::builder("${prefix}prefix", PrefixHandler)
        .description("Shows the command prefix.")
        .category(CommandCategory::Utility)
        .build()
}

pub struct PingHandler;

#[async_trait]
impl CommandAction for PingHandler {
    async fn execute(&self, ctx: CommandContext) -> Result<()> {
        let started = Instant::now();
        ctx.reply("Pong!").await?;
        let elapsed = started.elapsed().as_millis();

        ctx.reply(format!("Round trip took {elapsed}ms.")).await?;
        info!("[{}] Ping command completed for user {}", ctx.request_id, ctx.actor.id);
        Ok(())
    }
}

pub struct PrefixHandler;

#[async_trait]
impl CommandAction for PrefixHandler {
    async fn execute(&self, ctx: CommandContext) -> Result<()> {
        ctx.reply(format!("The command prefix is `{}`.", ctx.prefix()))
            .await?;
        Ok(())
    }
}
