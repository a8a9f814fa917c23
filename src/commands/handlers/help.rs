//! Help command handler
//!
//! Handles: help (alias: commands)

use anyhow::Result;
use async_trait::async_trait;

use crate::commands::context::CommandContext;
use crate::commands::handler::{CommandAction, CommandCategory, HandlerDescriptor};
use crate::core::chunk_for_message;

pub fn descriptor() -> HandlerDescriptor {
    HandlerDescriptor::builder("${prefix}help", HelpHandler)
        .alias("${prefix}commands")
        .usage("${prefix}help [command]")
        .description("Lists every command, or shows details for one command.")
        .category(CommandCategory::Utility)
        .build()
}

pub struct HelpHandler;

#[async_trait]
impl CommandAction for HelpHandler {
    async fn execute(&self, ctx: CommandContext) -> Result<()> {
        let text = match ctx.arg(0) {
            Some(name) => command_details(&ctx, name),
            None => command_listing(&ctx),
        };

        for chunk in chunk_for_message(&text) {
            ctx.reply(chunk).await?;
        }
        Ok(())
    }
}

fn command_listing(ctx: &CommandContext) -> String {
    let mut output = String::from("**Available Commands:**\n");

    for category in CommandCategory::ALL {
        let mut commands: Vec<_> = ctx
            .registry()
            .handlers()
            .filter(|h| h.category() == category)
            .collect();
        if commands.is_empty() {
            continue;
        }
        commands.sort_by(|a, b| a.name().cmp(b.name()));

        output.push_str(&format!("\n**{category}**\n"));
        for command in commands {
            output.push_str(&format!("`{}` - {}\n", command.usage(), command.description()));
        }
    }

    output.push_str(&format!(
        "\nUse `{}help <command>` for details on one command.",
        ctx.prefix()
    ));
    output
}

fn command_details(ctx: &CommandContext, name: &str) -> String {
    // Accept both `clear` and `>clear`
    let token = if name.starts_with(ctx.prefix()) {
        name.to_string()
    } else {
        format!("{}{name}", ctx.prefix())
    };

    let Some(command) = ctx.registry().resolve(&token) else {
        return format!("No command named `{token}` exists.");
    };

    let aliases = if command.aliases().is_empty() {
        "None".to_string()
    } else {
        command
            .aliases()
            .iter()
            .map(|a| format!("`{a}`"))
            .collect::<Vec<_>>()
            .join(", ")
    };

    format!(
        "**{}**\n{}\n\nUsage: `{}`\nAliases: {aliases}\nCategory: {}",
        command.name(),
        command.description(),
        command.usage(),
        command.category()
    )
}
