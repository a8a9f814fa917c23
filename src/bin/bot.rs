use anyhow::Result;
use dotenvy::dotenv;
use log::{error, info, warn};
use serenity::async_trait;
use serenity::model::channel::Message;
use serenity::model::gateway::{Activity, Ready};
use serenity::prelude::*;
use std::sync::Arc;

use adminbot::commands::handlers::builtin_namespace;
use adminbot::commands::{CommandRegistry, Dispatcher, PermissionGate, Services};
use adminbot::core::{Config, SettingsFile};
use adminbot::database::Database;
use adminbot::events::FilterPipeline;
use adminbot::features::startup::RestartNotifier;
use adminbot::transport::{inbound_from_message, SerenityTransport};

struct Handler {
    pipeline: FilterPipeline,
    dispatcher: Dispatcher,
    restart_notifier: RestartNotifier,
    activity: String,
}

#[async_trait]
impl EventHandler for Handler {
    async fn message(&self, ctx: Context, msg: Message) {
        let inbound = inbound_from_message(&msg);
        let transport =
            Arc::new(SerenityTransport::new(ctx.http.clone()).with_cache(ctx.cache.clone()));
        self.pipeline
            .forward(inbound, transport, &self.dispatcher)
            .await;
    }

    async fn ready(&self, ctx: Context, ready: Ready) {
        info!("🎉 {} is connected and ready!", ready.user.name);
        info!("📡 Connected to {} guilds", ready.guilds.len());
        info!("🤖 Bot ID: {}", ready.user.id);
        info!("⌨️ Command prefix: {}", self.dispatcher.prefix());

        let shard_id = ready.shard.map(|shard| shard[0]).unwrap_or_default();
        if let Some(shard) = ready.shard {
            info!("⚡ Shard: {}/{}", shard[0] + 1, shard[1]);
        }

        ctx.set_activity(Activity::playing(format!(
            "{} | Shard ID: {shard_id}",
            self.activity
        )))
        .await;

        self.restart_notifier
            .send_if_enabled(&ctx.http, &ready)
            .await;
    }
}

fn load_config() -> Result<Config> {
    let config = Config::from_env()?;
    match SettingsFile::load(&config.settings_path)? {
        Some(settings) => config.with_settings(settings),
        None => Ok(config),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    let config = load_config()?;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&config.log_level))
        .init();

    info!("Starting admin bot...");

    let database = Arc::new(Database::new(&config.database_path).await?);
    info!("📄 Opened administrator role store at {}", config.database_path);

    let mut registry = CommandRegistry::new(config.command_prefix.clone());
    let registered = registry.discover_and_register_all(&builtin_namespace())?;
    info!("🔌 Registered {registered} commands");

    let gate = PermissionGate::new(database.clone())
        .with_bot_administrators(config.bot_administrators.iter().copied());
    let services = Services {
        registry: Arc::new(registry),
        admin_roles: database,
    };

    let restart_notifier = RestartNotifier::new(config.log_dump_webhook.as_deref());
    if !restart_notifier.is_enabled() {
        info!("No log dump webhook configured - restart notice disabled");
    }

    let handler = Handler {
        pipeline: FilterPipeline::standard(),
        dispatcher: Dispatcher::new(services, gate),
        restart_notifier,
        activity: config.activity.clone(),
    };

    let intents = GatewayIntents::GUILDS
        | GatewayIntents::GUILD_MESSAGES
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = Client::builder(&config.discord_token, intents)
        .event_handler(handler)
        .await
        .map_err(|e| {
            error!("Failed to create Discord client: {e}");
            anyhow::anyhow!("Client creation failed: {}", e)
        })?;

    let shard_manager = client.shard_manager.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Could not register Ctrl-C handler: {e}");
            return;
        }
        info!("Shutting down!");
        shard_manager.lock().await.shutdown_all().await;
    });

    info!("Establishing WebSocket connection to Discord gateway...");
    info!("Gateway intents: {intents:?}");

    if let Err(why) = client.start().await {
        error!("Gateway connection failed: {why:?}");
        return Err(anyhow::anyhow!(
            "Failed to establish gateway connection: {}",
            why
        ));
    }

    Ok(())
}
