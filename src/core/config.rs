//! Bot configuration
//!
//! Read once at startup from the environment (after `.env` is loaded), then
//! optionally overlaid with a YAML settings file. The result is immutable for
//! the lifetime of the process; changing the prefix needs a restart so every
//! command is registered again under the new name.
//!
//! - **Version**: 1.1.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.1.0: YAML settings overlay
//! - 1.0.0: Environment-based configuration

use anyhow::{anyhow, Context, Result};
use serde::Deserialize;
use serenity::model::id::UserId;
use std::path::Path;

pub const DEFAULT_PREFIX: &str = ">";
pub const DEFAULT_ACTIVITY: &str = "moderating";
pub const DEFAULT_DATABASE_PATH: &str = "adminbot.db";
pub const DEFAULT_SETTINGS_PATH: &str = "bot.yaml";

#[derive(Debug, Clone)]
pub struct Config {
    pub discord_token: String,
    pub command_prefix: String,
    pub activity: String,
    pub bot_administrators: Vec<UserId>,
    pub database_path: String,
    pub log_level: String,
    pub log_dump_webhook: Option<String>,
    pub settings_path: String,
}

/// Optional YAML overlay; every field that is set replaces the env value
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SettingsFile {
    pub prefix: Option<String>,
    pub activity: Option<String>,
    pub bot_administrators: Option<Vec<u64>>,
    pub log_dump_webhook: Option<String>,
}

impl SettingsFile {
    /// Load the overlay, or `None` if the file does not exist
    pub fn load(path: impl AsRef<Path>) -> Result<Option<Self>> {
        let path = path.as_ref();
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        let settings = serde_yaml::from_str(&contents)
            .with_context(|| format!("invalid settings file {}", path.display()))?;
        Ok(Some(settings))
    }
}

impl Config {
    /// Build the configuration from process environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let discord_token = non_empty("DISCORD_TOKEN")
            .ok_or_else(|| anyhow!("DISCORD_TOKEN environment variable is required"))?;

        let bot_administrators = match non_empty("BOT_ADMINISTRATORS") {
            Some(raw) => parse_user_ids(&raw).context("invalid BOT_ADMINISTRATORS")?,
            None => Vec::new(),
        };

        let config = Config {
            discord_token,
            command_prefix: non_empty("COMMAND_PREFIX").unwrap_or_else(|| DEFAULT_PREFIX.to_string()),
            activity: non_empty("BOT_ACTIVITY").unwrap_or_else(|| DEFAULT_ACTIVITY.to_string()),
            bot_administrators,
            database_path: non_empty("DATABASE_PATH")
                .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
            log_level: non_empty("LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            log_dump_webhook: non_empty("LOG_DUMP_WEBHOOK"),
            settings_path: non_empty("BOT_SETTINGS_PATH")
                .unwrap_or_else(|| DEFAULT_SETTINGS_PATH.to_string()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Apply a settings overlay and validate the result
    pub fn with_settings(mut self, settings: SettingsFile) -> Result<Self> {
        if let Some(prefix) = settings.prefix {
            self.command_prefix = prefix;
        }
        if let Some(activity) = settings.activity {
            self.activity = activity;
        }
        if let Some(admins) = settings.bot_administrators {
            self.bot_administrators = admins.into_iter().map(UserId).collect();
        }
        if let Some(webhook) = settings.log_dump_webhook {
            self.log_dump_webhook = Some(webhook).filter(|w| !w.trim().is_empty());
        }
        self.validate()?;
        Ok(self)
    }

    pub fn validate(&self) -> Result<()> {
        if self.command_prefix.is_empty() {
            return Err(anyhow!("command prefix must not be empty"));
        }
        if self.command_prefix.chars().any(char::is_whitespace) {
            return Err(anyhow!(
                "command prefix must not contain whitespace: {:?}",
                self.command_prefix
            ));
        }
        Ok(())
    }
}

/// Parse a comma-separated list of user ids
pub fn parse_user_ids(raw: &str) -> Result<Vec<UserId>> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u64>()
                .map(UserId)
                .map_err(|_| anyhow!("not a user id: {s}"))
        })
        .collect()
}
