//! # Feature: Restart Notification
//!
//! Posts a notice to the log-dump webhook when the bot comes online.
//!
//! - **Version**: 2.0.0
//! - **Since**: 0.4.0
//! - **Toggleable**: true
//!
//! ## Changelog
//! - 2.0.0: Deliver through a webhook configured by `LOG_DUMP_WEBHOOK`
//! - 1.0.0: Initial release with DM and channel support, rich embeds

use anyhow::{anyhow, Result};
use chrono::Utc;
use log::{info, warn};
use regex::Regex;
use serenity::http::Http;
use serenity::model::channel::Embed;
use serenity::model::gateway::Ready;
use serenity::model::Timestamp;
use serenity::utils::Color;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;

static WEBHOOK_PATTERN: OnceLock<Option<Regex>> = OnceLock::new();

fn webhook_pattern() -> Option<&'static Regex> {
    WEBHOOK_PATTERN
        .get_or_init(|| {
            Regex::new(r"^https://discord(?:app)?\.com/api/webhooks/(\d+)/([\w-]+)/?$").ok()
        })
        .as_ref()
}

/// Split a webhook URL into its id and token
pub fn parse_webhook_url(url: &str) -> Result<(u64, String)> {
    let pattern = webhook_pattern().ok_or_else(|| anyhow!("webhook pattern failed to compile"))?;
    let captures = pattern
        .captures(url.trim())
        .ok_or_else(|| anyhow!("not a Discord webhook URL: {url}"))?;

    let id = captures[1].parse::<u64>()?;
    Ok((id, captures[2].to_string()))
}

/// Sends the restart notice once per process
pub struct RestartNotifier {
    webhook: Option<(u64, String)>,
    // Ready fires again on every reconnect
    first_ready: AtomicBool,
}

impl RestartNotifier {
    /// Build from the configured webhook URL; an invalid URL disables the notice
    pub fn new(webhook_url: Option<&str>) -> Self {
        let webhook = webhook_url.and_then(|url| match parse_webhook_url(url) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                warn!("Ignoring LOG_DUMP_WEBHOOK: {e}");
                None
            }
        });

        Self {
            webhook,
            first_ready: AtomicBool::new(true),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.webhook.is_some()
    }

    /// True exactly once, on the first call
    fn claim_first_ready(&self) -> bool {
        self.first_ready.swap(false, Ordering::SeqCst)
    }

    /// Posts the notice if a webhook is configured and this is the first Ready event
    pub async fn send_if_enabled(&self, http: &Http, ready: &Ready) {
        if !self.claim_first_ready() {
            info!("Skipping restart notice (reconnect, not initial startup)");
            return;
        }

        let Some((id, token)) = &self.webhook else {
            return;
        };

        match Self::send(http, *id, token, ready).await {
            Ok(()) => info!("Sent restart notice to webhook {id}"),
            Err(e) => warn!("Failed to send restart notice to webhook {id}: {e}"),
        }
    }

    async fn send(http: &Http, id: u64, token: &str, ready: &Ready) -> Result<()> {
        let webhook = http.get_webhook_with_token(id, token).await?;

        let started = Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string();
        let embed = Embed::fake(|e| {
            e.title(":warning: Bot was restarted! :warning:")
                .description("This is a new run!")
                .color(Color::from_rgb(254, 231, 92))
                .footer(|f| f.text(format!("Started at {started}")))
                .timestamp(Timestamp::now())
        });

        let avatar = ready.user.avatar_url();
        webhook
            .execute(http, false, |w| {
                w.username(&ready.user.name).embeds(vec![embed]);
                if let Some(url) = &avatar {
                    w.avatar_url(url);
                }
                w
            })
            .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_webhook_url() {
        let (id, token) =
            parse_webhook_url("https://discord.com/api/webhooks/123456/abc-DEF_9").unwrap();
        assert_eq!(id, 123456);
        assert_eq!(token, "abc-DEF_9");
    }

    #[test]
    fn test_parse_legacy_domain() {
        let (id, _) = parse_webhook_url("https://discordapp.com/api/webhooks/42/token").unwrap();
        assert_eq!(id, 42);
    }

    #[test]
    fn test_parse_rejects_other_urls() {
        assert!(parse_webhook_url("https://example.com/api/webhooks/1/token").is_err());
        assert!(parse_webhook_url("https://discord.com/api/webhooks/abc/token").is_err());
        assert!(parse_webhook_url("").is_err());
    }

    #[test]
    fn test_invalid_url_disables_notice() {
        assert!(!RestartNotifier::new(Some("not a url")).is_enabled());
        assert!(!RestartNotifier::new(None).is_enabled());
        assert!(RestartNotifier::new(Some("https://discord.com/api/webhooks/1/t")).is_enabled());
    }

    #[test]
    fn test_first_ready_claimed_once() {
        let notifier = RestartNotifier::new(None);
        assert!(notifier.claim_first_ready());
        assert!(!notifier.claim_first_ready());
        assert!(!notifier.claim_first_ready());
    }
}
