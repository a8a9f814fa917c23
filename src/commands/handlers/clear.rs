//! Clear command handler
//!
//! Handles: clear (alias: purge)
//!
//! - **Version**: 1.2.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.2.0: Forget idle channel locks, only report permission failures as such
//! - 1.1.0: One purge per channel at a time, timeout on history retrieval
//! - 1.0.0: Initial implementation

use anyhow::Result;
use async_trait::async_trait;
use dashmap::DashMap;
use log::{info, warn};
use serenity::model::id::ChannelId;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::commands::context::CommandContext;
use crate::commands::handler::{CommandAction, CommandCategory, HandlerDescriptor};
use crate::transport::{is_missing_permissions, MAX_BATCH};

/// How long the confirmation message stays before it deletes itself
const CONFIRMATION_LIFETIME: Duration = Duration::from_secs(3);
const HISTORY_TIMEOUT: Duration = Duration::from_secs(30);

pub fn descriptor() -> HandlerDescriptor {
    HandlerDescriptor::builder("${prefix}clear", ClearHandler::default())
        .alias("${prefix}purge")
        .usage("${prefix}clear <amount>")
        .description(
            "Clears the specified amount of messages. The amount of messages to be cleared \
             cannot exceed 100, or be below 1.",
        )
        .category(CommandCategory::Administration)
        .minimum_arguments(1)
        .build()
}

/// Bulk-deletes recent messages in the invoking channel
#[derive(Default)]
pub struct ClearHandler {
    // One purge per channel at a time; entries are removed once idle
    channel_locks: DashMap<ChannelId, Arc<Mutex<()>>>,
}

impl ClearHandler {
    fn channel_lock(&self, channel: ChannelId) -> Arc<Mutex<()>> {
        self.channel_locks.entry(channel).or_default().clone()
    }

    /// Drop our handle and forget the lock once nobody else holds or awaits it
    fn release_channel_lock(&self, channel: ChannelId, lock: Arc<Mutex<()>>) {
        drop(lock);
        self.channel_locks
            .remove_if(&channel, |_, lock| Arc::strong_count(lock) == 1);
    }

    /// Fetch and delete up to `amount` messages; the caller holds the channel lock
    async fn purge(&self, ctx: &CommandContext, amount: usize) -> Result<()> {
        let request_id = ctx.request_id;

        let messages = match timeout(
            HISTORY_TIMEOUT,
            ctx.transport
                .recent_messages(ctx.channel_id, ctx.message_id, amount),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                warn!("[{request_id}] History retrieval timed out in channel {}", ctx.channel_id);
                ctx.reply("Timed out while fetching messages to clear, please try again.")
                    .await?;
                return Ok(());
            }
        };

        if messages.is_empty() {
            ctx.reply("There are no messages to clear.").await?;
            return Ok(());
        }

        if let Err(e) = ctx.transport.bulk_delete(ctx.channel_id, &messages).await {
            warn!("[{request_id}] Bulk delete failed in channel {}: {e:#}", ctx.channel_id);
            if is_missing_permissions(&e) {
                ctx.reply("Cannot clear messages due to insufficient permissions!")
                    .await?;
                return Ok(());
            }
            return Err(e.context("bulk delete failed"));
        }

        let purged = messages.len();
        info!(
            "[{request_id}] Purged {purged} message(s) in channel {} for user {}",
            ctx.channel_id, ctx.actor.id
        );

        let confirmation = ctx
            .reply(format!("Successfully purged {purged} message(s)."))
            .await?;

        let transport = Arc::clone(&ctx.transport);
        let channel = ctx.channel_id;
        tokio::spawn(async move {
            tokio::time::sleep(CONFIRMATION_LIFETIME).await;
            if let Err(e) = transport.delete_message(channel, confirmation).await {
                warn!("Failed to delete purge confirmation in channel {channel}: {e}");
            }
        });

        Ok(())
    }
}

#[async_trait]
impl CommandAction for ClearHandler {
    async fn execute(&self, ctx: CommandContext) -> Result<()> {
        let amount = match ctx.arg(0).unwrap_or_default().parse::<i64>() {
            Ok(amount) => amount,
            Err(_) => {
                ctx.reply("The amount of messages to be cleared is not a number!")
                    .await?;
                return Ok(());
            }
        };
        if amount > MAX_BATCH as i64 {
            ctx.reply("Sorry, but the limit for message clearing is 100 messages.")
                .await?;
            return Ok(());
        }
        if amount < 1 {
            ctx.reply("Sorry, but the minimum for message clearing is 1 message.")
                .await?;
            return Ok(());
        }

        let channel = ctx.channel_id;
        let lock = self.channel_lock(channel);
        let result = {
            let _guard = lock.lock().await;
            self.purge(&ctx, amount as usize).await
        };
        self.release_channel_lock(channel, lock);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::context::Services;
    use crate::commands::dispatcher::{DispatchError, Dispatcher, DENIED_REPLY, FAILURE_REPLY};
    use crate::commands::permissions::PermissionGate;
    use crate::commands::registry::CommandRegistry;
    use crate::testing::{
        admin_message, guild_message, MemoryAdminRoles, MockTransport, ADMIN_ROLE, CHANNEL, GUILD,
    };

    fn dispatcher() -> Dispatcher {
        let mut registry = CommandRegistry::new(">");
        registry.register(descriptor()).unwrap();
        let store = Arc::new(MemoryAdminRoles::with_role(GUILD, ADMIN_ROLE));
        Dispatcher::new(
            Services {
                registry: Arc::new(registry),
                admin_roles: store.clone(),
            },
            PermissionGate::new(store),
        )
    }

    #[tokio::test]
    async fn test_clear_without_amount_replies_usage() {
        let transport = Arc::new(MockTransport::new().with_history(CHANNEL, 10));
        let outcome = dispatcher()
            .dispatch(admin_message(">clear"), transport.clone())
            .await;

        assert!(matches!(
            outcome.error(),
            Some(DispatchError::InsufficientArguments { .. })
        ));
        assert!(transport.last_reply().unwrap().contains(">clear <amount>"));
        assert_eq!(transport.history_requests(), 0);
    }

    #[tokio::test]
    async fn test_clear_denied_for_non_admin() {
        let transport = Arc::new(MockTransport::new().with_history(CHANNEL, 60));
        let outcome = dispatcher()
            .dispatch(guild_message(">clear 50"), transport.clone())
            .await;

        assert!(matches!(
            outcome.error(),
            Some(DispatchError::AuthorizationDenied { .. })
        ));
        assert_eq!(transport.last_reply().as_deref(), Some(DENIED_REPLY));
        assert_eq!(transport.history_requests(), 0);
        assert!(transport.bulk_deleted().is_empty());
    }

    #[tokio::test]
    async fn test_clear_over_limit() {
        let transport = Arc::new(MockTransport::new().with_history(CHANNEL, 200));
        let outcome = dispatcher()
            .dispatch(admin_message(">clear 150"), transport.clone())
            .await;

        assert!(outcome.is_completed());
        assert!(transport.last_reply().unwrap().contains("limit"));
        assert_eq!(transport.history_requests(), 0);
        assert!(transport.bulk_deleted().is_empty());
    }

    #[tokio::test]
    async fn test_clear_below_minimum() {
        let transport = Arc::new(MockTransport::new().with_history(CHANNEL, 5));
        dispatcher()
            .dispatch(admin_message(">clear 0"), transport.clone())
            .await;

        assert!(transport.last_reply().unwrap().contains("minimum"));
        assert!(transport.bulk_deleted().is_empty());
    }

    #[tokio::test]
    async fn test_clear_not_a_number() {
        let transport = Arc::new(MockTransport::new().with_history(CHANNEL, 5));
        let outcome = dispatcher()
            .dispatch(admin_message(">clear lots"), transport.clone())
            .await;

        assert!(outcome.is_completed());
        assert_eq!(
            transport.last_reply().as_deref(),
            Some("The amount of messages to be cleared is not a number!")
        );
        assert_eq!(transport.history_requests(), 0);
    }

    #[tokio::test]
    async fn test_clear_purges_exact_amount() {
        let transport = Arc::new(MockTransport::new().with_history(CHANNEL, 12));
        let outcome = dispatcher()
            .dispatch(admin_message(">clear 5"), transport.clone())
            .await;

        assert!(outcome.is_completed());
        assert_eq!(transport.bulk_deleted().len(), 5);
        assert_eq!(transport.remaining_history(CHANNEL), 7);
        assert_eq!(
            transport.last_reply().as_deref(),
            Some("Successfully purged 5 message(s).")
        );
    }

    #[tokio::test]
    async fn test_clear_alias() {
        let transport = Arc::new(MockTransport::new().with_history(CHANNEL, 3));
        dispatcher()
            .dispatch(admin_message(">purge 3"), transport.clone())
            .await;
        assert_eq!(transport.bulk_deleted().len(), 3);
    }

    #[tokio::test]
    async fn test_clear_fewer_messages_than_requested() {
        let transport = Arc::new(MockTransport::new().with_history(CHANNEL, 2));
        dispatcher()
            .dispatch(admin_message(">clear 10"), transport.clone())
            .await;
        assert_eq!(
            transport.last_reply().as_deref(),
            Some("Successfully purged 2 message(s).")
        );
    }

    #[tokio::test]
    async fn test_clear_empty_channel() {
        let transport = Arc::new(MockTransport::new());
        dispatcher()
            .dispatch(admin_message(">clear 10"), transport.clone())
            .await;
        assert_eq!(
            transport.last_reply().as_deref(),
            Some("There are no messages to clear.")
        );
    }

    #[tokio::test]
    async fn test_clear_without_permission_to_delete() {
        let transport = Arc::new(
            MockTransport::new()
                .with_history(CHANNEL, 10)
                .failing_bulk_delete(),
        );
        let outcome = dispatcher()
            .dispatch(admin_message(">clear 5"), transport.clone())
            .await;

        assert!(outcome.is_completed());
        assert!(transport.last_reply().unwrap().contains("insufficient permissions"));
    }

    #[tokio::test]
    async fn test_clear_other_delete_failure_is_generic() {
        let transport = Arc::new(
            MockTransport::new()
                .with_history(CHANNEL, 10)
                .rejecting_bulk_delete(),
        );
        let outcome = dispatcher()
            .dispatch(admin_message(">clear 5"), transport.clone())
            .await;

        assert!(matches!(
            outcome.error(),
            Some(DispatchError::HandlerExecution { .. })
        ));
        assert_eq!(transport.last_reply().as_deref(), Some(FAILURE_REPLY));
    }

    #[tokio::test(start_paused = true)]
    async fn test_clear_history_timeout() {
        let transport = Arc::new(
            MockTransport::new()
                .with_history(CHANNEL, 10)
                .with_history_delay(HISTORY_TIMEOUT * 2),
        );
        let outcome = dispatcher()
            .dispatch(admin_message(">clear 3"), transport.clone())
            .await;

        assert!(outcome.is_completed());
        assert_eq!(
            transport.last_reply().as_deref(),
            Some("Timed out while fetching messages to clear, please try again.")
        );
        assert!(transport.bulk_deleted().is_empty());
        assert_eq!(transport.remaining_history(CHANNEL), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_clears_in_one_channel_do_not_interleave() {
        let transport = Arc::new(
            MockTransport::new()
                .with_history(CHANNEL, 10)
                .with_history_delay(Duration::from_secs(1)),
        );
        let dispatcher = dispatcher();

        let (first, second) = tokio::join!(
            dispatcher.dispatch(admin_message(">clear 3"), transport.clone()),
            dispatcher.dispatch(admin_message(">clear 3"), transport.clone()),
        );

        assert!(first.is_completed());
        assert!(second.is_completed());
        assert_eq!(
            transport.calls(),
            vec!["history", "bulk_delete", "history", "bulk_delete"]
        );

        let mut deleted = transport.bulk_deleted();
        deleted.sort();
        deleted.dedup();
        assert_eq!(deleted.len(), 6);
        assert_eq!(transport.remaining_history(CHANNEL), 4);
    }

    #[test]
    fn test_idle_channel_locks_are_forgotten() {
        let handler = ClearHandler::default();
        let running = handler.channel_lock(CHANNEL);
        let waiting = handler.channel_lock(CHANNEL);

        handler.release_channel_lock(CHANNEL, running);
        assert!(handler.channel_locks.contains_key(&CHANNEL));

        handler.release_channel_lock(CHANNEL, waiting);
        assert!(handler.channel_locks.is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_confirmation_deleted_after_delay() {
        let transport = Arc::new(MockTransport::new().with_history(CHANNEL, 4));
        dispatcher()
            .dispatch(admin_message(">clear 4"), transport.clone())
            .await;
        assert!(transport.deleted().is_empty());

        tokio::time::sleep(CONFIRMATION_LIFETIME + Duration::from_millis(10)).await;
        assert_eq!(transport.deleted().len(), 1);
    }
}
