//! Prefix command dispatcher
//!
//! Turns a filtered [`InboundMessage`] into at most one command invocation:
//! prefix match, tokenize, resolve, authorize, check argument count, execute.
//! Every failure after the prefix match is answered in the channel; nothing a
//! single invocation does can take the dispatcher down.
//!
//! - **Version**: 1.3.0
//! - **Since**: 1.0.0
//!
//! ## Changelog
//! - 1.3.0: Resolve the guild owner only for privileged commands
//! - 1.2.0: Run handlers on their own task so panics are contained
//! - 1.1.0: Distinguish permission lookup failures from denials
//! - 1.0.0: Initial implementation

use async_trait::async_trait;
use log::{debug, error, info, warn};
use serenity::model::id::{GuildId, UserId};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use super::context::{CommandContext, Services};
use super::permissions::{PermissionGate, PermissionLookupError};
use crate::events::{InboundMessage, MessageSink};
use crate::transport::Transport;

pub const DENIED_REPLY: &str = "Sorry, you don't have high enough permissions.";
pub const FAILURE_REPLY: &str = "Sorry, something went wrong while running that command.";

/// Steps of a single invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationState {
    Received,
    PrefixMatched,
    Tokenized,
    Resolved,
    Authorized,
    ArgcValid,
    Executing,
    Completed,
    Failed,
}

impl fmt::Display for InvocationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InvocationState::Received => "RECEIVED",
            InvocationState::PrefixMatched => "PREFIX_MATCHED",
            InvocationState::Tokenized => "TOKENIZED",
            InvocationState::Resolved => "RESOLVED",
            InvocationState::Authorized => "AUTHORIZED",
            InvocationState::ArgcValid => "ARGC_VALID",
            InvocationState::Executing => "EXECUTING",
            InvocationState::Completed => "COMPLETED",
            InvocationState::Failed => "FAILED",
        };
        f.write_str(name)
    }
}

/// Why an invocation ended in [`InvocationState::Failed`]
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("unknown command `{0}`")]
    UnknownCommand(String),

    #[error("user {actor} is not allowed to run `{command}`")]
    AuthorizationDenied { command: String, actor: UserId },

    #[error("`{command}` needs at least {required} argument(s), got {given}")]
    InsufficientArguments {
        command: String,
        required: usize,
        given: usize,
    },

    #[error(transparent)]
    PermissionLookup(#[from] PermissionLookupError),

    #[error("`{command}` failed")]
    HandlerExecution {
        command: String,
        #[source]
        source: anyhow::Error,
    },
}

/// Result of handing one message to the dispatcher
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Not a command; nothing was sent
    Ignored,
    Completed { command: String },
    Failed(DispatchError),
}

impl DispatchOutcome {
    pub fn is_ignored(&self) -> bool {
        matches!(self, DispatchOutcome::Ignored)
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, DispatchOutcome::Completed { .. })
    }

    pub fn error(&self) -> Option<&DispatchError> {
        match self {
            DispatchOutcome::Failed(e) => Some(e),
            _ => None,
        }
    }
}

/// Routes messages to registered command handlers
///
/// Holds no per-invocation state, so one instance serves every concurrent
/// message.
pub struct Dispatcher {
    services: Arc<Services>,
    gate: PermissionGate,
}

impl Dispatcher {
    pub fn new(services: Services, gate: PermissionGate) -> Self {
        Self {
            services: Arc::new(services),
            gate,
        }
    }

    pub fn prefix(&self) -> &str {
        self.services.registry.prefix()
    }

    /// Run one message through the invocation state machine
    pub async fn dispatch(
        &self,
        message: InboundMessage,
        transport: Arc<dyn Transport>,
    ) -> DispatchOutcome {
        let request_id = Uuid::new_v4();
        let mut state = InvocationState::Received;

        let (Some(guild_id), Some(mut actor)) = (message.guild_id, message.actor()) else {
            return DispatchOutcome::Ignored;
        };

        // Prefix followed by something that looks like a command name
        let Some(body) = message.content.strip_prefix(self.prefix()) else {
            return DispatchOutcome::Ignored;
        };
        if !body.chars().next().is_some_and(char::is_alphanumeric) {
            return DispatchOutcome::Ignored;
        }
        state = advance(request_id, state, InvocationState::PrefixMatched);

        let mut tokens = message.content.split_whitespace();
        let command_token = tokens.next().unwrap_or_default().to_string();
        let args: Vec<String> = tokens.map(str::to_string).collect();
        state = advance(request_id, state, InvocationState::Tokenized);

        info!(
            "[{request_id}] 📥 Command {command_token} | User: {} | Channel: {} | Guild: {guild_id} | Args: {}",
            actor.id,
            message.channel_id,
            args.len()
        );

        let Some(descriptor) = self.services.registry.resolve(&command_token) else {
            let reply = format!(
                "Unknown command `{command_token}`. Use `{}help` to see the available commands.",
                self.prefix()
            );
            send(request_id, transport.as_ref(), &message, &reply).await;
            return fail(request_id, state, DispatchError::UnknownCommand(command_token));
        };
        state = advance(request_id, state, InvocationState::Resolved);

        // Ownership only changes the answer for privileged commands
        if descriptor.category().is_privileged() && !self.gate.is_bot_administrator(actor.id) {
            actor.is_guild_owner =
                is_guild_owner(request_id, transport.as_ref(), guild_id, actor.id).await;
        }

        match self
            .gate
            .authorize(guild_id, &actor, descriptor.category())
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                send(request_id, transport.as_ref(), &message, DENIED_REPLY).await;
                return fail(
                    request_id,
                    state,
                    DispatchError::AuthorizationDenied {
                        command: descriptor.name().to_string(),
                        actor: actor.id,
                    },
                );
            }
            Err(e) => {
                error!("[{request_id}] ❌ {e}: {:#}", e.source);
                send(request_id, transport.as_ref(), &message, DENIED_REPLY).await;
                return fail(request_id, state, DispatchError::PermissionLookup(e));
            }
        }
        state = advance(request_id, state, InvocationState::Authorized);

        if args.len() < descriptor.minimum_arguments() {
            let reply = format!(
                "Huh? Could you repeat that? The usage of this command is: `{}`.",
                descriptor.usage()
            );
            send(request_id, transport.as_ref(), &message, &reply).await;
            return fail(
                request_id,
                state,
                DispatchError::InsufficientArguments {
                    command: descriptor.name().to_string(),
                    required: descriptor.minimum_arguments(),
                    given: args.len(),
                },
            );
        }
        state = advance(request_id, state, InvocationState::ArgcValid);

        let command = descriptor.name().to_string();
        let action = descriptor.action();
        let ctx = CommandContext {
            request_id,
            actor,
            guild_id,
            channel_id: message.channel_id,
            message_id: message.id,
            raw_content: message.content.clone(),
            args,
            command: descriptor,
            transport: Arc::clone(&transport),
            services: Arc::clone(&self.services),
        };
        state = advance(request_id, state, InvocationState::Executing);

        // Own task per invocation: a panicking handler only takes its task down
        let result = tokio::spawn(async move { action.execute(ctx).await }).await;
        let failure = match result {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e),
            Err(join_error) => Some(anyhow::anyhow!("handler task aborted: {join_error}")),
        };

        match failure {
            None => {
                advance(request_id, state, InvocationState::Completed);
                info!("[{request_id}] ✅ {command} completed");
                DispatchOutcome::Completed { command }
            }
            Some(source) => {
                error!("[{request_id}] ❌ {command} failed: {source:#}");
                send(request_id, transport.as_ref(), &message, FAILURE_REPLY).await;
                fail(
                    request_id,
                    state,
                    DispatchError::HandlerExecution { command, source },
                )
            }
        }
    }
}

#[async_trait]
impl MessageSink for Dispatcher {
    async fn deliver(&self, message: InboundMessage, transport: Arc<dyn Transport>) {
        self.dispatch(message, transport).await;
    }
}

/// A failed lookup counts as "not the owner"; role checks still apply
async fn is_guild_owner(
    request_id: Uuid,
    transport: &dyn Transport,
    guild: GuildId,
    user: UserId,
) -> bool {
    match transport.guild_owner(guild).await {
        Ok(owner) => owner == user,
        Err(e) => {
            warn!("[{request_id}] Could not resolve owner of guild {guild}: {e:#}");
            false
        }
    }
}

fn advance(request_id: Uuid, from: InvocationState, to: InvocationState) -> InvocationState {
    debug!("[{request_id}] {from} -> {to}");
    to
}

fn fail(request_id: Uuid, from: InvocationState, error: DispatchError) -> DispatchOutcome {
    advance(request_id, from, InvocationState::Failed);
    debug!("[{request_id}] Invocation failed: {error}");
    DispatchOutcome::Failed(error)
}

/// Reply in the originating channel; a failed send is logged, never propagated
async fn send(request_id: Uuid, transport: &dyn Transport, message: &InboundMessage, text: &str) {
    if let Err(e) = transport.send_message(message.channel_id, text).await {
        warn!(
            "[{request_id}] Failed to reply in channel {}: {e}",
            message.channel_id
        );
    }
}
