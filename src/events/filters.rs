//! Message filter pipeline
//!
//! Each filter is an independent predicate over an [`InboundMessage`]. The
//! pipeline evaluates them in order and stops at the first rejection; rejected
//! messages are dropped without any reply.

use async_trait::async_trait;
use log::debug;
use std::sync::Arc;

use super::InboundMessage;
use crate::transport::Transport;

/// A single predicate in the filter pipeline
pub trait EventFilter: Send + Sync {
    /// Short name used in debug logs
    fn name(&self) -> &'static str;

    /// Whether the message may continue down the pipeline
    fn accept(&self, message: &InboundMessage) -> bool;
}

/// Receiver of messages that made it through the pipeline
#[async_trait]
pub trait MessageSink: Send + Sync {
    async fn deliver(&self, message: InboundMessage, transport: Arc<dyn Transport>);
}

/// Rejects messages with no text content (embeds-only, system messages, empty edits)
pub struct NonEmptyContent;

impl EventFilter for NonEmptyContent {
    fn name(&self) -> &'static str {
        "non_empty_content"
    }

    fn accept(&self, message: &InboundMessage) -> bool {
        !message.content.is_empty()
    }
}

/// Rejects messages whose sender is not resolvable as a guild member
pub struct MemberPresent;

impl EventFilter for MemberPresent {
    fn name(&self) -> &'static str {
        "member_present"
    }

    fn accept(&self, message: &InboundMessage) -> bool {
        message.member.is_some()
    }
}

/// Rejects messages without an author identity
pub struct AuthorPresent;

impl EventFilter for AuthorPresent {
    fn name(&self) -> &'static str {
        "author_present"
    }

    fn accept(&self, message: &InboundMessage) -> bool {
        message.author.is_some()
    }
}

/// Rejects messages written by bots, including ourselves
pub struct NotAutomated;

impl EventFilter for NotAutomated {
    fn name(&self) -> &'static str {
        "not_automated"
    }

    fn accept(&self, message: &InboundMessage) -> bool {
        message.author.as_ref().is_some_and(|author| !author.bot)
    }
}

/// Ordered, short-circuiting chain of [`EventFilter`]s
pub struct FilterPipeline {
    filters: Vec<Box<dyn EventFilter>>,
}

impl FilterPipeline {
    /// Create an empty pipeline that accepts everything
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// The pipeline used in front of the command dispatcher, cheapest checks first
    pub fn standard() -> Self {
        Self::new()
            .with(NonEmptyContent)
            .with(MemberPresent)
            .with(AuthorPresent)
            .with(NotAutomated)
    }

    /// Append a filter to the end of the chain
    pub fn with(mut self, filter: impl EventFilter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Run the message through every filter, stopping at the first rejection
    pub fn accepts(&self, message: &InboundMessage) -> bool {
        match self.filters.iter().find(|filter| !filter.accept(message)) {
            Some(filter) => {
                debug!(
                    "Message {} dropped by filter '{}'",
                    message.id,
                    filter.name()
                );
                false
            }
            None => true,
        }
    }

    /// Hand the message to `sink` if it passes the pipeline
    ///
    /// Returns whether the message was delivered.
    pub async fn forward<S>(
        &self,
        message: InboundMessage,
        transport: Arc<dyn Transport>,
        sink: &S,
    ) -> bool
    where
        S: MessageSink + ?Sized,
    {
        if !self.accepts(&message) {
            return false;
        }
        sink.deliver(message, transport).await;
        true
    }
}

impl Default for FilterPipeline {
    fn default() -> Self {
        Self::standard()
    }
}
