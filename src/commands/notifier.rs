//! Error notification.
//!
//! Recoverable dispatch failures are handed to an [`ErrorNotifier`] together with
//! the invoking message. Conversion errors are always reported; ignored outcomes
//! are reported as well so a notifier may choose to log them, but the bundled
//! notifiers never answer them in the chat.

use async_trait::async_trait;
use log::{debug, info};
use mockall::automock;
use std::{fmt, sync::Arc};

use crate::{
    commands::{binder::ConversionError, responses::format_conversion_error},
    platform::{InvokingMessage, MessageSink, OutboundMessage, ReplyTo},
};

/// Why a dispatch ended without running a handler, besides conversion errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoredReason {
    /// The name of the unknown command
    CommandNotFound(String),
    /// The name of the command the author may not run
    PermissionDenied(String),
}

impl fmt::Display for IgnoredReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IgnoredReason::CommandNotFound(name) => write!(f, "command `{}` not found", name),
            IgnoredReason::PermissionDenied(name) => {
                write!(f, "permission denied for command `{}`", name)
            }
        }
    }
}

/// Receives recoverable dispatch failures.
#[automock]
#[async_trait]
pub trait ErrorNotifier: Send + Sync {
    /// Called when a parameter could not be bound.
    async fn conversion_failed(
        &self,
        error: ConversionError,
        message: InvokingMessage,
    ) -> anyhow::Result<()>;

    /// Called when a command was not found or not permitted.
    async fn ignored(&self, reason: IgnoredReason, message: InvokingMessage)
    -> anyhow::Result<()>;
}

/// Replies to the invoking message with the conversion error.
pub struct ReplyErrorNotifier {
    sink: Arc<dyn MessageSink>,
}

impl ReplyErrorNotifier {
    pub fn new(sink: Arc<dyn MessageSink>) -> Self {
        ReplyErrorNotifier { sink }
    }
}

#[async_trait]
impl ErrorNotifier for ReplyErrorNotifier {
    async fn conversion_failed(
        &self,
        error: ConversionError,
        message: InvokingMessage,
    ) -> anyhow::Result<()> {
        self.sink
            .create_message(OutboundMessage {
                channel_id: message.channel_id,
                content: Some(format_conversion_error(&error)),
                embeds: vec![],
                reply_to: Some(ReplyTo {
                    message_id: message.id,
                    mention: false,
                }),
            })
            .await?;

        Ok(())
    }

    async fn ignored(
        &self,
        reason: IgnoredReason,
        message: InvokingMessage,
    ) -> anyhow::Result<()> {
        debug!("message {} ignored: {}", message.id, reason);
        Ok(())
    }
}

/// Only logs, never posts anything.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogErrorNotifier;

#[async_trait]
impl ErrorNotifier for LogErrorNotifier {
    async fn conversion_failed(
        &self,
        error: ConversionError,
        message: InvokingMessage,
    ) -> anyhow::Result<()> {
        info!("message {} from {}: {}", message.id, message.author.name, error);
        Ok(())
    }

    async fn ignored(
        &self,
        reason: IgnoredReason,
        message: InvokingMessage,
    ) -> anyhow::Result<()> {
        debug!("message {} ignored: {}", message.id, reason);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        commands::binder::ConversionErrorKind,
        platform::{Message, MockMessageSink, User},
    };

    fn create_test_message() -> InvokingMessage {
        InvokingMessage {
            id: 3,
            channel_id: 30,
            guild_id: None,
            author: User {
                id: 7,
                name: "alice".to_string(),
                bot: false,
            },
            content: "!calc five".to_string(),
        }
    }

    fn create_test_error() -> ConversionError {
        ConversionError {
            kind: ConversionErrorKind::NotAValidInteger,
            value: "five".to_string(),
            parameter: "count".to_string(),
            positional: true,
        }
    }

    #[tokio::test]
    async fn test_reply_notifier_replies_to_invoking_message() {
        let mut sink = MockMessageSink::new();
        sink.expect_create_message()
            .withf(|outbound| {
                outbound.channel_id == 30
                    && outbound.reply_to
                        == Some(ReplyTo {
                            message_id: 3,
                            mention: false,
                        })
                    && outbound.content.as_deref()
                        == Some("Argument `count` is invalid: not a valid integer (got `five`).")
            })
            .times(1)
            .returning(|outbound| {
                Ok(Message {
                    id: 4,
                    channel_id: outbound.channel_id,
                    content: outbound.content,
                    embeds: vec![],
                })
            });

        let notifier = ReplyErrorNotifier::new(Arc::new(sink));
        notifier
            .conversion_failed(create_test_error(), create_test_message())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_reply_notifier_stays_quiet_on_ignored() {
        let mut sink = MockMessageSink::new();
        sink.expect_create_message().never();

        let notifier = ReplyErrorNotifier::new(Arc::new(sink));
        notifier
            .ignored(
                IgnoredReason::CommandNotFound("nope".to_string()),
                create_test_message(),
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_reply_notifier_propagates_sink_failure() {
        let mut sink = MockMessageSink::new();
        sink.expect_create_message()
            .returning(|_| Err(anyhow::anyhow!("rate limited")));

        let notifier = ReplyErrorNotifier::new(Arc::new(sink));
        let result = notifier
            .conversion_failed(create_test_error(), create_test_message())
            .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_log_notifier() {
        let notifier = LogErrorNotifier;
        assert!(
            notifier
                .conversion_failed(create_test_error(), create_test_message())
                .await
                .is_ok()
        );
        assert!(
            notifier
                .ignored(
                    IgnoredReason::PermissionDenied("admin".to_string()),
                    create_test_message()
                )
                .await
                .is_ok()
        );
    }

    #[test]
    fn test_ignored_reason_display() {
        assert_eq!(
            IgnoredReason::PermissionDenied("admin".to_string()).to_string(),
            "permission denied for command `admin`"
        );
    }
}
