//! Message sink writing operations to the log.
//!
//! [`ConsoleSink`] stands in for the chat platform when running the `chatcmd`
//! binary: each operation is logged as a JSON line and a message with a fresh
//! identifier is handed back.

use async_trait::async_trait;
use log::info;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::platform::{Message, MessageEdit, MessageSink, OutboundMessage};

/// Logging [`MessageSink`] allocating sequential message identifiers.
pub struct ConsoleSink {
    next_id: AtomicU64,
}

impl ConsoleSink {
    /// Creates a sink whose first created message gets `first_id`.
    pub fn new(first_id: u64) -> Self {
        ConsoleSink {
            next_id: AtomicU64::new(first_id),
        }
    }
}

#[async_trait]
impl MessageSink for ConsoleSink {
    async fn create_message(&self, message: OutboundMessage) -> anyhow::Result<Message> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        info!("create message {}: {}", id, serde_json::to_string(&message)?);

        Ok(Message {
            id,
            channel_id: message.channel_id,
            content: message.content,
            embeds: message.embeds,
        })
    }

    async fn edit_message(&self, edit: MessageEdit) -> anyhow::Result<Message> {
        info!(
            "edit message {}: {}",
            edit.message_id,
            serde_json::to_string(&edit)?
        );

        Ok(Message {
            id: edit.message_id,
            channel_id: edit.channel_id,
            content: edit.content,
            embeds: edit.embeds,
        })
    }
}
