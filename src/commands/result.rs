//! Handler results.
//!
//! A handler describes what should happen after it ran with a [`CommandResult`];
//! the translator turns it into a message operation.

use crate::platform::Embed;

/// Text and rich content of a message to create or edit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageContent {
    pub text: Option<String>,
    pub embeds: Vec<Embed>,
}

impl MessageContent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the text.
    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    /// Appends a rich content block.
    pub fn embed(mut self, embed: Embed) -> Self {
        self.embeds.push(embed);
        self
    }

    /// Returns `true` when there is neither text nor embeds.
    pub fn is_empty(&self) -> bool {
        self.text.is_none() && self.embeds.is_empty()
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        MessageContent::new().text(text)
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        MessageContent::new().text(text)
    }
}

impl From<Embed> for MessageContent {
    fn from(embed: Embed) -> Self {
        MessageContent::new().embed(embed)
    }
}

/// What a handler asks to do with its output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    /// Nothing to send
    Empty,
    /// Reply to the invoking message, pinging its author when `mention` is set
    Reply {
        mention: bool,
        content: MessageContent,
    },
    /// Send a plain message in the invoking channel
    Send(MessageContent),
    /// Reply to the message created by the latest `Reply` or `Send`, or send when there is none
    FollowUp(MessageContent),
    /// Replace the content of the message created by the latest `Reply` or `Send`
    Edit(MessageContent),
}

impl CommandResult {
    pub fn empty() -> Self {
        CommandResult::Empty
    }

    /// Reply without pinging the author.
    pub fn reply(content: impl Into<MessageContent>) -> Self {
        CommandResult::Reply {
            mention: false,
            content: content.into(),
        }
    }

    /// Reply and ping the author.
    pub fn reply_with_mention(content: impl Into<MessageContent>) -> Self {
        CommandResult::Reply {
            mention: true,
            content: content.into(),
        }
    }

    pub fn send(content: impl Into<MessageContent>) -> Self {
        CommandResult::Send(content.into())
    }

    pub fn follow_up(content: impl Into<MessageContent>) -> Self {
        CommandResult::FollowUp(content.into())
    }

    pub fn edit(content: impl Into<MessageContent>) -> Self {
        CommandResult::Edit(content.into())
    }

    /// Short name of the variant, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            CommandResult::Empty => "empty",
            CommandResult::Reply { mention: false, .. } => "reply",
            CommandResult::Reply { mention: true, .. } => "mention-reply",
            CommandResult::Send(_) => "send",
            CommandResult::FollowUp(_) => "follow-up",
            CommandResult::Edit(_) => "edit",
        }
    }
}
