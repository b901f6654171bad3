//! Chat platform boundary.
//!
//! This module holds the entity types exchanged with the chat platform and the
//! collaborator traits the command core depends on. The core never talks to the
//! network itself: every lookup and every outbound message goes through one of
//! these traits.
//!
//! # Collaborators
//!
//! - [`EntityResolver`] - resolves users, members, channels and roles by identifier
//! - [`MessageSink`] - creates and edits messages
//! - [`PermissionPredicate`] - evaluates a command's permission requirement
//!
//! The [`directory`] and [`console`] submodules provide in-memory implementations
//! used by the `chatcmd` binary.

use async_trait::async_trait;
use mockall::automock;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod console;
pub mod directory;

pub use crate::platform::{
    console::ConsoleSink,
    directory::{Directory, DirectoryPermissions},
};

/// A platform user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier
    pub id: u64,
    /// Display name
    pub name: String,
    /// Whether the account is a bot
    #[serde(default)]
    pub bot: bool,
}

/// A user seen through the membership of a guild.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    /// Guild the membership belongs to
    pub guild_id: u64,
    /// The underlying user
    pub user: User,
    /// Guild specific nickname
    pub nickname: Option<String>,
    /// Identifiers of the roles held by the member
    pub roles: Vec<u64>,
}

impl Member {
    /// Returns the nickname when set, the user name otherwise.
    pub fn display_name(&self) -> &str {
        self.nickname.as_deref().unwrap_or(&self.user.name)
    }
}

/// A guild channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: u64,
    pub guild_id: u64,
    pub name: String,
}

/// A guild role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: u64,
    pub guild_id: u64,
    pub name: String,
}

/// A field of an [`Embed`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmbedField {
    pub name: String,
    pub value: String,
}

/// A rich content block attached to a message.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Embed {
    pub title: Option<String>,
    pub description: Option<String>,
    pub fields: Vec<EmbedField>,
}

impl Embed {
    /// Creates an embed with a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Embed {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    /// Sets the description.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends a field.
    pub fn field(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(EmbedField {
            name: name.into(),
            value: value.into(),
        });
        self
    }
}

/// A message produced by the platform, either created or edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Unique message identifier
    pub id: u64,
    /// Channel the message lives in
    pub channel_id: u64,
    /// Text content
    pub content: Option<String>,
    /// Rich content blocks
    pub embeds: Vec<Embed>,
}

/// The incoming message a dispatch was triggered by.
///
/// `guild_id` is `None` for direct messages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvokingMessage {
    /// Unique message identifier
    pub id: u64,
    /// Channel the message was posted in
    pub channel_id: u64,
    /// Guild of the channel, `None` in a direct conversation
    pub guild_id: Option<u64>,
    /// Author of the message
    pub author: User,
    /// Raw text body
    pub content: String,
}

impl InvokingMessage {
    /// Returns `true` when the message belongs to a guild.
    pub fn in_guild(&self) -> bool {
        self.guild_id.is_some()
    }
}

/// Reply marker of an [`OutboundMessage`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReplyTo {
    /// Message replied to
    pub message_id: u64,
    /// Whether the author of the replied message is pinged
    pub mention: bool,
}

/// A message to create.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OutboundMessage {
    pub channel_id: u64,
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
    pub reply_to: Option<ReplyTo>,
}

/// Replacement content for an existing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageEdit {
    pub channel_id: u64,
    pub message_id: u64,
    pub content: Option<String>,
    pub embeds: Vec<Embed>,
}

/// Opaque permission token attached to a command.
///
/// Its meaning belongs to the [`PermissionPredicate`] in use.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PermissionRequirement(String);

impl PermissionRequirement {
    pub fn new(requirement: impl Into<String>) -> Self {
        PermissionRequirement(requirement.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Errors returned by an [`EntityResolver`].
///
/// `NotFound` and `ServerError` are the recognized lookup failures and are turned
/// into conversion errors by the binder. Anything else is a collaborator failure
/// and aborts the dispatch.
#[derive(Debug, Error)]
pub enum LookupError {
    /// The entity does not exist
    #[error("entity not found")]
    NotFound,
    /// The platform answered with a server error
    #[error("platform server error: {0}")]
    ServerError(String),
    /// Any other failure
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Resolves platform entities by identifier.
#[automock]
#[async_trait]
pub trait EntityResolver: Send + Sync {
    /// Fetches a user.
    async fn resolve_user(&self, user_id: u64) -> Result<User, LookupError>;
    /// Fetches the membership of a user in a guild.
    async fn resolve_member(&self, guild_id: u64, user_id: u64) -> Result<Member, LookupError>;
    /// Fetches a channel of a guild.
    async fn resolve_channel(&self, guild_id: u64, channel_id: u64)
    -> Result<Channel, LookupError>;
    /// Fetches a role of a guild.
    async fn resolve_role(&self, guild_id: u64, role_id: u64) -> Result<Role, LookupError>;
}

/// Sends messages to the platform.
///
/// Any error is fatal to the dispatch that triggered the call.
#[automock]
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Creates a message and returns it.
    async fn create_message(&self, message: OutboundMessage) -> anyhow::Result<Message>;
    /// Replaces the content of an existing message and returns the edited message.
    async fn edit_message(&self, edit: MessageEdit) -> anyhow::Result<Message>;
}

/// Decides whether an invoking message satisfies a permission requirement.
#[automock]
pub trait PermissionPredicate: Send + Sync {
    fn evaluate(&self, requirement: &PermissionRequirement, message: &InvokingMessage) -> bool;
}

/// Predicate rejecting every requirement.
///
/// Used when no predicate is configured, so gated commands never run by accident.
#[derive(Debug, Default, Clone, Copy)]
pub struct DenyAll;

impl PermissionPredicate for DenyAll {
    fn evaluate(&self, _requirement: &PermissionRequirement, _message: &InvokingMessage) -> bool {
        false
    }
}
