//! In-memory entity directory.
//!
//! A [`Directory`] is a static snapshot of users and guilds, usually loaded from
//! the `directory` section of the configuration file. It resolves entities for the
//! binder and backs the role based [`DirectoryPermissions`] predicate.
//!
//! ```yaml
//! directory:
//!   users:
//!     - { id: 1, name: "alice" }
//!   guilds:
//!     - id: 100
//!       name: "mars"
//!       members:
//!         - { user_id: 1, nickname: "Ally", roles: [300] }
//!       channels:
//!         - { id: 200, name: "general" }
//!       roles:
//!         - { id: 300, name: "administrator" }
//! ```

use async_trait::async_trait;
use log::debug;
use serde::Deserialize;
use std::sync::Arc;

use crate::platform::{
    Channel, EntityResolver, InvokingMessage, LookupError, Member, PermissionPredicate,
    PermissionRequirement, Role, User,
};

/// Membership entry of a guild.
#[derive(Debug, Clone, Deserialize)]
pub struct MemberEntry {
    pub user_id: u64,
    #[serde(default)]
    pub nickname: Option<String>,
    #[serde(default)]
    pub roles: Vec<u64>,
}

/// Named entry used for channels and roles.
#[derive(Debug, Clone, Deserialize)]
pub struct NamedEntry {
    pub id: u64,
    pub name: String,
}

/// A guild and everything it contains.
#[derive(Debug, Clone, Deserialize)]
pub struct Guild {
    pub id: u64,
    pub name: String,
    #[serde(default)]
    pub members: Vec<MemberEntry>,
    #[serde(default)]
    pub channels: Vec<NamedEntry>,
    #[serde(default)]
    pub roles: Vec<NamedEntry>,
}

/// Static snapshot of the platform entities.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Directory {
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub guilds: Vec<Guild>,
}

impl Directory {
    /// Finds a user by identifier.
    pub fn user(&self, user_id: u64) -> Option<&User> {
        self.users.iter().find(|user| user.id == user_id)
    }

    /// Finds a guild by identifier.
    pub fn guild(&self, guild_id: u64) -> Option<&Guild> {
        self.guilds.iter().find(|guild| guild.id == guild_id)
    }

    fn member(&self, guild_id: u64, user_id: u64) -> Option<Member> {
        let entry = self
            .guild(guild_id)?
            .members
            .iter()
            .find(|member| member.user_id == user_id)?;
        let user = self.user(user_id)?;

        Some(Member {
            guild_id,
            user: user.clone(),
            nickname: entry.nickname.clone(),
            roles: entry.roles.clone(),
        })
    }
}

#[async_trait]
impl EntityResolver for Directory {
    async fn resolve_user(&self, user_id: u64) -> Result<User, LookupError> {
        debug!("resolving user {}", user_id);
        self.user(user_id).cloned().ok_or(LookupError::NotFound)
    }

    async fn resolve_member(&self, guild_id: u64, user_id: u64) -> Result<Member, LookupError> {
        debug!("resolving member {} in guild {}", user_id, guild_id);
        self.member(guild_id, user_id).ok_or(LookupError::NotFound)
    }

    async fn resolve_channel(
        &self,
        guild_id: u64,
        channel_id: u64,
    ) -> Result<Channel, LookupError> {
        debug!("resolving channel {} in guild {}", channel_id, guild_id);
        self.guild(guild_id)
            .and_then(|guild| guild.channels.iter().find(|c| c.id == channel_id))
            .map(|entry| Channel {
                id: entry.id,
                guild_id,
                name: entry.name.clone(),
            })
            .ok_or(LookupError::NotFound)
    }

    async fn resolve_role(&self, guild_id: u64, role_id: u64) -> Result<Role, LookupError> {
        debug!("resolving role {} in guild {}", role_id, guild_id);
        self.guild(guild_id)
            .and_then(|guild| guild.roles.iter().find(|r| r.id == role_id))
            .map(|entry| Role {
                id: entry.id,
                guild_id,
                name: entry.name.clone(),
            })
            .ok_or(LookupError::NotFound)
    }
}

/// Grants a requirement when the author holds a guild role named after it.
///
/// Direct messages never satisfy a requirement.
pub struct DirectoryPermissions {
    directory: Arc<Directory>,
}

impl DirectoryPermissions {
    pub fn new(directory: Arc<Directory>) -> Self {
        DirectoryPermissions { directory }
    }
}

impl PermissionPredicate for DirectoryPermissions {
    fn evaluate(&self, requirement: &PermissionRequirement, message: &InvokingMessage) -> bool {
        let Some(guild_id) = message.guild_id else {
            return false;
        };
        let Some(guild) = self.directory.guild(guild_id) else {
            return false;
        };
        let Some(member) = self.directory.member(guild_id, message.author.id) else {
            return false;
        };

        guild
            .roles
            .iter()
            .filter(|role| member.roles.contains(&role.id))
            .any(|role| role.name == requirement.as_str())
    }
}
