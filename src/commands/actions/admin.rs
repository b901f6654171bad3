//! Admin command handler.
//!
//! Only runs for authors satisfying the `administrator` requirement; the
//! dispatcher rejects everyone else before binding.

use log::debug;

use crate::{
    commands::{CommandDescriptor, CommandResult, HandlerRef},
    platform::{Embed, PermissionRequirement},
};

/// Requirement guarding the admin command.
pub const ADMINISTRATOR: &str = "administrator";

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor::new(
        "admin",
        HandlerRef::from_fn(|context, _| {
            debug!("handling admin command");

            let message = context.message();
            let scope = match message.guild_id {
                Some(guild_id) => guild_id.to_string(),
                None => "direct message".to_owned(),
            };
            Ok(CommandResult::reply(
                Embed::titled("Administration")
                    .field("user", message.author.name.as_str())
                    .field("scope", scope),
            ))
        }),
    )
    .description("Administrators only")
    .permission(PermissionRequirement::new(ADMINISTRATOR))
}
