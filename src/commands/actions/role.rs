//! Role command handler.
//!
//! Describes a guild role given by identifier. Roles only exist in a guild, so
//! the command fails to bind in a direct conversation.

use log::debug;

use crate::{
    commands::{
        Arguments, CommandContext, CommandDescriptor, CommandResult, HandlerRef,
        ParameterDescriptor, ParameterType,
    },
    platform::Embed,
};

fn role(_: &CommandContext<'_>, arguments: Arguments) -> anyhow::Result<CommandResult> {
    let Some(role) = arguments.role("role") else {
        return Ok(CommandResult::Empty);
    };
    debug!("handling role command for {}", role.id);

    Ok(CommandResult::reply(
        Embed::titled(role.name.as_str())
            .field("id", role.id.to_string())
            .field("guild", role.guild_id.to_string()),
    ))
}

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor::new("role", HandlerRef::from_fn(role))
        .description("Describe a guild role")
        .parameter(ParameterDescriptor::positional("role", ParameterType::Role))
}
