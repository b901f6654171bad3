//! Inspect command handler.
//!
//! Describes a guild member and, optionally, a channel given with `--channel`
//! (`-c`). In a direct conversation both bind as absent and the command only
//! says so.

use log::debug;

use crate::{
    commands::{
        Arguments, CommandContext, CommandDescriptor, CommandResult, HandlerRef,
        ParameterDescriptor, ParameterType,
    },
    platform::Embed,
};

fn inspect(_: &CommandContext<'_>, arguments: Arguments) -> anyhow::Result<CommandResult> {
    debug!("handling inspect command");

    let Some(member) = arguments.member("member") else {
        return Ok(CommandResult::reply("Members can only be inspected in a guild."));
    };

    let roles = member
        .roles
        .iter()
        .map(|role| role.to_string())
        .collect::<Vec<String>>()
        .join(", ");
    let mut embed = Embed::titled(member.display_name())
        .field("user", member.user.name.as_str())
        .field("roles", if roles.is_empty() { "none".to_owned() } else { roles });

    if let Some(channel) = arguments.channel("channel") {
        embed = embed.field("channel", format!("#{}", channel.name));
    }

    Ok(CommandResult::reply(embed))
}

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor::new("inspect", HandlerRef::from_fn(inspect))
        .description("Describe a guild member")
        .parameter(ParameterDescriptor::positional("member", ParameterType::Member))
        .parameter(
            ParameterDescriptor::option("channel", ParameterType::Channel)
                .shorthand("c")
                .nullable(),
        )
}
