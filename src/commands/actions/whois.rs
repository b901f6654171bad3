//! Whois command handler.

use log::debug;

use crate::{
    commands::{
        Arguments, CommandContext, CommandDescriptor, CommandResult, HandlerRef,
        ParameterDescriptor, ParameterType,
    },
    platform::Embed,
};

fn whois(_: &CommandContext<'_>, arguments: Arguments) -> anyhow::Result<CommandResult> {
    let Some(user) = arguments.user("user") else {
        return Ok(CommandResult::Empty);
    };
    debug!("handling whois command for {}", user.id);

    let kind = match user.bot {
        true => "bot",
        false => "user",
    };
    Ok(CommandResult::reply(
        Embed::titled(user.name.as_str())
            .field("id", user.id.to_string())
            .field("kind", kind),
    ))
}

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor::new("whois", HandlerRef::from_fn(whois))
        .description("Show who a user is")
        .parameter(ParameterDescriptor::positional("user", ParameterType::User))
}
