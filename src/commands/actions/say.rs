//! Say command handler.
//!
//! Repeats everything after the command name in the invoking channel, as a plain
//! message rather than a reply.

use log::debug;

use crate::commands::{
    Arguments, CommandContext, CommandDescriptor, CommandResult, HandlerRef,
    ParameterDescriptor, ParameterType,
};

fn say(_: &CommandContext<'_>, arguments: Arguments) -> anyhow::Result<CommandResult> {
    debug!("handling say command");

    let text = arguments.string("text").unwrap_or_default();
    Ok(CommandResult::send(text))
}

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor::new("say", HandlerRef::from_fn(say))
        .description("Repeat a text in this channel")
        .parameter(ParameterDescriptor::positional("text", ParameterType::String).remainder())
}
