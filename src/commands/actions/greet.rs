//! Greet command handler.
//!
//! Greets someone by name. The optional `--option` (`-o`) text is appended to the
//! greeting. The reply mentions the author.

use log::debug;

use crate::commands::{
    Arguments, CommandContext, CommandDescriptor, CommandResult, HandlerRef,
    ParameterDescriptor, ParameterType,
};

fn greet(context: &CommandContext<'_>, arguments: Arguments) -> anyhow::Result<CommandResult> {
    debug!("handling greet command");

    let name = arguments.string("argument").unwrap_or_default();
    let greeting = match arguments.string("option") {
        Some(option) => format!("Hello {}, {}! ({})", name, context.message().author.name, option),
        None => format!("Hello {}, {}!", name, context.message().author.name),
    };

    Ok(CommandResult::reply_with_mention(greeting))
}

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor::new("greet", HandlerRef::from_fn(greet))
        .description("Say hello")
        .parameter(ParameterDescriptor::positional("argument", ParameterType::String))
        .parameter(
            ParameterDescriptor::option("option", ParameterType::String)
                .shorthand("o")
                .nullable(),
        )
}
