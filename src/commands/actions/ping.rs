//! Ping command handler.

use log::debug;

use crate::commands::{CommandDescriptor, CommandResult, HandlerRef};

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor::new(
        "ping",
        HandlerRef::from_fn(|_, _| {
            debug!("handling ping command");
            Ok(CommandResult::reply("Pong!"))
        }),
    )
    .description("Check that the bot is alive")
}
