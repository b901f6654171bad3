//! Message of the day command handler.
//!
//! Sends the configured message of the day, injected as a [`MessageOfTheDay`]
//! service.

use log::debug;
use std::sync::Arc;

use crate::{
    commands::{
        Arguments, CommandContext, CommandDescriptor, CommandResult, ConstructionError,
        FromServices, HandlerRef, Services, SyncHandler,
    },
    platform::Embed,
};

/// The configured message of the day, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageOfTheDay(pub Option<String>);

struct Motd {
    motd: Arc<MessageOfTheDay>,
}

impl FromServices for Motd {
    fn from_services(services: &Services) -> Result<Self, ConstructionError> {
        Ok(Motd {
            motd: services.require::<MessageOfTheDay>()?,
        })
    }
}

impl SyncHandler for Motd {
    fn call(&self, _: &CommandContext<'_>, _: Arguments) -> anyhow::Result<CommandResult> {
        debug!("handling motd command");

        let result = match &self.motd.0 {
            Some(motd) => CommandResult::send(Embed::titled("Message of the day").description(motd)),
            None => CommandResult::reply("There is no message of the day."),
        };
        Ok(result)
    }
}

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor::new("motd", HandlerRef::of_sync::<Motd>())
        .description("Show the message of the day")
}
