//! Announce command handler.
//!
//! Posts the announcement as an embed while running, then follows up with a
//! short note replying to the announcement. Everything is posted from inside the
//! handler, so the final result is empty.

use async_trait::async_trait;
use log::debug;

use crate::{
    commands::{
        Arguments, AsyncHandler, CommandContext, CommandDescriptor, CommandResult,
        ConstructionError, FromServices, HandlerRef, ParameterDescriptor, ParameterType,
        Services,
    },
    platform::Embed,
};

struct Announce;

impl FromServices for Announce {
    fn from_services(_: &Services) -> Result<Self, ConstructionError> {
        Ok(Announce)
    }
}

#[async_trait]
impl AsyncHandler for Announce {
    async fn call(
        &self,
        context: &mut CommandContext<'_>,
        arguments: Arguments,
    ) -> anyhow::Result<CommandResult> {
        debug!("handling announce command");

        let text = arguments.string("text").unwrap_or_default();
        let author = context.message().author.name.clone();

        context
            .post(CommandResult::send(Embed::titled("Announcement").description(text)))
            .await?;
        context
            .post(CommandResult::follow_up(format!("Announced by {}.", author)))
            .await?;

        Ok(CommandResult::Empty)
    }
}

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor::new("announce", HandlerRef::of_async::<Announce>())
        .description("Post an announcement")
        .parameter(ParameterDescriptor::positional("text", ParameterType::String).remainder())
}
