//! Countdown command handler.
//!
//! Replies with the starting number and edits that same reply once per second
//! down to zero.

use async_trait::async_trait;
use log::debug;
use std::time::Duration;

use crate::commands::{
    Arguments, AsyncHandler, CommandContext, CommandDescriptor, CommandResult,
    ConstructionError, FromServices, HandlerRef, ParameterDescriptor, ParameterType, Services,
};

/// Longest countdown accepted, in seconds.
const MAX_SECONDS: i64 = 10;

struct Countdown {
    tick: Duration,
}

impl FromServices for Countdown {
    fn from_services(_: &Services) -> Result<Self, ConstructionError> {
        Ok(Countdown {
            tick: Duration::from_secs(1),
        })
    }
}

#[async_trait]
impl AsyncHandler for Countdown {
    async fn call(
        &self,
        context: &mut CommandContext<'_>,
        arguments: Arguments,
    ) -> anyhow::Result<CommandResult> {
        let seconds = arguments.int("seconds").unwrap_or(3);
        debug!("handling countdown command from {}", seconds);

        if !(1..=MAX_SECONDS).contains(&seconds) {
            return Ok(CommandResult::reply(format!(
                "Pick a number of seconds between 1 and {}.",
                MAX_SECONDS
            )));
        }

        context.post(CommandResult::reply(seconds.to_string())).await?;
        for remaining in (1..seconds).rev() {
            tokio::time::sleep(self.tick).await;
            context
                .post(CommandResult::edit(remaining.to_string()))
                .await?;
        }
        tokio::time::sleep(self.tick).await;

        Ok(CommandResult::edit("Liftoff!"))
    }
}

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor::new("countdown", HandlerRef::of_async::<Countdown>())
        .description("Count down, editing a single message")
        .parameter(ParameterDescriptor::positional("seconds", ParameterType::Int).nullable())
}
