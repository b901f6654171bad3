//! Help command handler.
//!
//! Lists the registered commands with their usage, or shows the usage of a single
//! command when one is named. The listing is computed once at startup from the
//! registry and injected as a [`CommandCatalog`] service.

use log::debug;
use std::{collections::HashMap, sync::Arc};

use crate::commands::{
    Arguments, CommandContext, CommandDescriptor, CommandRegistry, CommandResult,
    ConstructionError, FromServices, HandlerRef, ParameterDescriptor, ParameterType, Services,
    SyncHandler,
    responses::{format_help, format_usage},
};

/// Usage texts of the registered commands.
#[derive(Debug, Clone)]
pub struct CommandCatalog {
    /// Command prefix shown in usages
    prefix: String,
    /// Full listing
    help: String,
    /// Usage line per command name
    usages: HashMap<String, String>,
}

impl CommandCatalog {
    /// Snapshots the commands of `registry`.
    pub fn from_registry(registry: &CommandRegistry, prefix: &str) -> Self {
        let commands = registry.commands();
        let usages = commands
            .iter()
            .map(|command| (command.name().to_owned(), format_usage(command, prefix)))
            .collect();

        CommandCatalog {
            prefix: prefix.to_owned(),
            help: format_help(&commands, prefix),
            usages,
        }
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    /// Usage of a command, named with or without the prefix.
    pub fn usage(&self, name: &str) -> Option<&str> {
        let name = name.strip_prefix(self.prefix.as_str()).unwrap_or(name);
        self.usages.get(name).map(String::as_str)
    }
}

struct Help {
    catalog: Arc<CommandCatalog>,
}

impl FromServices for Help {
    fn from_services(services: &Services) -> Result<Self, ConstructionError> {
        Ok(Help {
            catalog: services.require::<CommandCatalog>()?,
        })
    }
}

impl SyncHandler for Help {
    fn call(&self, _: &CommandContext<'_>, arguments: Arguments) -> anyhow::Result<CommandResult> {
        debug!("handling help command");

        let response = match arguments.string("command") {
            Some(name) => match self.catalog.usage(name) {
                Some(usage) => format!("Usage: {}", usage),
                None => format!("Unknown command `{}`.", name),
            },
            None => self.catalog.help().to_owned(),
        };

        Ok(CommandResult::reply(response))
    }
}

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor::new("help", HandlerRef::of_sync::<Help>())
        .description("List the commands, or show how to use one")
        .parameter(ParameterDescriptor::positional("command", ParameterType::String).nullable())
}
