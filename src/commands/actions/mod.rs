//! Bundled command handlers.
//!
//! Each submodule declares one command through a `descriptor()` function. The
//! descriptors are registered together by [`registry`], and the services they
//! depend on are assembled by [`services`].
//!
//! # Available Commands
//!
//! | Command | Parameters | Handler |
//! |---------|------------|---------|
//! | `help` | `[command]` | sync, needs [`CommandCatalog`] |
//! | `ping` | none | sync |
//! | `greet` | `<argument> [--option\|-o <string>]` | sync |
//! | `say` | `<text...>` | sync |
//! | `calc` | `<count> [--ratio\|-r <number>] [--round]` | sync |
//! | `whois` | `<user>` | sync |
//! | `inspect` | `<member> [--channel\|-c <channel>]` | sync |
//! | `role` | `<role>` | sync |
//! | `motd` | none | sync, needs [`MessageOfTheDay`] |
//! | `admin` | none | sync, gated by `administrator` |
//! | `announce` | `<text...>` | async |
//! | `countdown` | `[seconds]` | async |

use crate::commands::{CommandDescriptor, CommandRegistry, RegistryError, Services};

mod admin;
mod announce;
mod calc;
mod countdown;
mod greet;
mod help;
mod inspect;
mod motd;
mod ping;
mod role;
mod say;
mod whois;

pub use crate::commands::actions::{
    admin::ADMINISTRATOR, help::CommandCatalog, motd::MessageOfTheDay,
};

/// Descriptors of every bundled command.
pub fn descriptors() -> Vec<CommandDescriptor> {
    vec![
        admin::descriptor(),
        announce::descriptor(),
        calc::descriptor(),
        countdown::descriptor(),
        greet::descriptor(),
        help::descriptor(),
        inspect::descriptor(),
        motd::descriptor(),
        ping::descriptor(),
        role::descriptor(),
        say::descriptor(),
        whois::descriptor(),
    ]
}

/// Builds a registry holding every bundled command.
///
/// # Errors
///
/// Returns the first [`RegistryError`] raised by a registration.
pub fn registry() -> Result<CommandRegistry, RegistryError> {
    let mut registry = CommandRegistry::new();
    for descriptor in descriptors() {
        registry.register(descriptor)?;
    }

    Ok(registry)
}

/// Builds the services the bundled commands depend on.
pub fn services(registry: &CommandRegistry, prefix: &str, motd: Option<String>) -> Services {
    Services::new()
        .with(CommandCatalog::from_registry(registry, prefix))
        .with(MessageOfTheDay(motd))
}
