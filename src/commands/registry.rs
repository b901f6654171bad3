//! Command registry.
//!
//! The [`CommandRegistry`] maps command names to their [`CommandDescriptor`]. It
//! is filled once at startup and then shared read-only between dispatches, so
//! lookups need no synchronization.

use log::debug;
use std::collections::HashMap;
use thiserror::Error;

use crate::commands::descriptor::CommandDescriptor;

/// Errors raised by registry operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A command with the same name is already registered
    #[error("command `{0}` is already registered")]
    DuplicateCommand(String),
    /// No command with that name is registered
    #[error("command `{0}` was not found")]
    CommandNotFound(String),
    /// The descriptor violates a structural invariant
    #[error("command `{command}` is malformed: {reason}")]
    InvalidDescriptor { command: String, reason: String },
}

/// Name to descriptor mapping. Lookups are case-sensitive.
#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: HashMap<String, CommandDescriptor>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::DuplicateCommand`] when the name is already taken
    /// - [`RegistryError::InvalidDescriptor`] when [`CommandDescriptor::validate`] fails
    pub fn register(&mut self, descriptor: CommandDescriptor) -> Result<(), RegistryError> {
        if self.commands.contains_key(descriptor.name()) {
            return Err(RegistryError::DuplicateCommand(descriptor.name().to_owned()));
        }
        descriptor
            .validate()
            .map_err(|reason| RegistryError::InvalidDescriptor {
                command: descriptor.name().to_owned(),
                reason,
            })?;

        debug!(
            "registering command `{}` ({} parameters, async: {})",
            descriptor.name(),
            descriptor.parameters().len(),
            descriptor.is_async()
        );
        self.commands
            .insert(descriptor.name().to_owned(), descriptor);

        Ok(())
    }

    /// Looks a command up by name.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::CommandNotFound`] when no command has this exact name.
    pub fn resolve(&self, name: &str) -> Result<&CommandDescriptor, RegistryError> {
        self.commands
            .get(name)
            .ok_or_else(|| RegistryError::CommandNotFound(name.to_owned()))
    }

    /// Returns every descriptor, sorted by name.
    pub fn commands(&self) -> Vec<&CommandDescriptor> {
        let mut commands: Vec<&CommandDescriptor> = self.commands.values().collect();
        commands.sort_by(|a, b| a.name().cmp(b.name()));
        commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}
