//! Command and parameter descriptors.
//!
//! Descriptors are the static metadata of a command: its name, its parameters in
//! declaration order, the handler to invoke and an optional permission requirement.
//! They are built once at startup and never mutated afterwards.

use std::fmt;

use crate::{commands::handler::HandlerRef, platform::PermissionRequirement};

/// Declared type of a parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParameterType {
    String,
    Int,
    Double,
    Bool,
    User,
    Member,
    Channel,
    Role,
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ParameterType::String => "string",
            ParameterType::Int => "int",
            ParameterType::Double => "number",
            ParameterType::Bool => "bool",
            ParameterType::User => "user",
            ParameterType::Member => "member",
            ParameterType::Channel => "channel",
            ParameterType::Role => "role",
        };
        f.write_str(name)
    }
}

/// Metadata of a single command parameter.
///
/// Use [`ParameterDescriptor::positional`] for arguments bound by order and
/// [`ParameterDescriptor::option`] for arguments bound by `--name` / `-shorthand`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    name: String,
    parameter_type: ParameterType,
    positional: bool,
    shorthand: Option<String>,
    nullable: bool,
    consumes_remainder: bool,
}

impl ParameterDescriptor {
    /// Creates a required positional parameter.
    pub fn positional(name: impl Into<String>, parameter_type: ParameterType) -> Self {
        ParameterDescriptor {
            name: name.into(),
            parameter_type,
            positional: true,
            shorthand: None,
            nullable: false,
            consumes_remainder: false,
        }
    }

    /// Creates a required named option.
    ///
    /// A missing `Bool` option binds `false` whatever its nullability.
    pub fn option(name: impl Into<String>, parameter_type: ParameterType) -> Self {
        ParameterDescriptor {
            positional: false,
            ..Self::positional(name, parameter_type)
        }
    }

    /// Sets the shorthand name of an option (`-o` for `--option`).
    pub fn shorthand(mut self, shorthand: impl Into<String>) -> Self {
        self.shorthand = Some(shorthand.into());
        self
    }

    /// Tolerates a missing value, which then binds as absent.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Makes a positional parameter absorb every remaining positional token.
    pub fn remainder(mut self) -> Self {
        self.consumes_remainder = true;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameter_type(&self) -> ParameterType {
        self.parameter_type
    }

    pub fn is_positional(&self) -> bool {
        self.positional
    }

    pub fn shorthand_name(&self) -> Option<&str> {
        self.shorthand.as_deref()
    }

    pub fn can_be_null(&self) -> bool {
        self.nullable
    }

    pub fn consumes_remainder(&self) -> bool {
        self.consumes_remainder
    }
}

/// Metadata of a registered command.
#[derive(Clone)]
pub struct CommandDescriptor {
    name: String,
    description: Option<String>,
    parameters: Vec<ParameterDescriptor>,
    handler: HandlerRef,
    permission: Option<PermissionRequirement>,
}

impl CommandDescriptor {
    /// Creates a descriptor without parameters.
    pub fn new(name: impl Into<String>, handler: HandlerRef) -> Self {
        CommandDescriptor {
            name: name.into(),
            description: None,
            parameters: Vec::new(),
            handler,
            permission: None,
        }
    }

    /// Appends a parameter. Declaration order is binding order.
    pub fn parameter(mut self, parameter: ParameterDescriptor) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Gates the command behind a permission requirement.
    pub fn permission(mut self, requirement: PermissionRequirement) -> Self {
        self.permission = Some(requirement);
        self
    }

    /// Sets the one line description shown by `help`.
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn summary(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    pub fn handler(&self) -> &HandlerRef {
        &self.handler
    }

    /// Whether invoking the handler suspends.
    pub fn is_async(&self) -> bool {
        self.handler.is_async()
    }

    pub fn permission_requirement(&self) -> Option<&PermissionRequirement> {
        self.permission.as_ref()
    }

    /// Checks the structural invariants of the descriptor.
    ///
    /// - the name is a single non empty token
    /// - parameter names and shorthands are unique
    /// - shorthands only appear on options
    /// - at most one positional parameter consumes the remainder, and it is the
    ///   last positional parameter
    ///
    /// Returns the reason of the first violation found.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() || self.name.chars().any(char::is_whitespace) {
            return Err("command name must be a single non empty token".to_owned());
        }

        let mut names: Vec<&str> = Vec::new();
        for parameter in &self.parameters {
            if names.contains(&parameter.name()) {
                return Err(format!("parameter `{}` is declared twice", parameter.name()));
            }
            names.push(parameter.name());
        }

        for parameter in &self.parameters {
            let Some(shorthand) = parameter.shorthand_name() else {
                continue;
            };
            if parameter.is_positional() {
                return Err(format!(
                    "positional parameter `{}` cannot have a shorthand",
                    parameter.name()
                ));
            }
            if names.contains(&shorthand) {
                return Err(format!("shorthand `{}` is already used", shorthand));
            }
            names.push(shorthand);
        }

        for parameter in &self.parameters {
            if parameter.consumes_remainder() && !parameter.is_positional() {
                return Err(format!(
                    "option `{}` cannot consume the remaining arguments",
                    parameter.name()
                ));
            }
        }

        let positionals: Vec<&ParameterDescriptor> = self
            .parameters
            .iter()
            .filter(|parameter| parameter.is_positional())
            .collect();
        if let Some(index) = positionals.iter().position(|p| p.consumes_remainder())
            && index != positionals.len() - 1
        {
            return Err(format!(
                "parameter `{}` consumes the remaining arguments but is not the last positional parameter",
                positionals[index].name()
            ));
        }

        Ok(())
    }
}

impl fmt::Debug for CommandDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDescriptor")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("is_async", &self.is_async())
            .field("permission", &self.permission)
            .finish()
    }
}
