//! Markdown response formatters.
//!
//! This module provides the user facing texts produced by the dispatch layer
//! itself, as opposed to the texts produced by command handlers: conversion
//! error notices, usage lines and the help listing.

use crate::commands::{
    binder::{ConversionError, received},
    descriptor::{CommandDescriptor, ParameterDescriptor, ParameterType},
};

/// Formats the notice sent when a parameter could not be bound.
///
/// # Examples
///
/// ```
/// # use chatcmd::commands::{ConversionError, ConversionErrorKind};
/// # use chatcmd::commands::responses::format_conversion_error;
/// let error = ConversionError {
///     kind: ConversionErrorKind::NotAValidInteger,
///     value: "five".to_string(),
///     parameter: "count".to_string(),
///     positional: false,
/// };
/// assert_eq!(
///     format_conversion_error(&error),
///     "Option `count` is invalid: not a valid integer (got `five`)."
/// );
/// ```
pub fn format_conversion_error(error: &ConversionError) -> String {
    let label = match error.positional {
        true => "Argument",
        false => "Option",
    };

    format!(
        "{} `{}` is invalid: {}{}.",
        label,
        error.parameter,
        error.kind,
        received(&error.value)
    )
}

/// Formats the usage line of a command.
///
/// Required positionals are shown as `<name>`, optional ones as `[name]` and a
/// remainder as `<name...>`. Options are shown with their shorthand and the
/// type of value they take; flags take none.
///
/// # Examples
///
/// ```
/// # use chatcmd::commands::{CommandDescriptor, CommandResult, HandlerRef, ParameterDescriptor, ParameterType};
/// # use chatcmd::commands::responses::format_usage;
/// let greet = CommandDescriptor::new("greet", HandlerRef::from_fn(|_, _| Ok(CommandResult::Empty)))
///     .parameter(ParameterDescriptor::positional("name", ParameterType::String))
///     .parameter(ParameterDescriptor::option("option", ParameterType::String).shorthand("o").nullable());
/// assert_eq!(format_usage(&greet, "!"), "`!greet <name> [--option|-o <string>]`");
/// ```
pub fn format_usage(descriptor: &CommandDescriptor, prefix: &str) -> String {
    let mut usage = format!("{}{}", prefix, descriptor.name());
    for parameter in descriptor.parameters() {
        usage.push(' ');
        usage.push_str(&format_parameter(parameter));
    }

    format!("`{}`", usage)
}

fn format_parameter(parameter: &ParameterDescriptor) -> String {
    if parameter.is_positional() {
        let name = match parameter.consumes_remainder() {
            true => format!("{}...", parameter.name()),
            false => parameter.name().to_owned(),
        };
        return match parameter.can_be_null() {
            true => format!("[{}]", name),
            false => format!("<{}>", name),
        };
    }

    let mut option = format!("--{}", parameter.name());
    if let Some(shorthand) = parameter.shorthand_name() {
        option.push_str(&format!("|-{}", shorthand));
    }

    // flags are always optional
    if parameter.parameter_type() == ParameterType::Bool {
        return format!("[{}]", option);
    }

    option.push_str(&format!(" <{}>", parameter.parameter_type()));
    match parameter.can_be_null() {
        true => format!("[{}]", option),
        false => option,
    }
}

/// Formats the help message listing the given commands.
///
/// # Examples
///
/// ```
/// # use chatcmd::commands::{CommandDescriptor, CommandResult, HandlerRef};
/// # use chatcmd::commands::responses::format_help;
/// let ping = CommandDescriptor::new("ping", HandlerRef::from_fn(|_, _| Ok(CommandResult::Empty)))
///     .description("Check the bot is alive");
/// let help = format_help(&[&ping], "!");
/// assert!(help.contains("- `!ping`: Check the bot is alive"));
/// ```
pub fn format_help(commands: &[&CommandDescriptor], prefix: &str) -> String {
    if commands.is_empty() {
        return "No commands available.".to_owned();
    }

    let commands_md = commands
        .iter()
        .map(|command| match command.summary() {
            Some(summary) => format!("- {}: {}", format_usage(command, prefix), summary),
            None => format!("- {}", format_usage(command, prefix)),
        })
        .collect::<Vec<String>>()
        .join("\n");

    format!("Commands:\n{}", commands_md)
}
