//! Calc command handler.
//!
//! Multiplies an integer `count` by the `--ratio` (`-r`) number, which defaults to
//! one, and rounds the product when the `--round` flag is set.

use log::debug;

use crate::commands::{
    Arguments, CommandContext, CommandDescriptor, CommandResult, HandlerRef,
    ParameterDescriptor, ParameterType,
};

fn calc(_: &CommandContext<'_>, arguments: Arguments) -> anyhow::Result<CommandResult> {
    let count = arguments.int("count").unwrap_or_default();
    let ratio = arguments.double("ratio").unwrap_or(1.0);
    let round = arguments.bool("round").unwrap_or_default();
    debug!("handling calc command: {} x {} (round: {})", count, ratio, round);

    let product = count as f64 * ratio;
    let response = match round {
        true => format!("{} x {} = {}", count, ratio, product.round()),
        false => format!("{} x {} = {}", count, ratio, product),
    };

    Ok(CommandResult::reply(response))
}

pub fn descriptor() -> CommandDescriptor {
    CommandDescriptor::new("calc", HandlerRef::from_fn(calc))
        .description("Multiply a count by a ratio")
        .parameter(ParameterDescriptor::positional("count", ParameterType::Int))
        .parameter(
            ParameterDescriptor::option("ratio", ParameterType::Double)
                .shorthand("r")
                .nullable(),
        )
        .parameter(ParameterDescriptor::option("round", ParameterType::Bool))
}
