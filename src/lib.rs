//! chatcmd - text command dispatch for chat bots.
//!
//! Turns chat messages starting with a prefix into calls to registered command
//! handlers with typed, validated arguments, and turns the handlers' results into
//! replies, plain messages, follow-ups or edits.
//!
//! # Modules
//!
//! - [`commands`] - tokenizer, registry, parameter binder, dispatcher and result translator
//! - [`platform`] - chat entities and the collaborator traits the dispatcher talks to
//! - [`config`] - YAML configuration with environment variable overrides
//! - [`utils`] - mention and identifier parsing

pub mod commands;
pub mod config;
pub mod platform;
pub mod utils;
