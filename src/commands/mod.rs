//! Text command dispatch.
//!
//! This module turns chat messages such as `!greet world -o hi` into calls to
//! registered command handlers, and turns what the handlers return into outbound
//! messages.
//!
//! # Overview
//!
//! A dispatch goes through these stages, in order:
//! 1. **Tokenizing** - [`Tokenizer`] strips the prefix and splits the command name,
//!    positional tokens and options
//! 2. **Lookup** - [`CommandRegistry`] resolves the name to a [`CommandDescriptor`]
//! 3. **Permission** - the descriptor's requirement, if any, is evaluated by the
//!    configured [`PermissionPredicate`](crate::platform::PermissionPredicate)
//! 4. **Binding** - [`Binder`] converts raw tokens into typed [`Arguments`],
//!    resolving platform entities on the way
//! 5. **Invocation** - the handler referenced by [`HandlerRef`] is built from the
//!    [`Services`] and run
//! 6. **Translation** - the [`CommandResult`] becomes at most one message
//!    operation on the [`MessageSink`](crate::platform::MessageSink)
//!
//! The [`Dispatcher`] drives all of them and reports a [`DispatchOutcome`].
//!
//! # Architecture
//!
//! ```text
//! "!calc 3 -r 1.5 --round"
//!      │
//!      ▼
//! ┌─────────────┐     ┌─────────────────┐
//! │  Tokenizer  │ ──► │  RawInvocation  │
//! └─────────────┘     └─────────────────┘
//!                              │
//!      ┌───────────────────────┘
//!      ▼
//! ┌─────────────┐     ┌─────────────┐     ┌──────────────────┐
//! │  Registry   │ ──► │   Binder    │ ──► │    Arguments     │
//! └─────────────┘     └─────────────┘     └──────────────────┘
//!                                                  │
//!      ┌───────────────────────────────────────────┘
//!      ▼
//! ┌─────────────┐     ┌─────────────────┐     ┌──────────────┐
//! │  Handler    │ ──► │  CommandResult  │ ──► │  Translator  │ ──► MessageSink
//! └─────────────┘     └─────────────────┘     └──────────────┘
//! ```
//!
//! # Command Structure
//!
//! Commands follow the format `<prefix><name> [positional...] [--option value] [--flag]`.
//! Options may also be written `-o value` with their shorthand or `--option=value`.
//! A lone `--` makes every following token positional.
//!
//! The bundled commands live in [`actions`].

pub mod actions;
pub mod binder;
pub mod descriptor;
pub mod dispatcher;
pub mod handler;
pub mod notifier;
pub mod registry;
pub mod responses;
pub mod result;
pub mod tokenizer;
pub mod translator;

pub use crate::commands::{
    binder::{Arguments, BindError, Binder, BoundValue, ConversionError, ConversionErrorKind},
    descriptor::{CommandDescriptor, ParameterDescriptor, ParameterType},
    dispatcher::{DispatchOutcome, Dispatcher, DispatcherBuilder},
    handler::{
        AsyncHandler, CommandContext, ConstructionError, FromServices, HandlerRef, Services,
        SyncHandler,
    },
    notifier::{ErrorNotifier, IgnoredReason, LogErrorNotifier, ReplyErrorNotifier},
    registry::{CommandRegistry, RegistryError},
    result::{CommandResult, MessageContent},
    tokenizer::{OptionValue, RawInvocation, Tokenizer},
    translator::{DispatchSession, Operation},
};
