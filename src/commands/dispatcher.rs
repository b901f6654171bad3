//! Command dispatch.
//!
//! This module provides the [`Dispatcher`], the entry point of the command layer.
//! It takes the raw text of an incoming message and drives it through every stage
//! of the pipeline, reporting how the dispatch ended as a [`DispatchOutcome`].
//!
//! # Flow
//!
//! ```text
//! raw text ─► Tokenizer ─► Registry ─► Permission ─► Binder ─► Handler ─► Translator ─► Sink
//!                │            │            │            │
//!                ▼            ▼            ▼            ▼
//!             Ignored   CommandNotFound  PermissionDenied  BindingFailed
//! ```
//!
//! Binding, invocation and translation happen strictly in sequence for one
//! message. Distinct messages may be dispatched concurrently on the same
//! dispatcher: the registry and services are shared read-only and the
//! [`DispatchSession`](crate::commands::DispatchSession) is owned by a single
//! dispatch.
//!
//! # Errors
//!
//! Recoverable failures are outcomes, not errors. `dispatch` only returns `Err`
//! for collaborator failures (message sink, unexpected resolver failure, error
//! notifier) and for handler failures.
//!
//! # Examples
//!
//! ```no_run
//! # use std::sync::Arc;
//! # use chatcmd::commands::{CommandRegistry, Dispatcher};
//! # use chatcmd::platform::{ConsoleSink, Directory, InvokingMessage, User};
//! # async fn example() -> anyhow::Result<()> {
//! let dispatcher = Dispatcher::builder(
//!     CommandRegistry::new(),
//!     Arc::new(Directory::default()),
//!     Arc::new(ConsoleSink::new(1)),
//! )
//! .prefix("?")
//! .build();
//!
//! let message = InvokingMessage {
//!     id: 1,
//!     channel_id: 2,
//!     guild_id: None,
//!     author: User { id: 3, name: "alice".to_string(), bot: false },
//!     content: "?ping".to_string(),
//! };
//! let outcome = dispatcher.dispatch(&message.content, &message).await?;
//! println!("{:?}", outcome);
//! # Ok(())
//! # }
//! ```

use log::{debug, error, info};
use std::sync::Arc;

use crate::{
    commands::{
        binder::{BindError, Binder, ConversionError},
        handler::{CommandContext, Services},
        notifier::{ErrorNotifier, IgnoredReason, ReplyErrorNotifier},
        registry::CommandRegistry,
        tokenizer::Tokenizer,
        translator::translate,
    },
    platform::{DenyAll, EntityResolver, InvokingMessage, Message, MessageSink, PermissionPredicate},
};

/// How a dispatch ended.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    /// The message is not a command, or its author is a bot
    Ignored,
    /// No command has the requested name
    CommandNotFound(String),
    /// The author does not satisfy the permission requirement of the command
    PermissionDenied(String),
    /// A parameter could not be bound; the handler did not run
    BindingFailed(ConversionError),
    /// The handler ran and its result was translated
    Completed {
        /// Name of the command
        command: String,
        /// Message recorded by the dispatch session, if any
        last_message: Option<Message>,
    },
}

/// Drives incoming messages through the command pipeline.
///
/// Build one with [`Dispatcher::builder`] at startup and share it between all
/// dispatches.
pub struct Dispatcher {
    /// Recognizes the prefix and splits tokens
    tokenizer: Tokenizer,
    /// Registered commands, read-only after startup
    registry: Arc<CommandRegistry>,
    /// Services handlers are built from
    services: Arc<Services>,
    /// Resolves entity parameters
    resolver: Arc<dyn EntityResolver>,
    /// Receives every outbound message
    sink: Arc<dyn MessageSink>,
    /// Evaluates permission requirements
    permissions: Arc<dyn PermissionPredicate>,
    /// Receives recoverable failures
    notifier: Arc<dyn ErrorNotifier>,
    /// Whether messages authored by bots are ignored
    ignore_bots: bool,
}

impl Dispatcher {
    /// Starts building a dispatcher from its mandatory collaborators.
    ///
    /// # Defaults
    ///
    /// - prefix `!`
    /// - no services
    /// - [`DenyAll`] permission predicate
    /// - [`ReplyErrorNotifier`] replying through `sink`
    /// - bot authors ignored
    pub fn builder(
        registry: CommandRegistry,
        resolver: Arc<dyn EntityResolver>,
        sink: Arc<dyn MessageSink>,
    ) -> DispatcherBuilder {
        DispatcherBuilder {
            registry,
            resolver,
            sink,
            services: Services::new(),
            permissions: None,
            notifier: None,
            prefix: "!".to_owned(),
            ignore_bots: true,
        }
    }

    /// The registered commands.
    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    pub fn prefix(&self) -> &str {
        self.tokenizer.prefix()
    }

    /// Dispatches one incoming message.
    ///
    /// # Arguments
    ///
    /// * `raw_text` - The text to interpret, usually the message content
    /// * `message` - The invoking message, used for permissions, guild context and replies
    ///
    /// # Returns
    ///
    /// * `Ok(DispatchOutcome)` - How the dispatch ended, including recoverable failures
    /// * `Err(_)` - A collaborator or the handler failed; the dispatch was aborted
    pub async fn dispatch(
        &self,
        raw_text: &str,
        message: &InvokingMessage,
    ) -> anyhow::Result<DispatchOutcome> {
        if self.ignore_bots && message.author.bot {
            debug!("ignoring message {} from bot {}", message.id, message.author.id);
            return Ok(DispatchOutcome::Ignored);
        }

        let Some(invocation) = self.tokenizer.tokenize(raw_text) else {
            debug!("message {} is not a command", message.id);
            return Ok(DispatchOutcome::Ignored);
        };
        let name = invocation.name.clone();

        let Ok(descriptor) = self.registry.resolve(&name) else {
            debug!("command `{}` not found", name);
            self.notifier
                .ignored(IgnoredReason::CommandNotFound(name.clone()), message.clone())
                .await?;
            return Ok(DispatchOutcome::CommandNotFound(name));
        };

        if let Some(requirement) = descriptor.permission_requirement()
            && !self.permissions.evaluate(requirement, message)
        {
            debug!(
                "user {} does not satisfy `{}` for command `{}`",
                message.author.id,
                requirement.as_str(),
                name
            );
            self.notifier
                .ignored(IgnoredReason::PermissionDenied(name.clone()), message.clone())
                .await?;
            return Ok(DispatchOutcome::PermissionDenied(name));
        }

        debug!("dispatching command `{}` for message {}", name, message.id);

        let binder = Binder::new(self.resolver.as_ref(), message);
        let arguments = match binder.bind(descriptor, invocation).await {
            Ok(arguments) => arguments,
            Err(BindError::Conversion(conversion)) => {
                info!("command `{}` rejected: {}", name, conversion);
                self.notifier
                    .conversion_failed(conversion.clone(), message.clone())
                    .await?;
                return Ok(DispatchOutcome::BindingFailed(conversion));
            }
            Err(BindError::Collaborator(failure)) => {
                error!("entity lookup failed for command `{}`: {:#}", name, failure);
                return Err(failure.context(format!("binding command `{}`", name)));
            }
        };

        let mut context = CommandContext::new(message, self.sink.as_ref());
        let result = match descriptor
            .handler()
            .invoke(&self.services, &mut context, arguments)
            .await
        {
            Ok(result) => result,
            Err(failure) => {
                error!("command `{}` failed: {:#}", name, failure);
                return Err(failure.context(format!("running command `{}`", name)));
            }
        };

        let kind = result.kind();
        let (session, _) = translate(self.sink.as_ref(), message, context.into_session(), result)
            .await
            .inspect_err(|failure| {
                error!("could not deliver `{}` result of `{}`: {:#}", kind, name, failure)
            })?;

        debug!("command `{}` completed with a {} result", name, kind);
        Ok(DispatchOutcome::Completed {
            command: name,
            last_message: session.into_last_message(),
        })
    }
}

/// Builder returned by [`Dispatcher::builder`].
pub struct DispatcherBuilder {
    registry: CommandRegistry,
    resolver: Arc<dyn EntityResolver>,
    sink: Arc<dyn MessageSink>,
    services: Services,
    permissions: Option<Arc<dyn PermissionPredicate>>,
    notifier: Option<Arc<dyn ErrorNotifier>>,
    prefix: String,
    ignore_bots: bool,
}

impl DispatcherBuilder {
    /// Sets the command prefix.
    pub fn prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Sets the services handlers are built from.
    pub fn services(mut self, services: Services) -> Self {
        self.services = services;
        self
    }

    pub fn permissions(mut self, permissions: Arc<dyn PermissionPredicate>) -> Self {
        self.permissions = Some(permissions);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn ErrorNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub fn ignore_bots(mut self, ignore_bots: bool) -> Self {
        self.ignore_bots = ignore_bots;
        self
    }

    pub fn build(self) -> Dispatcher {
        let notifier = self
            .notifier
            .unwrap_or_else(|| Arc::new(ReplyErrorNotifier::new(self.sink.clone())));

        Dispatcher {
            tokenizer: Tokenizer::new(self.prefix),
            registry: Arc::new(self.registry),
            services: Arc::new(self.services),
            resolver: self.resolver,
            sink: self.sink,
            permissions: self.permissions.unwrap_or_else(|| Arc::new(DenyAll)),
            notifier,
            ignore_bots: self.ignore_bots,
        }
    }
}

#[cfg(test)]
mod tests {
    use futures::future::join_all;
    use std::sync::{
        Mutex,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::{
        commands::{
            binder::{Arguments, BoundValue, ConversionErrorKind},
            descriptor::{CommandDescriptor, ParameterDescriptor, ParameterType},
            handler::HandlerRef,
            notifier::MockErrorNotifier,
            result::CommandResult,
        },
        platform::{
            LookupError, MockEntityResolver, MockMessageSink, MockPermissionPredicate,
            OutboundMessage, PermissionRequirement, ReplyTo, User,
        },
    };

    fn create_test_message(content: &str, guild_id: Option<u64>) -> InvokingMessage {
        InvokingMessage {
            id: 1,
            channel_id: 10,
            guild_id,
            author: User {
                id: 7,
                name: "alice".to_string(),
                bot: false,
            },
            content: content.to_string(),
        }
    }

    fn created(outbound: OutboundMessage, id: u64) -> Message {
        Message {
            id,
            channel_id: outbound.channel_id,
            content: outbound.content,
            embeds: outbound.embeds,
        }
    }

    /// Records the arguments of every call and replies with `result`.
    fn recording_handler(
        calls: Arc<Mutex<Vec<Arguments>>>,
        result: CommandResult,
    ) -> HandlerRef {
        HandlerRef::from_fn(move |_, arguments| {
            calls.lock().unwrap().push(arguments);
            Ok(result.clone())
        })
    }

    fn quiet_sink() -> MockMessageSink {
        let mut sink = MockMessageSink::new();
        sink.expect_create_message().never();
        sink.expect_edit_message().never();
        sink
    }

    fn quiet_notifier() -> MockErrorNotifier {
        let mut notifier = MockErrorNotifier::new();
        notifier.expect_ignored().returning(|_, _| Ok(()));
        notifier
    }

    fn arg_opt_registry(calls: Arc<Mutex<Vec<Arguments>>>) -> CommandRegistry {
        let mut registry = CommandRegistry::new();
        registry
            .register(
                CommandDescriptor::new("test-arg-opt", recording_handler(calls, CommandResult::Empty))
                    .parameter(ParameterDescriptor::positional("argument", ParameterType::String))
                    .parameter(
                        ParameterDescriptor::option("option", ParameterType::String)
                            .shorthand("o")
                            .nullable(),
                    ),
            )
            .unwrap();
        registry
    }

    #[tokio::test]
    async fn test_argument_and_option_bound_in_order() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = Dispatcher::builder(
            arg_opt_registry(calls.clone()),
            Arc::new(MockEntityResolver::new()),
            Arc::new(quiet_sink()),
        )
        .build();

        let message = create_test_message("!test-arg-opt hello --option world", Some(100));
        let outcome = dispatcher.dispatch(&message.content, &message).await.unwrap();

        assert_eq!(
            outcome,
            DispatchOutcome::Completed {
                command: "test-arg-opt".to_string(),
                last_message: None
            }
        );
        let calls = calls.lock().unwrap();
        let values: Vec<BoundValue> = calls[0].values().cloned().collect();
        assert_eq!(
            values,
            vec![
                BoundValue::String("hello".to_string()),
                BoundValue::String("world".to_string())
            ]
        );
    }

    #[tokio::test]
    async fn test_omitted_nullable_option_is_absent() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = Dispatcher::builder(
            arg_opt_registry(calls.clone()),
            Arc::new(MockEntityResolver::new()),
            Arc::new(quiet_sink()),
        )
        .build();

        let message = create_test_message("!test-arg-opt hello", None);
        dispatcher.dispatch(&message.content, &message).await.unwrap();

        let calls = calls.lock().unwrap();
        let values: Vec<BoundValue> = calls[0].values().cloned().collect();
        assert_eq!(
            values,
            vec![BoundValue::String("hello".to_string()), BoundValue::Absent]
        );
    }

    #[tokio::test]
    async fn test_conversion_error_skips_handler_and_notifies() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut registry = CommandRegistry::new();
        registry
            .register(
                CommandDescriptor::new("test-int", recording_handler(calls.clone(), CommandResult::Empty))
                    .parameter(ParameterDescriptor::positional("number", ParameterType::Int)),
            )
            .unwrap();

        let mut notifier = MockErrorNotifier::new();
        notifier
            .expect_conversion_failed()
            .withf(|error, message| {
                error.kind == ConversionErrorKind::NotAValidInteger
                    && error.value == "five"
                    && message.id == 1
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let dispatcher = Dispatcher::builder(
            registry,
            Arc::new(MockEntityResolver::new()),
            Arc::new(quiet_sink()),
        )
        .notifier(Arc::new(notifier))
        .build();

        let message = create_test_message("!test-int five", Some(100));
        let outcome = dispatcher.dispatch(&message.content, &message).await.unwrap();

        let DispatchOutcome::BindingFailed(error) = outcome else {
            panic!("expected a binding failure, got {:?}", outcome);
        };
        assert_eq!(error.kind, ConversionErrorKind::NotAValidInteger);
        assert_eq!(error.value, "five");
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_default_notifier_replies_with_conversion_error() {
        let mut registry = CommandRegistry::new();
        registry
            .register(
                CommandDescriptor::new("test-int", HandlerRef::from_fn(|_, _| Ok(CommandResult::Empty)))
                    .parameter(ParameterDescriptor::positional("number", ParameterType::Int)),
            )
            .unwrap();

        let mut sink = MockMessageSink::new();
        sink.expect_create_message()
            .withf(|outbound| {
                outbound.reply_to.map(|r| r.message_id) == Some(1)
                    && outbound
                        .content
                        .as_deref()
                        .is_some_and(|c| c.contains("`number` is invalid"))
            })
            .times(1)
            .returning(|outbound| Ok(created(outbound, 2)));

        let dispatcher =
            Dispatcher::builder(registry, Arc::new(MockEntityResolver::new()), Arc::new(sink))
                .build();

        let message = create_test_message("!test-int five", Some(100));
        let outcome = dispatcher.dispatch(&message.content, &message).await.unwrap();
        assert!(matches!(outcome, DispatchOutcome::BindingFailed(_)));
    }

    #[tokio::test]
    async fn test_reply_result_creates_single_reply() {
        let mut registry = CommandRegistry::new();
        registry
            .register(CommandDescriptor::new(
                "ping",
                HandlerRef::from_fn(|_, _| Ok(CommandResult::reply("ok"))),
            ))
            .unwrap();

        let mut sink = MockMessageSink::new();
        sink.expect_create_message()
            .withf(|outbound| {
                outbound.reply_to
                    == Some(ReplyTo {
                        message_id: 1,
                        mention: false,
                    })
                    && outbound.content.as_deref() == Some("ok")
            })
            .times(1)
            .returning(|outbound| Ok(created(outbound, 50)));
        sink.expect_edit_message().never();

        let dispatcher =
            Dispatcher::builder(registry, Arc::new(MockEntityResolver::new()), Arc::new(sink))
                .build();

        let message = create_test_message("!ping", Some(100));
        let outcome = dispatcher.dispatch(&message.content, &message).await.unwrap();

        let DispatchOutcome::Completed { command, last_message } = outcome else {
            panic!("expected completion");
        };
        assert_eq!(command, "ping");
        assert_eq!(last_message.map(|m| m.id), Some(50));
    }

    #[tokio::test]
    async fn test_not_a_command_is_ignored() {
        let dispatcher = Dispatcher::builder(
            CommandRegistry::new(),
            Arc::new(MockEntityResolver::new()),
            Arc::new(quiet_sink()),
        )
        .notifier(Arc::new(MockErrorNotifier::new()))
        .build();

        for text in ["hello there", "!", "?ping", ""] {
            let message = create_test_message(text, Some(100));
            let outcome = dispatcher.dispatch(text, &message).await.unwrap();
            assert_eq!(outcome, DispatchOutcome::Ignored);
        }
    }

    #[tokio::test]
    async fn test_custom_prefix() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = Dispatcher::builder(
            arg_opt_registry(calls.clone()),
            Arc::new(MockEntityResolver::new()),
            Arc::new(quiet_sink()),
        )
        .prefix("bot:")
        .build();
        assert_eq!(dispatcher.prefix(), "bot:");

        let message = create_test_message("bot:test-arg-opt hi", None);
        dispatcher.dispatch(&message.content, &message).await.unwrap();
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_command() {
        let mut notifier = MockErrorNotifier::new();
        notifier
            .expect_ignored()
            .withf(|reason, _| *reason == IgnoredReason::CommandNotFound("nope".to_string()))
            .times(1)
            .returning(|_, _| Ok(()));

        let dispatcher = Dispatcher::builder(
            CommandRegistry::new(),
            Arc::new(MockEntityResolver::new()),
            Arc::new(quiet_sink()),
        )
        .notifier(Arc::new(notifier))
        .build();

        let message = create_test_message("!nope a b", Some(100));
        let outcome = dispatcher.dispatch(&message.content, &message).await.unwrap();
        assert_eq!(outcome, DispatchOutcome::CommandNotFound("nope".to_string()));
    }

    #[tokio::test]
    async fn test_bot_authors_ignored() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let registry = arg_opt_registry(calls.clone());
        let mut message = create_test_message("!test-arg-opt hello", Some(100));
        message.author.bot = true;

        let dispatcher = Dispatcher::builder(
            registry,
            Arc::new(MockEntityResolver::new()),
            Arc::new(quiet_sink()),
        )
        .build();
        let outcome = dispatcher.dispatch(&message.content, &message).await.unwrap();
        assert_eq!(outcome, DispatchOutcome::Ignored);
        assert!(calls.lock().unwrap().is_empty());

        let dispatcher = Dispatcher::builder(
            arg_opt_registry(calls.clone()),
            Arc::new(MockEntityResolver::new()),
            Arc::new(quiet_sink()),
        )
        .ignore_bots(false)
        .build();
        dispatcher.dispatch(&message.content, &message).await.unwrap();
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    fn admin_registry(calls: Arc<Mutex<Vec<Arguments>>>) -> CommandRegistry {
        let mut registry = CommandRegistry::new();
        registry
            .register(
                CommandDescriptor::new("admin", recording_handler(calls, CommandResult::Empty))
                    .permission(PermissionRequirement::new("administrator")),
            )
            .unwrap();
        registry
    }

    #[tokio::test]
    async fn test_permission_denied() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut permissions = MockPermissionPredicate::new();
        permissions
            .expect_evaluate()
            .withf(|requirement, message| {
                requirement.as_str() == "administrator" && message.author.id == 7
            })
            .times(1)
            .return_const(false);

        let dispatcher = Dispatcher::builder(
            admin_registry(calls.clone()),
            Arc::new(MockEntityResolver::new()),
            Arc::new(quiet_sink()),
        )
        .permissions(Arc::new(permissions))
        .notifier(Arc::new(quiet_notifier()))
        .build();

        let message = create_test_message("!admin", Some(100));
        let outcome = dispatcher.dispatch(&message.content, &message).await.unwrap();
        assert_eq!(outcome, DispatchOutcome::PermissionDenied("admin".to_string()));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_permission_granted() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut permissions = MockPermissionPredicate::new();
        permissions.expect_evaluate().return_const(true);

        let dispatcher = Dispatcher::builder(
            admin_registry(calls.clone()),
            Arc::new(MockEntityResolver::new()),
            Arc::new(quiet_sink()),
        )
        .permissions(Arc::new(permissions))
        .build();

        let message = create_test_message("!admin", Some(100));
        let outcome = dispatcher.dispatch(&message.content, &message).await.unwrap();
        assert!(matches!(outcome, DispatchOutcome::Completed { .. }));
        assert_eq!(calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_gated_commands_denied_by_default() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let dispatcher = Dispatcher::builder(
            admin_registry(calls.clone()),
            Arc::new(MockEntityResolver::new()),
            Arc::new(quiet_sink()),
        )
        .notifier(Arc::new(quiet_notifier()))
        .build();

        let message = create_test_message("!admin", Some(100));
        let outcome = dispatcher.dispatch(&message.content, &message).await.unwrap();
        assert_eq!(outcome, DispatchOutcome::PermissionDenied("admin".to_string()));
    }

    #[tokio::test]
    async fn test_role_in_direct_message_fails() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut registry = CommandRegistry::new();
        registry
            .register(
                CommandDescriptor::new("grant", recording_handler(calls.clone(), CommandResult::Empty))
                    .parameter(ParameterDescriptor::positional("role", ParameterType::Role)),
            )
            .unwrap();
        let mut resolver = MockEntityResolver::new();
        resolver.expect_resolve_role().never();

        let dispatcher = Dispatcher::builder(registry, Arc::new(resolver), Arc::new(quiet_sink()))
            .notifier(Arc::new(crate::commands::notifier::LogErrorNotifier))
            .build();

        let message = create_test_message("!grant 300", None);
        let outcome = dispatcher.dispatch(&message.content, &message).await.unwrap();
        let DispatchOutcome::BindingFailed(error) = outcome else {
            panic!("expected a binding failure");
        };
        assert_eq!(error.kind, ConversionErrorKind::IssuedOutsideGuildContext);
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_resolver_failure_is_fatal() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let mut registry = CommandRegistry::new();
        registry
            .register(
                CommandDescriptor::new("whois", recording_handler(calls.clone(), CommandResult::Empty))
                    .parameter(ParameterDescriptor::positional("who", ParameterType::User)),
            )
            .unwrap();
        let mut resolver = MockEntityResolver::new();
        resolver
            .expect_resolve_user()
            .returning(|_| Err(LookupError::Other(anyhow::anyhow!("gateway down"))));

        let dispatcher = Dispatcher::builder(registry, Arc::new(resolver), Arc::new(quiet_sink()))
            .notifier(Arc::new(MockErrorNotifier::new()))
            .build();

        let message = create_test_message("!whois <@42>", None);
        let error = dispatcher
            .dispatch(&message.content, &message)
            .await
            .unwrap_err();
        assert!(format!("{:#}", error).contains("gateway down"));
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_handler_failure_is_fatal() {
        let mut registry = CommandRegistry::new();
        registry
            .register(CommandDescriptor::new(
                "boom",
                HandlerRef::from_fn(|_, _| Err(anyhow::anyhow!("boom"))),
            ))
            .unwrap();

        let dispatcher = Dispatcher::builder(
            registry,
            Arc::new(MockEntityResolver::new()),
            Arc::new(quiet_sink()),
        )
        .build();

        let message = create_test_message("!boom", None);
        let error = dispatcher
            .dispatch(&message.content, &message)
            .await
            .unwrap_err();
        assert!(error.to_string().contains("running command `boom`"));
    }

    #[tokio::test]
    async fn test_sink_failure_is_fatal() {
        let mut registry = CommandRegistry::new();
        registry
            .register(CommandDescriptor::new(
                "ping",
                HandlerRef::from_fn(|_, _| Ok(CommandResult::send("pong"))),
            ))
            .unwrap();
        let mut sink = MockMessageSink::new();
        sink.expect_create_message()
            .returning(|_| Err(anyhow::anyhow!("forbidden")));

        let dispatcher =
            Dispatcher::builder(registry, Arc::new(MockEntityResolver::new()), Arc::new(sink))
                .build();

        let message = create_test_message("!ping", None);
        assert!(dispatcher.dispatch(&message.content, &message).await.is_err());
    }

    #[tokio::test]
    async fn test_concurrent_dispatches_are_independent() {
        let invocations = Arc::new(AtomicUsize::new(0));
        let counter = invocations.clone();
        let mut registry = CommandRegistry::new();
        registry
            .register(
                CommandDescriptor::new(
                    "echo",
                    HandlerRef::from_fn(move |_, arguments| {
                        counter.fetch_add(1, Ordering::SeqCst);
                        Ok(CommandResult::reply(
                            arguments.string("text").unwrap_or_default().to_string(),
                        ))
                    }),
                )
                .parameter(ParameterDescriptor::positional("text", ParameterType::String)),
            )
            .unwrap();

        let next_id = Arc::new(AtomicUsize::new(100));
        let mut sink = MockMessageSink::new();
        sink.expect_create_message().times(8).returning(move |outbound| {
            let id = next_id.fetch_add(1, Ordering::SeqCst) as u64;
            Ok(created(outbound, id))
        });

        let dispatcher =
            Dispatcher::builder(registry, Arc::new(MockEntityResolver::new()), Arc::new(sink))
                .build();

        let messages: Vec<InvokingMessage> = (0..8)
            .map(|i| InvokingMessage {
                id: i,
                ..create_test_message(&format!("!echo word{}", i), Some(100))
            })
            .collect();
        let outcomes = join_all(
            messages
                .iter()
                .map(|message| dispatcher.dispatch(&message.content, message)),
        )
        .await;

        assert_eq!(invocations.load(Ordering::SeqCst), 8);
        for (i, outcome) in outcomes.into_iter().enumerate() {
            let DispatchOutcome::Completed { last_message, .. } = outcome.unwrap() else {
                panic!("expected completion");
            };
            assert_eq!(
                last_message.and_then(|m| m.content),
                Some(format!("word{}", i))
            );
        }
    }
}
