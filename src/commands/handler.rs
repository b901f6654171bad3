//! Command handlers and their construction.
//!
//! A handler is the code run once a command is resolved and its parameters are
//! bound. Handlers come in two flavours:
//!
//! - [`SyncHandler`] computes its result without suspending
//! - [`AsyncHandler`] may await lookups or post messages while it runs, through
//!   [`CommandContext::post`]
//!
//! Handlers are not registered as instances. A [`HandlerRef`] holds a factory that
//! builds a fresh handler from the [`Services`] container on every dispatch, and
//! the instance is dropped once the dispatch is over.
//!
//! # Examples
//!
//! ```
//! use chatcmd::commands::{
//!     Arguments, CommandContext, CommandResult, ConstructionError, FromServices, HandlerRef,
//!     Services, SyncHandler,
//! };
//!
//! struct Greeting(String);
//!
//! struct Hello {
//!     greeting: std::sync::Arc<Greeting>,
//! }
//!
//! impl FromServices for Hello {
//!     fn from_services(services: &Services) -> Result<Self, ConstructionError> {
//!         Ok(Hello {
//!             greeting: services.require::<Greeting>()?,
//!         })
//!     }
//! }
//!
//! impl SyncHandler for Hello {
//!     fn call(&self, _: &CommandContext<'_>, _: Arguments) -> anyhow::Result<CommandResult> {
//!         Ok(CommandResult::reply(self.greeting.0.clone()))
//!     }
//! }
//!
//! let handler = HandlerRef::of_sync::<Hello>();
//! assert!(!handler.is_async());
//! ```

use async_trait::async_trait;
use log::debug;
use std::{
    any::{Any, TypeId, type_name},
    collections::HashMap,
    fmt, mem,
    sync::Arc,
};
use thiserror::Error;

use crate::{
    commands::{
        binder::Arguments,
        result::CommandResult,
        translator::{DispatchSession, translate},
    },
    platform::{InvokingMessage, Message, MessageSink},
};

/// Errors raised while building a handler.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConstructionError {
    /// A service the handler depends on was never registered
    #[error("service `{0}` is not registered")]
    MissingService(&'static str),
}

/// Typed container of the shared services handlers depend on.
///
/// Services are stored once per type and shared between dispatches behind an
/// [`Arc`].
#[derive(Clone, Default)]
pub struct Services {
    services: HashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Services {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a service, replacing any previous service of the same type.
    pub fn insert<T: Any + Send + Sync>(&mut self, service: T) {
        debug!("registering service {}", type_name::<T>());
        self.services.insert(TypeId::of::<T>(), Arc::new(service));
    }

    /// Builder flavour of [`Services::insert`].
    pub fn with<T: Any + Send + Sync>(mut self, service: T) -> Self {
        self.insert(service);
        self
    }

    pub fn get<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
        self.services
            .get(&TypeId::of::<T>())
            .cloned()
            .and_then(|service| service.downcast::<T>().ok())
    }

    /// Returns the service of type `T`.
    ///
    /// # Errors
    ///
    /// Returns [`ConstructionError::MissingService`] when no such service is registered.
    pub fn require<T: Any + Send + Sync>(&self) -> Result<Arc<T>, ConstructionError> {
        self.get::<T>()
            .ok_or(ConstructionError::MissingService(type_name::<T>()))
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl fmt::Debug for Services {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Services")
            .field("len", &self.services.len())
            .finish()
    }
}

/// Builds a handler from the registered services.
pub trait FromServices: Sized {
    fn from_services(services: &Services) -> Result<Self, ConstructionError>;
}

/// A handler that completes without suspending.
pub trait SyncHandler: Send + Sync {
    fn call(
        &self,
        context: &CommandContext<'_>,
        arguments: Arguments,
    ) -> anyhow::Result<CommandResult>;
}

/// A handler that may suspend.
#[async_trait]
pub trait AsyncHandler: Send + Sync {
    async fn call(
        &self,
        context: &mut CommandContext<'_>,
        arguments: Arguments,
    ) -> anyhow::Result<CommandResult>;
}

type SyncFactory =
    Arc<dyn Fn(&Services) -> Result<Box<dyn SyncHandler>, ConstructionError> + Send + Sync>;
type AsyncFactory =
    Arc<dyn Fn(&Services) -> Result<Box<dyn AsyncHandler>, ConstructionError> + Send + Sync>;

/// Reference to the handler of a command.
#[derive(Clone)]
pub enum HandlerRef {
    Sync(SyncFactory),
    Async(AsyncFactory),
}

impl HandlerRef {
    /// References a synchronous handler built through [`FromServices`].
    pub fn of_sync<H>() -> Self
    where
        H: SyncHandler + FromServices + 'static,
    {
        HandlerRef::Sync(Arc::new(
            |services: &Services| -> Result<Box<dyn SyncHandler>, ConstructionError> {
                Ok(Box::new(H::from_services(services)?))
            },
        ))
    }

    /// References an asynchronous handler built through [`FromServices`].
    pub fn of_async<H>() -> Self
    where
        H: AsyncHandler + FromServices + 'static,
    {
        HandlerRef::Async(Arc::new(
            |services: &Services| -> Result<Box<dyn AsyncHandler>, ConstructionError> {
                Ok(Box::new(H::from_services(services)?))
            },
        ))
    }

    /// Wraps a stateless closure as a synchronous handler.
    pub fn from_fn<F>(handler: F) -> Self
    where
        F: Fn(&CommandContext<'_>, Arguments) -> anyhow::Result<CommandResult>
            + Send
            + Sync
            + 'static,
    {
        let handler = Arc::new(handler);
        HandlerRef::Sync(Arc::new(
            move |_: &Services| -> Result<Box<dyn SyncHandler>, ConstructionError> {
                Ok(Box::new(FnHandler(handler.clone())))
            },
        ))
    }

    pub fn is_async(&self) -> bool {
        matches!(self, HandlerRef::Async(_))
    }

    /// Builds a handler instance and runs it to completion.
    ///
    /// The construction error is reported as an [`anyhow::Error`] since it is a
    /// startup wiring mistake rather than a user error.
    pub(crate) async fn invoke(
        &self,
        services: &Services,
        context: &mut CommandContext<'_>,
        arguments: Arguments,
    ) -> anyhow::Result<CommandResult> {
        match self {
            HandlerRef::Sync(factory) => {
                let handler = factory(services)?;
                handler.call(context, arguments)
            }
            HandlerRef::Async(factory) => {
                let handler = factory(services)?;
                handler.call(context, arguments).await
            }
        }
    }
}

impl fmt::Debug for HandlerRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandlerRef::Sync(_) => f.write_str("HandlerRef::Sync"),
            HandlerRef::Async(_) => f.write_str("HandlerRef::Async"),
        }
    }
}

struct FnHandler<F>(Arc<F>);

impl<F> SyncHandler for FnHandler<F>
where
    F: Fn(&CommandContext<'_>, Arguments) -> anyhow::Result<CommandResult> + Send + Sync,
{
    fn call(
        &self,
        context: &CommandContext<'_>,
        arguments: Arguments,
    ) -> anyhow::Result<CommandResult> {
        (self.0)(context, arguments)
    }
}

/// What a handler sees of the dispatch it runs in.
pub struct CommandContext<'a> {
    message: &'a InvokingMessage,
    sink: &'a dyn MessageSink,
    session: DispatchSession,
}

impl<'a> CommandContext<'a> {
    pub(crate) fn new(message: &'a InvokingMessage, sink: &'a dyn MessageSink) -> Self {
        CommandContext {
            message,
            sink,
            session: DispatchSession::new(),
        }
    }

    /// The message that triggered the command.
    pub fn message(&self) -> &InvokingMessage {
        self.message
    }

    /// The message recorded by the last `Reply` or `Send` posted so far.
    pub fn newest_message(&self) -> Option<&Message> {
        self.session.last_message()
    }

    /// Posts a result right away, before the handler returns.
    ///
    /// The result goes through the same translation as the final result and
    /// shares its session, so a later `FollowUp` or `Edit` targets what was
    /// posted here. Returns the created or edited message, if any.
    pub async fn post(&mut self, result: CommandResult) -> anyhow::Result<Option<Message>> {
        let session = mem::take(&mut self.session);
        let (session, message) = translate(self.sink, self.message, session, result).await?;
        self.session = session;
        Ok(message)
    }

    pub(crate) fn into_session(self) -> DispatchSession {
        self.session
    }
}
