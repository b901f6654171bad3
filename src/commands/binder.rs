//! Parameter binding.
//!
//! The [`Binder`] converts the raw tokens of a [`RawInvocation`] into typed
//! [`Arguments`] following the parameters of a [`CommandDescriptor`], in
//! declaration order.
//!
//! # Rules
//!
//! For each parameter:
//!
//! 1. a remainder consuming positional takes every positional token left, joined
//!    with a single space
//! 2. any other positional takes the next positional token
//! 3. an option is looked up by name, then by shorthand; a missing `Bool` option
//!    binds `false`
//! 4. a missing value binds as absent when the parameter is nullable and fails
//!    with [`ConversionErrorKind::NoValueProvided`] otherwise
//!
//! The first conversion failure stops binding: no partial result is ever handed
//! to a handler. Surplus positional tokens and unknown options are ignored.
//!
//! # Guild context
//!
//! `Member` and `Channel` parameters bind as absent in a direct conversation,
//! while `Role` parameters fail with
//! [`ConversionErrorKind::IssuedOutsideGuildContext`].

use log::debug;
use std::fmt;
use thiserror::Error;

use crate::{
    commands::{
        descriptor::{CommandDescriptor, ParameterDescriptor, ParameterType},
        tokenizer::{OptionValue, RawInvocation},
    },
    platform::{Channel, EntityResolver, InvokingMessage, LookupError, Member, Role, User},
    utils::{parse_channel_id, parse_id, parse_user_id},
};

/// Reason a raw value could not be bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversionErrorKind {
    NotAValidInteger,
    NotAValidNumber,
    /// A positional bool that is neither `true` nor `false`
    NotAValidBool,
    /// A bool option written with a value
    FlagTakesNoValue,
    NoValueProvided,
    NotAValidUser,
    UserDoesNotExist,
    NotAValidMember,
    MemberDoesNotExist,
    NotAValidChannel,
    ChannelDoesNotExist,
    NotAValidRole,
    IssuedOutsideGuildContext,
}

impl fmt::Display for ConversionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            ConversionErrorKind::NotAValidInteger => "not a valid integer",
            ConversionErrorKind::NotAValidNumber => "not a valid number",
            ConversionErrorKind::NotAValidBool => "expected `true` or `false`",
            ConversionErrorKind::FlagTakesNoValue => "flags do not take a value",
            ConversionErrorKind::NoValueProvided => "no value provided",
            ConversionErrorKind::NotAValidUser => "not a valid user",
            ConversionErrorKind::UserDoesNotExist => "user does not exist",
            ConversionErrorKind::NotAValidMember => "not a valid member",
            ConversionErrorKind::MemberDoesNotExist => "member does not exist",
            ConversionErrorKind::NotAValidChannel => "not a valid channel",
            ConversionErrorKind::ChannelDoesNotExist => "channel does not exist",
            ConversionErrorKind::NotAValidRole => "not a valid role",
            ConversionErrorKind::IssuedOutsideGuildContext => "only available in a guild",
        };
        f.write_str(reason)
    }
}

fn parameter_label(positional: &bool) -> &'static str {
    if *positional { "argument" } else { "option" }
}

/// Formats the ` (got `value`)` suffix, empty when nothing was provided.
pub(crate) fn received(value: &str) -> String {
    match value.is_empty() {
        true => String::new(),
        false => format!(" (got `{}`)", value),
    }
}

/// A value that could not be bound to a parameter.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} `{parameter}` is invalid: {kind}{}", parameter_label(.positional), received(.value))]
pub struct ConversionError {
    /// What went wrong
    pub kind: ConversionErrorKind,
    /// Offending raw value, empty when nothing was provided
    pub value: String,
    /// Name of the parameter
    pub parameter: String,
    /// Whether the parameter is positional
    pub positional: bool,
}

/// Errors returned by [`Binder::bind`].
#[derive(Debug, Error)]
pub enum BindError {
    /// A value was rejected; recoverable and reported to the user
    #[error(transparent)]
    Conversion(#[from] ConversionError),
    /// The entity resolver failed outside of the recognized lookup failures
    #[error("entity lookup failed: {0}")]
    Collaborator(#[source] anyhow::Error),
}

/// A bound, typed parameter value.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundValue {
    /// No value, for nullable parameters and guild-only types in a direct conversation
    Absent,
    String(String),
    Int(i64),
    Double(f64),
    Bool(bool),
    User(User),
    Member(Member),
    Channel(Channel),
    Role(Role),
}

impl BoundValue {
    pub fn is_absent(&self) -> bool {
        matches!(self, BoundValue::Absent)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            BoundValue::String(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            BoundValue::Int(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_double(&self) -> Option<f64> {
        match self {
            BoundValue::Double(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            BoundValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_user(&self) -> Option<&User> {
        match self {
            BoundValue::User(user) => Some(user),
            _ => None,
        }
    }

    pub fn as_member(&self) -> Option<&Member> {
        match self {
            BoundValue::Member(member) => Some(member),
            _ => None,
        }
    }

    pub fn as_channel(&self) -> Option<&Channel> {
        match self {
            BoundValue::Channel(channel) => Some(channel),
            _ => None,
        }
    }

    pub fn as_role(&self) -> Option<&Role> {
        match self {
            BoundValue::Role(role) => Some(role),
            _ => None,
        }
    }
}

/// Bound parameter values, in declaration order, addressable by parameter name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Arguments {
    entries: Vec<(String, BoundValue)>,
}

impl Arguments {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a value.
    pub fn push(&mut self, name: impl Into<String>, value: BoundValue) {
        self.entries.push((name.into(), value));
    }

    /// Returns the value bound to `name`.
    pub fn get(&self, name: &str) -> Option<&BoundValue> {
        self.entries
            .iter()
            .find(|(entry, _)| entry == name)
            .map(|(_, value)| value)
    }

    /// Iterates over the values in declaration order.
    pub fn values(&self) -> impl Iterator<Item = &BoundValue> {
        self.entries.iter().map(|(_, value)| value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn string(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(BoundValue::as_str)
    }

    pub fn int(&self, name: &str) -> Option<i64> {
        self.get(name).and_then(BoundValue::as_int)
    }

    pub fn double(&self, name: &str) -> Option<f64> {
        self.get(name).and_then(BoundValue::as_double)
    }

    pub fn bool(&self, name: &str) -> Option<bool> {
        self.get(name).and_then(BoundValue::as_bool)
    }

    pub fn user(&self, name: &str) -> Option<&User> {
        self.get(name).and_then(BoundValue::as_user)
    }

    pub fn member(&self, name: &str) -> Option<&Member> {
        self.get(name).and_then(BoundValue::as_member)
    }

    pub fn channel(&self, name: &str) -> Option<&Channel> {
        self.get(name).and_then(BoundValue::as_channel)
    }

    pub fn role(&self, name: &str) -> Option<&Role> {
        self.get(name).and_then(BoundValue::as_role)
    }
}

/// Raw input obtained for one parameter.
enum RawValue {
    Flag,
    Text(String),
}

/// Binds invocations in the context of one invoking message.
pub struct Binder<'a> {
    resolver: &'a dyn EntityResolver,
    message: &'a InvokingMessage,
}

impl<'a> Binder<'a> {
    pub fn new(resolver: &'a dyn EntityResolver, message: &'a InvokingMessage) -> Self {
        Binder { resolver, message }
    }

    /// Binds every parameter of `descriptor` from `invocation`.
    ///
    /// # Errors
    ///
    /// - [`BindError::Conversion`] for the first parameter that cannot be bound
    /// - [`BindError::Collaborator`] when the resolver fails in an unrecognized way
    pub async fn bind(
        &self,
        descriptor: &CommandDescriptor,
        mut invocation: RawInvocation,
    ) -> Result<Arguments, BindError> {
        let mut arguments = Arguments::new();

        for parameter in descriptor.parameters() {
            let raw = if parameter.is_positional() {
                if parameter.consumes_remainder() {
                    let rest: Vec<String> = invocation.positionals.drain(..).collect();
                    (!rest.is_empty()).then(|| RawValue::Text(rest.join(" ")))
                } else {
                    invocation.positionals.pop_front().map(RawValue::Text)
                }
            } else {
                invocation
                    .options
                    .remove(parameter.name())
                    .or_else(|| {
                        parameter
                            .shorthand_name()
                            .and_then(|shorthand| invocation.options.remove(shorthand))
                    })
                    .map(|value| match value {
                        OptionValue::Flag => RawValue::Flag,
                        OptionValue::Value(value) => RawValue::Text(value),
                    })
            };

            let value = match raw {
                Some(raw) => self.convert(parameter, raw).await?,
                None if !parameter.is_positional()
                    && parameter.parameter_type() == ParameterType::Bool =>
                {
                    BoundValue::Bool(false)
                }
                None if parameter.can_be_null() => BoundValue::Absent,
                None => {
                    return Err(failure(
                        parameter,
                        ConversionErrorKind::NoValueProvided,
                        "",
                    ));
                }
            };

            debug!("bound `{}` to {:?}", parameter.name(), value);
            arguments.push(parameter.name(), value);
        }

        Ok(arguments)
    }

    async fn convert(
        &self,
        parameter: &ParameterDescriptor,
        raw: RawValue,
    ) -> Result<BoundValue, BindError> {
        let value = match raw {
            RawValue::Flag if parameter.parameter_type() == ParameterType::Bool => {
                return Ok(BoundValue::Bool(true));
            }
            RawValue::Flag => {
                return Err(failure(
                    parameter,
                    ConversionErrorKind::NoValueProvided,
                    "",
                ));
            }
            RawValue::Text(value) => value,
        };

        match parameter.parameter_type() {
            // options are flags and never take a value
            ParameterType::Bool if !parameter.is_positional() => Err(failure(
                parameter,
                ConversionErrorKind::FlagTakesNoValue,
                &value,
            )),
            ParameterType::Bool => match value.to_ascii_lowercase().as_str() {
                "true" => Ok(BoundValue::Bool(true)),
                "false" => Ok(BoundValue::Bool(false)),
                _ => Err(failure(parameter, ConversionErrorKind::NotAValidBool, &value)),
            },
            ParameterType::String => Ok(BoundValue::String(value)),
            ParameterType::Int => value
                .parse::<i64>()
                .map(BoundValue::Int)
                .map_err(|_| failure(parameter, ConversionErrorKind::NotAValidInteger, &value)),
            ParameterType::Double => value
                .parse::<f64>()
                .map(BoundValue::Double)
                .map_err(|_| failure(parameter, ConversionErrorKind::NotAValidNumber, &value)),
            ParameterType::User => self.convert_user(parameter, &value).await,
            ParameterType::Member => self.convert_member(parameter, &value).await,
            ParameterType::Channel => self.convert_channel(parameter, &value).await,
            ParameterType::Role => self.convert_role(parameter, &value).await,
        }
    }

    async fn convert_user(
        &self,
        parameter: &ParameterDescriptor,
        value: &str,
    ) -> Result<BoundValue, BindError> {
        let user_id = parse_user_id(value)
            .ok_or_else(|| failure(parameter, ConversionErrorKind::NotAValidUser, value))?;

        match self.resolver.resolve_user(user_id).await {
            Ok(user) => Ok(BoundValue::User(user)),
            Err(error) => Err(lookup_failure(
                parameter,
                ConversionErrorKind::UserDoesNotExist,
                value,
                error,
            )),
        }
    }

    async fn convert_member(
        &self,
        parameter: &ParameterDescriptor,
        value: &str,
    ) -> Result<BoundValue, BindError> {
        let Some(guild_id) = self.message.guild_id else {
            debug!("member `{}` requested outside a guild", parameter.name());
            return Ok(BoundValue::Absent);
        };
        let user_id = parse_user_id(value)
            .ok_or_else(|| failure(parameter, ConversionErrorKind::NotAValidMember, value))?;

        match self.resolver.resolve_member(guild_id, user_id).await {
            Ok(member) => Ok(BoundValue::Member(member)),
            Err(error) => Err(lookup_failure(
                parameter,
                ConversionErrorKind::MemberDoesNotExist,
                value,
                error,
            )),
        }
    }

    async fn convert_channel(
        &self,
        parameter: &ParameterDescriptor,
        value: &str,
    ) -> Result<BoundValue, BindError> {
        let Some(guild_id) = self.message.guild_id else {
            debug!("channel `{}` requested outside a guild", parameter.name());
            return Ok(BoundValue::Absent);
        };
        let channel_id = parse_channel_id(value)
            .ok_or_else(|| failure(parameter, ConversionErrorKind::NotAValidChannel, value))?;

        match self.resolver.resolve_channel(guild_id, channel_id).await {
            Ok(channel) => Ok(BoundValue::Channel(channel)),
            Err(error) => Err(lookup_failure(
                parameter,
                ConversionErrorKind::ChannelDoesNotExist,
                value,
                error,
            )),
        }
    }

    async fn convert_role(
        &self,
        parameter: &ParameterDescriptor,
        value: &str,
    ) -> Result<BoundValue, BindError> {
        let Some(guild_id) = self.message.guild_id else {
            return Err(failure(
                parameter,
                ConversionErrorKind::IssuedOutsideGuildContext,
                value,
            ));
        };
        let role_id = parse_id(value)
            .ok_or_else(|| failure(parameter, ConversionErrorKind::NotAValidRole, value))?;

        match self.resolver.resolve_role(guild_id, role_id).await {
            Ok(role) => Ok(BoundValue::Role(role)),
            Err(error) => Err(lookup_failure(
                parameter,
                ConversionErrorKind::NotAValidRole,
                value,
                error,
            )),
        }
    }
}

fn failure(parameter: &ParameterDescriptor, kind: ConversionErrorKind, value: &str) -> BindError {
    BindError::Conversion(ConversionError {
        kind,
        value: value.to_owned(),
        parameter: parameter.name().to_owned(),
        positional: parameter.is_positional(),
    })
}

/// Maps recognized lookup failures to `kind`, anything else to a collaborator failure.
fn lookup_failure(
    parameter: &ParameterDescriptor,
    kind: ConversionErrorKind,
    value: &str,
    error: LookupError,
) -> BindError {
    match error {
        LookupError::NotFound | LookupError::ServerError(_) => failure(parameter, kind, value),
        LookupError::Other(error) => BindError::Collaborator(error),
    }
}
