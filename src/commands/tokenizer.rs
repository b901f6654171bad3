//! Message tokenizing.
//!
//! Turns a raw message body into a [`RawInvocation`]: the command name, the queue
//! of positional tokens and the map of named options.
//!
//! # Grammar
//!
//! ```text
//! <prefix><name> [token...]
//!
//! --name value    long option with a value
//! --name=value    long option with an inline value
//! -n value        shorthand option with a value
//! --name / -n     flag, when followed by another option or by the end of input
//! --              ends option parsing, every later token is positional
//! ```
//!
//! Tokens shaped like negative numbers (`-5`, `-0.5`, `-inf`) are values, never options.

use log::debug;
use std::collections::{HashMap, VecDeque};

/// Raw value of a named option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// The option was given without a value
    Flag,
    /// The option was followed by a value token
    Value(String),
}

/// Tokenized form of a command message, consumed by the binder.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawInvocation {
    /// Command name, first token after the prefix
    pub name: String,
    /// Positional tokens in order of appearance
    pub positionals: VecDeque<String>,
    /// Named options keyed by long or shorthand name, without dashes
    pub options: HashMap<String, OptionValue>,
}

/// Splits message bodies starting with a configured prefix.
#[derive(Debug, Clone)]
pub struct Tokenizer {
    prefix: String,
}

impl Tokenizer {
    /// Creates a tokenizer recognizing commands starting with `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Tokenizer {
            prefix: prefix.into(),
        }
    }

    /// Returns the configured prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Tokenizes a message body.
    ///
    /// Returns `None` when the body does not start with the prefix or when nothing
    /// but whitespace follows it. Such messages are not commands and must be
    /// ignored silently.
    ///
    /// # Examples
    ///
    /// ```
    /// # use chatcmd::commands::{OptionValue, Tokenizer};
    /// let tokenizer = Tokenizer::new("!");
    /// let invocation = tokenizer.tokenize("!greet hello --option world").unwrap();
    /// assert_eq!(invocation.name, "greet");
    /// assert_eq!(invocation.positionals, ["hello"]);
    /// assert_eq!(
    ///     invocation.options.get("option"),
    ///     Some(&OptionValue::Value("world".to_string()))
    /// );
    ///
    /// assert!(tokenizer.tokenize("hello there").is_none());
    /// ```
    pub fn tokenize(&self, body: &str) -> Option<RawInvocation> {
        let rest = body.strip_prefix(self.prefix.as_str())?;
        let mut tokens = rest.split_whitespace().peekable();
        let name = tokens.next()?.to_owned();

        let mut positionals = VecDeque::new();
        let mut options = HashMap::new();
        let mut options_ended = false;

        while let Some(token) = tokens.next() {
            if options_ended {
                positionals.push_back(token.to_owned());
                continue;
            }
            if token == "--" {
                options_ended = true;
                continue;
            }

            let Some(option) = option_name(token) else {
                positionals.push_back(token.to_owned());
                continue;
            };

            // --name=value carries its value inline
            if let Some((key, value)) = option.split_once('=')
                && token.starts_with("--")
            {
                options.insert(key.to_owned(), OptionValue::Value(value.to_owned()));
                continue;
            }

            let value = match tokens.peek() {
                Some(next) if *next != "--" && option_name(next).is_none() => {
                    OptionValue::Value(tokens.next().unwrap_or_default().to_owned())
                }
                _ => OptionValue::Flag,
            };
            options.insert(option.to_owned(), value);
        }

        let invocation = RawInvocation {
            name,
            positionals,
            options,
        };
        debug!("tokenized invocation: {:?}", invocation);

        Some(invocation)
    }
}

/// Returns the option name carried by `token`, if the token is an option.
fn option_name(token: &str) -> Option<&str> {
    if let Some(long) = token.strip_prefix("--") {
        return (!long.is_empty()).then_some(long);
    }

    let short = token.strip_prefix('-')?;
    let first = short.chars().next()?;
    // negative numbers, including `-inf` and `-NaN`, are values
    if first.is_ascii_digit() || first == '.' || short.parse::<f64>().is_ok() {
        return None;
    }

    Some(short)
}
