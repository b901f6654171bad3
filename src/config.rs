//! Configuration loading.
//!
//! The configuration is read from a YAML file, then overridden by environment
//! variables prefixed with `CHATCMD_`. Nested keys are separated by `__`.
//!
//! # Configuration File Format
//!
//! ```yaml
//! # Prefix every command starts with
//! prefix: "!"
//!
//! # Ignore messages written by bots
//! ignore_bots: true
//!
//! # Reply to the author when an argument cannot be converted
//! reply_on_conversion_error: true
//!
//! # Message of the day sent by the `motd` command
//! motd: "Welcome aboard"
//!
//! # Entities known to the in-memory platform
//! directory:
//!   users:
//!     - { id: 1, name: alice }
//!     - { id: 2, name: marvin, bot: true }
//!   guilds:
//!     - id: 100
//!       name: mars
//!       members:
//!         - { user_id: 1, nickname: Ally, roles: [300] }
//!       channels:
//!         - { id: 200, name: general }
//!       roles:
//!         - { id: 300, name: administrator }
//! ```
//!
//! # Environment Variable Overrides
//!
//! ```bash
//! export CHATCMD_PREFIX="?"
//! export CHATCMD_IGNORE_BOTS=false
//! export CHATCMD_MOTD="Maintenance tonight"
//! ```

use anyhow::bail;
use figment::{
    Figment,
    providers::{Env, Format, Yaml},
};
use log::debug;
use serde::Deserialize;
use std::path::Path;

use crate::platform::Directory;

/// Prefix of the environment variables overriding the file.
pub const ENV_PREFIX: &str = "CHATCMD_";

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Prefix every command starts with
    #[serde(default = "default_prefix")]
    pub prefix: String,

    /// Whether messages written by bots are ignored
    #[serde(default = "default_true")]
    pub ignore_bots: bool,

    /// Whether conversion errors are answered in the chat, or only logged
    #[serde(default = "default_true")]
    pub reply_on_conversion_error: bool,

    /// Message of the day
    #[serde(default)]
    pub motd: Option<String>,

    /// Entities served by the in-memory platform
    #[serde(default)]
    pub directory: Directory,
}

fn default_prefix() -> String {
    "!".to_owned()
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Loads the configuration from `path`, with environment overrides.
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read or parsed, when a value has the wrong
    /// type, or when the prefix is empty.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Config> {
        let path = path.as_ref();
        debug!("loading configuration from {}", path.display());

        let config: Config = Figment::new()
            .merge(Yaml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
            .extract()?;

        if config.prefix.trim().is_empty() {
            bail!("the command prefix cannot be empty");
        }

        Ok(config)
    }
}
