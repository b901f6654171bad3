//! chatcmd - replay chat messages through the command dispatcher.
//!
//! This binary wires the command layer to the in-memory platform: entities come
//! from the `directory` section of the configuration and outbound messages are
//! written to the log as JSON. It dispatches the messages given on the command
//! line concurrently, logs how each dispatch ended and exits.
//!
//! # Configuration
//!
//! Create a `config.yaml` file (see the [`config`](chatcmd::config) module for
//! every key):
//!
//! ```yaml
//! prefix: "!"
//! motd: "Welcome aboard"
//! directory:
//!   users:
//!     - { id: 1, name: alice }
//!   guilds:
//!     - id: 100
//!       name: mars
//!       members:
//!         - { user_id: 1, roles: [300] }
//!       channels:
//!         - { id: 200, name: general }
//!       roles:
//!         - { id: 300, name: administrator }
//! ```
//!
//! # Usage
//!
//! ```bash
//! chatcmd --config config.yaml --guild 100 --author 1 \
//!     --message '!greet world -o hi' \
//!     --message '!role 300' \
//!     --message '!calc five'
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG` - Controls logging level (default: `info`)
//! - `CHATCMD_*` - Override configuration keys, e.g. `CHATCMD_PREFIX="?"`

use clap::Parser;
use env_logger::Env;
use futures::future::join_all;
use log::{error, info, warn};
use std::sync::Arc;

use chatcmd::{
    commands::{DispatchOutcome, Dispatcher, LogErrorNotifier, ReplyErrorNotifier, actions},
    config::Config,
    platform::{ConsoleSink, Directory, DirectoryPermissions, InvokingMessage, User},
};

/// Command-line arguments.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the YAML configuration file.
    #[arg(short, long)]
    config: String,

    /// Text of a message to dispatch. Repeat to dispatch several messages.
    #[arg(short, long = "message", required = true)]
    messages: Vec<String>,

    /// Guild the messages are posted in. Omit for a direct conversation.
    #[arg(short, long)]
    guild: Option<u64>,

    /// Channel the messages are posted in.
    #[arg(long, default_value_t = 1)]
    channel: u64,

    /// Identifier of the author, looked up in the directory.
    #[arg(short, long)]
    author: u64,
}

/// Builds the invoking messages described by the arguments.
fn invoking_messages(args: &Args, directory: &Directory) -> Vec<InvokingMessage> {
    let author = directory.user(args.author).cloned().unwrap_or_else(|| {
        warn!("author {} is not in the directory", args.author);
        User {
            id: args.author,
            name: format!("user-{}", args.author),
            bot: false,
        }
    });

    args.messages
        .iter()
        .enumerate()
        .map(|(index, content)| InvokingMessage {
            id: index as u64 + 1,
            channel_id: args.channel,
            guild_id: args.guild,
            author: author.clone(),
            content: content.clone(),
        })
        .collect()
}

#[tokio::main]
async fn main() {
    // Put logger at info level by default
    let env = Env::default().filter_or("RUST_LOG", "info");
    env_logger::init_from_env(env);

    info!("Starting chatcmd {}...", env!("CARGO_PKG_VERSION"));

    let args = Args::parse();

    let config = match Config::load(&args.config) {
        Ok(config) => config,
        Err(e) => {
            error!("Failed to load config file: {:#}", e);
            return;
        }
    };

    let registry = match actions::registry() {
        Ok(registry) => registry,
        Err(e) => {
            error!("Failed to register commands: {}", e);
            return;
        }
    };
    let services = actions::services(&registry, &config.prefix, config.motd.clone());

    let directory = Arc::new(config.directory.clone());
    let sink = Arc::new(ConsoleSink::new(1000));
    let mut builder = Dispatcher::builder(registry, directory.clone(), sink.clone())
        .prefix(config.prefix.clone())
        .services(services)
        .permissions(Arc::new(DirectoryPermissions::new(directory.clone())))
        .ignore_bots(config.ignore_bots);
    builder = match config.reply_on_conversion_error {
        true => builder.notifier(Arc::new(ReplyErrorNotifier::new(sink))),
        false => builder.notifier(Arc::new(LogErrorNotifier)),
    };
    let dispatcher = builder.build();
    info!("{} commands registered", dispatcher.registry().len());

    let messages = invoking_messages(&args, &directory);
    let outcomes = join_all(
        messages
            .iter()
            .map(|message| dispatcher.dispatch(&message.content, message)),
    )
    .await;

    for (message, outcome) in messages.iter().zip(outcomes) {
        match outcome {
            Ok(DispatchOutcome::Completed { command, .. }) => {
                info!("message {}: `{}` completed", message.id, command)
            }
            Ok(outcome) => info!("message {}: {:?}", message.id, outcome),
            Err(e) => error!("message {}: dispatch failed: {:#}", message.id, e),
        }
    }
}
