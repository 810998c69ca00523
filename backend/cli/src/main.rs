mod console;
mod demo;
mod pattern_cmd;
mod terminal_output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use argot_commands::{
    register_builtins, BooleanPolicy, CommandDispatcher, CommandRegistry, ConfirmationStore, CooldownStore,
    DispatcherParts, GateSettings, Invocation, ReplyWaiter,
};
use argot_config::ArgotConfig;
use argot_core::testing::MemoryTeams;
use argot_core::{ChannelId, EntityId, PermissionLevel, ScopeId};
use argot_media::HttpImageProbe;
use argot_security::PermissionPolicy;

#[derive(Parser)]
#[command(name = "argot")]
#[command(about = "Argot: command argument resolution and dispatch for chat bots")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Chat with the demo command set from stdin
    Console {
        /// Config file (defaults to config.yaml in the config directory)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Entity id to speak as
        #[arg(long = "as", default_value_t = 1)]
        entity: u64,
        /// Permission level reported for the speaker
        #[arg(short, long, default_value = "player")]
        level: PermissionLevel,
    },
    /// Decode a pattern and show its slots, arity and usage
    Pattern {
        pattern: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Console { config, entity, level } => {
            let path = config.unwrap_or_else(|| argot_config::config_file_path(&argot_config::config_dir()));
            let config = argot_config::load_and_prepare(&path)
                .await
                .with_context(|| format!("loading {}", path.display()))?;

            let logging = config.logging();
            if !argot_logging::init_logger(logging.dir(), logging.level()) {
                warn!("a tracing subscriber was already installed");
            }
            info!(path = %path.display(), "Starting Argot console");

            let dispatcher = build_dispatcher(&config)?;
            let speaker = Invocation {
                author: EntityId(entity),
                scope: ScopeId(1),
                channel: ChannelId(1),
                permission: level,
                entities: Arc::new(demo::demo_entities()),
            };
            console::run(Arc::new(dispatcher), speaker).await?;
        }
        Commands::Pattern { pattern } => {
            if pattern_cmd::run(&pattern).is_err() {
                std::process::exit(2);
            }
        }
    }

    Ok(())
}

/// Every store and capability the gate needs, built once from config.
fn build_dispatcher(config: &ArgotConfig) -> Result<CommandDispatcher> {
    let commands = config.commands();
    let resolvers = config.resolvers();
    let permissions = config.permissions();
    let links = config.links();

    let mut registry = CommandRegistry::new();
    register_builtins(&mut registry)?;
    demo::register_demo(&mut registry, Arc::new(demo::DemoState::default()))?;

    let policy = PermissionPolicy {
        privileged_level: permissions.privileged_level()?,
        overrides: permissions.overrides()?,
        banned: permissions.banned(),
    };

    let teams = MemoryTeams::new()
        .with_team("red", "Red Team")
        .with_team("blue", "Blue Team");

    let parts = DispatcherParts {
        registry: Arc::new(registry),
        policy,
        cooldowns: CooldownStore::new(),
        confirmations: Arc::new(ConfirmationStore::new(commands.confirmation_timeout())),
        replies: Arc::new(ReplyWaiter::new()),
        teams: Arc::new(teams),
        links: Arc::new(HttpImageProbe::new(links.timeout(), links.user_agent())?),
        booleans: BooleanPolicy::new(resolvers.truthy(), resolvers.falsy(), resolvers.is_strict()),
        settings: GateSettings {
            prefix: commands.prefix().to_string(),
            confirmation_token: commands.confirmation_token().to_string(),
            reply_timeout: commands.reply_timeout(),
        },
    };
    info!(commands = parts.registry.len(), prefix = %parts.settings.prefix, "dispatcher ready");
    Ok(CommandDispatcher::new(parts))
}
