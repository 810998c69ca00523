//! Config defaults: fills every unset field of a freshly loaded config.

use crate::schema::{
    ArgotConfig, CommandsConfig, LinksConfig, LoggingConfig, PermissionsConfig, ResolversConfig,
};

pub const DEFAULT_PREFIX: &str = "!";
pub const DEFAULT_CONFIRMATION_TOKEN: &str = "cnf";
pub const DEFAULT_CONFIRMATION_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_REPLY_TIMEOUT_SECS: u64 = 120;

pub const DEFAULT_TRUTHY: [&str; 6] = ["yes", "y", "true", "t", "on", "1"];
pub const DEFAULT_FALSY: [&str; 6] = ["no", "n", "false", "f", "off", "0"];

pub const DEFAULT_PRIVILEGED_LEVEL: &str = "mod";

pub const DEFAULT_LINK_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_USER_AGENT: &str = concat!("argot/", env!("CARGO_PKG_VERSION"));

pub const DEFAULT_LOG_LEVEL: &str = "info";
pub const DEFAULT_LOG_DIR: &str = "logs";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: ArgotConfig) -> ArgotConfig {
    let config = apply_command_defaults(config);
    let config = apply_resolver_defaults(config);
    let config = apply_permission_defaults(config);
    let config = apply_link_defaults(config);
    apply_logging_defaults(config)
}

fn apply_command_defaults(mut config: ArgotConfig) -> ArgotConfig {
    let commands = config.commands.get_or_insert_with(CommandsConfig::default);
    commands.prefix.get_or_insert_with(|| DEFAULT_PREFIX.to_string());
    commands.confirmation_token.get_or_insert_with(|| DEFAULT_CONFIRMATION_TOKEN.to_string());
    commands.confirmation_timeout_secs.get_or_insert(DEFAULT_CONFIRMATION_TIMEOUT_SECS);
    commands.reply_timeout_secs.get_or_insert(DEFAULT_REPLY_TIMEOUT_SECS);
    config
}

fn apply_resolver_defaults(mut config: ArgotConfig) -> ArgotConfig {
    let resolvers = config.resolvers.get_or_insert_with(ResolversConfig::default);
    resolvers
        .truthy
        .get_or_insert_with(|| DEFAULT_TRUTHY.iter().map(|w| w.to_string()).collect());
    resolvers
        .falsy
        .get_or_insert_with(|| DEFAULT_FALSY.iter().map(|w| w.to_string()).collect());
    resolvers.boolean_mode.get_or_insert_with(Default::default);
    config
}

fn apply_permission_defaults(mut config: ArgotConfig) -> ArgotConfig {
    let permissions = config.permissions.get_or_insert_with(PermissionsConfig::default);
    permissions
        .privileged_level
        .get_or_insert_with(|| DEFAULT_PRIVILEGED_LEVEL.to_string());
    config
}

fn apply_link_defaults(mut config: ArgotConfig) -> ArgotConfig {
    let links = config.links.get_or_insert_with(LinksConfig::default);
    links.timeout_secs.get_or_insert(DEFAULT_LINK_TIMEOUT_SECS);
    links.user_agent.get_or_insert_with(|| DEFAULT_USER_AGENT.to_string());
    config
}

fn apply_logging_defaults(mut config: ArgotConfig) -> ArgotConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    logging.level.get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    logging.dir.get_or_insert_with(|| DEFAULT_LOG_DIR.to_string());
    config
}
