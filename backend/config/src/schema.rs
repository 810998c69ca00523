//! Argot runtime configuration schema.
//!
//! Every field is optional on disk; [`crate::defaults::apply_all_defaults`]
//! fills the gaps after loading. The accessors fall back to the same defaults
//! so a config that skipped that step still behaves.

use argot_core::{EntityId, PermissionLevel};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::time::Duration;

use crate::defaults::{
    DEFAULT_CONFIRMATION_TIMEOUT_SECS, DEFAULT_CONFIRMATION_TOKEN, DEFAULT_FALSY,
    DEFAULT_LINK_TIMEOUT_SECS, DEFAULT_LOG_DIR, DEFAULT_LOG_LEVEL, DEFAULT_PREFIX,
    DEFAULT_PRIVILEGED_LEVEL, DEFAULT_REPLY_TIMEOUT_SECS, DEFAULT_TRUTHY, DEFAULT_USER_AGENT,
};
use crate::validation::ConfigValidationError;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArgotConfig {
    /// Prefix, confirmation token and timeouts
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub commands: Option<CommandsConfig>,

    /// Word lists for the boolean resolver
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resolvers: Option<ResolversConfig>,

    /// Privilege threshold, per-entity overrides and bans
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<PermissionsConfig>,

    /// Image link probing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub links: Option<LinksConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

impl ArgotConfig {
    pub fn commands(&self) -> CommandsConfig {
        self.commands.clone().unwrap_or_default()
    }

    pub fn resolvers(&self) -> ResolversConfig {
        self.resolvers.clone().unwrap_or_default()
    }

    pub fn permissions(&self) -> PermissionsConfig {
        self.permissions.clone().unwrap_or_default()
    }

    pub fn links(&self) -> LinksConfig {
        self.links.clone().unwrap_or_default()
    }

    pub fn logging(&self) -> LoggingConfig {
        self.logging.clone().unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Commands
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confirmation_timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_timeout_secs: Option<u64>,
}

impl CommandsConfig {
    pub fn prefix(&self) -> &str {
        self.prefix.as_deref().unwrap_or(DEFAULT_PREFIX)
    }

    pub fn confirmation_token(&self) -> &str {
        self.confirmation_token.as_deref().unwrap_or(DEFAULT_CONFIRMATION_TOKEN)
    }

    pub fn confirmation_timeout(&self) -> Duration {
        Duration::from_secs(self.confirmation_timeout_secs.unwrap_or(DEFAULT_CONFIRMATION_TIMEOUT_SECS))
    }

    pub fn reply_timeout(&self) -> Duration {
        Duration::from_secs(self.reply_timeout_secs.unwrap_or(DEFAULT_REPLY_TIMEOUT_SECS))
    }
}

// ---------------------------------------------------------------------------
// Resolvers
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BooleanMode {
    /// Anything outside the truthy list is false.
    #[default]
    Lenient,
    /// Only the listed words are accepted.
    Strict,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolversConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truthy: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub falsy: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub boolean_mode: Option<BooleanMode>,
}

impl ResolversConfig {
    pub fn truthy(&self) -> Vec<String> {
        self.truthy
            .clone()
            .unwrap_or_else(|| DEFAULT_TRUTHY.iter().map(|w| w.to_string()).collect())
    }

    pub fn falsy(&self) -> Vec<String> {
        self.falsy
            .clone()
            .unwrap_or_else(|| DEFAULT_FALSY.iter().map(|w| w.to_string()).collect())
    }

    pub fn is_strict(&self) -> bool {
        self.boolean_mode.unwrap_or_default() == BooleanMode::Strict
    }
}

// ---------------------------------------------------------------------------
// Permissions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionsConfig {
    /// Level name at which visibility restrictions are waived (`mod`, `admin`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privileged_level: Option<String>,

    /// Entity id → level name.
    #[serde(default)]
    pub overrides: HashMap<String, String>,

    #[serde(default)]
    pub banned: Vec<u64>,
}

impl PermissionsConfig {
    pub fn privileged_level(&self) -> Result<PermissionLevel, ConfigValidationError> {
        let raw = self.privileged_level.as_deref().unwrap_or(DEFAULT_PRIVILEGED_LEVEL);
        raw.parse()
            .map_err(|message| ConfigValidationError::new("permissions.privilegedLevel", message))
    }

    pub fn overrides(&self) -> Result<HashMap<EntityId, PermissionLevel>, ConfigValidationError> {
        let mut parsed = HashMap::with_capacity(self.overrides.len());
        for (id, level) in &self.overrides {
            let path = format!("permissions.overrides.{id}");
            let entity = id
                .trim()
                .parse::<u64>()
                .map_err(|_| ConfigValidationError::new(&path, "Entity id must be a number"))?;
            let level = level
                .parse::<PermissionLevel>()
                .map_err(|message| ConfigValidationError::new(&path, message))?;
            parsed.insert(EntityId(entity), level);
        }
        Ok(parsed)
    }

    pub fn banned(&self) -> HashSet<EntityId> {
        self.banned.iter().copied().map(EntityId).collect()
    }
}

// ---------------------------------------------------------------------------
// Links
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinksConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
}

impl LinksConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.unwrap_or(DEFAULT_LINK_TIMEOUT_SECS))
    }

    pub fn user_agent(&self) -> &str {
        self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT)
    }
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

impl LoggingConfig {
    pub fn level(&self) -> &str {
        self.level.as_deref().unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn dir(&self) -> &str {
        self.dir.as_deref().unwrap_or(DEFAULT_LOG_DIR)
    }
}
