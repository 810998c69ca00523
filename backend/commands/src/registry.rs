//! Command registry: descriptors and their handlers, looked up by name or
//! alias.
//!
//! Names and aliases share one case-insensitive namespace; registration
//! rejects any collision, so lookups are unambiguous for the life of the
//! process.
use std::collections::HashMap;
use std::sync::Arc;

use argot_core::PermissionLevel;
use thiserror::Error;
use tracing::debug;

use crate::dispatch::CommandHandler;
use crate::pattern::PatternError;
use crate::types::CommandDescriptor;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegistryError {
    #[error("`{name}` is already registered by command `{existing}`")]
    NameCollision { name: String, existing: String },

    #[error("command names and aliases must be non-empty and contain no whitespace (got `{0}`)")]
    InvalidName(String),

    #[error("invalid pattern: {0}")]
    Pattern(#[from] PatternError),
}

/// A registered command.
#[derive(Clone)]
pub struct RegisteredCommand {
    pub descriptor: Arc<CommandDescriptor>,
    pub handler: Arc<dyn CommandHandler>,
}

impl std::fmt::Debug for RegisteredCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegisteredCommand").field("descriptor", &self.descriptor).finish_non_exhaustive()
    }
}

#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: Vec<RegisteredCommand>,
    /// Lowercase name or alias → index into `commands`.
    index: HashMap<String, usize>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(
        &mut self,
        descriptor: CommandDescriptor,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<(), RegistryError> {
        let mut names: Vec<String> = Vec::new();
        for name in descriptor.names() {
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(RegistryError::InvalidName(name.to_string()));
            }
            let lower = name.to_lowercase();
            if let Some(&existing) = self.index.get(&lower) {
                return Err(RegistryError::NameCollision {
                    name: lower,
                    existing: self.commands[existing].descriptor.name.clone(),
                });
            }
            if names.contains(&lower) {
                return Err(RegistryError::NameCollision { name: lower, existing: descriptor.name.clone() });
            }
            names.push(lower);
        }

        let slot = self.commands.len();
        for name in names {
            self.index.insert(name, slot);
        }
        debug!(command = %descriptor.name, aliases = ?descriptor.aliases, "registered command");
        self.commands.push(RegisteredCommand { descriptor: Arc::new(descriptor), handler });
        Ok(())
    }

    /// Find a command by name or alias, case-insensitively.
    pub fn find(&self, name: &str) -> Option<&RegisteredCommand> {
        let slot = *self.index.get(&name.to_lowercase())?;
        self.commands.get(slot)
    }

    pub fn all(&self) -> &[RegisteredCommand] {
        &self.commands
    }

    /// Non-hidden commands an invoker at `level` may run, in registration order.
    pub fn visible_to(&self, level: PermissionLevel) -> impl Iterator<Item = &CommandDescriptor> {
        self.commands
            .iter()
            .map(|c| c.descriptor.as_ref())
            .filter(move |d| !d.hidden && level >= d.permission)
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::{CommandContext, CommandResponse};
    use crate::types::CommandInvocation;
    use async_trait::async_trait;

    struct Noop;

    #[async_trait]
    impl CommandHandler for Noop {
        async fn handle(&self, _ctx: &CommandContext, _inv: &CommandInvocation) -> anyhow::Result<CommandResponse> {
            Ok(CommandResponse::ok(""))
        }
    }

    fn registry() -> CommandRegistry {
        let mut registry = CommandRegistry::new();
        registry.register(CommandDescriptor::new("blackjack").alias("bj"), Arc::new(Noop)).unwrap();
        registry
            .register(CommandDescriptor::new("ban").permission(PermissionLevel::Mod), Arc::new(Noop))
            .unwrap();
        registry.register(CommandDescriptor::new("secret").hidden(), Arc::new(Noop)).unwrap();
        registry
    }

    #[test]
    fn finds_by_name_or_alias_any_case() {
        let registry = registry();
        assert_eq!(registry.find("BJ").unwrap().descriptor.name, "blackjack");
        assert_eq!(registry.find("BlackJack").unwrap().descriptor.name, "blackjack");
        assert!(registry.find("poker").is_none());
    }

    #[test]
    fn rejects_collisions() {
        let mut registry = registry();
        let err = registry.register(CommandDescriptor::new("cards").alias("BJ"), Arc::new(Noop)).unwrap_err();
        assert_eq!(err, RegistryError::NameCollision { name: "bj".into(), existing: "blackjack".into() });
        // Failed registration leaves nothing behind.
        assert!(registry.find("cards").is_none());
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn rejects_self_collision() {
        let mut registry = CommandRegistry::new();
        let err = registry.register(CommandDescriptor::new("x").alias("X"), Arc::new(Noop)).unwrap_err();
        assert!(matches!(err, RegistryError::NameCollision { .. }));
    }

    #[test]
    fn rejects_blank_names() {
        let mut registry = CommandRegistry::new();
        assert_eq!(
            registry.register(CommandDescriptor::new(""), Arc::new(Noop)).unwrap_err(),
            RegistryError::InvalidName(String::new())
        );
        assert!(registry.register(CommandDescriptor::new("two words"), Arc::new(Noop)).is_err());
    }

    #[test]
    fn visibility_follows_level_and_hidden_flag() {
        let registry = registry();
        let names: Vec<_> = registry.visible_to(PermissionLevel::Player).map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["blackjack"]);
        let names: Vec<_> = registry.visible_to(PermissionLevel::Admin).map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["blackjack", "ban"]);
    }
}
