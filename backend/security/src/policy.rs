/// Permission policy: who may run a command, and who counts as privileged.
///
/// The transport reports a level for every invoker. The policy can override
/// that level for specific entities (configuration replaces hard-coded
/// identity bypasses) and keeps a ban list that trumps everything.
use std::collections::{HashMap, HashSet};

use argot_core::{EntityId, PermissionLevel};
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct PermissionPolicy {
    /// Level at which entity-visibility restrictions are waived.
    pub privileged_level: PermissionLevel,
    pub overrides: HashMap<EntityId, PermissionLevel>,
    pub banned: HashSet<EntityId>,
}

impl Default for PermissionPolicy {
    fn default() -> Self {
        Self {
            privileged_level: PermissionLevel::Mod,
            overrides: HashMap::new(),
            banned: HashSet::new(),
        }
    }
}

impl PermissionPolicy {
    pub fn new(privileged_level: PermissionLevel) -> Self {
        Self { privileged_level, ..Default::default() }
    }

    /// The level the pipeline actually uses for `entity`.
    pub fn effective_level(&self, entity: EntityId, reported: PermissionLevel) -> PermissionLevel {
        if self.banned.contains(&entity) {
            return PermissionLevel::Banned;
        }
        self.overrides.get(&entity).copied().unwrap_or(reported)
    }

    /// Returns `true` if `entity` meets `floor`. A banned entity never does.
    pub fn permits(&self, entity: EntityId, reported: PermissionLevel, floor: PermissionLevel) -> bool {
        let level = self.effective_level(entity, reported);
        if level == PermissionLevel::Banned {
            warn!(entity = %entity, "banned entity attempted a command");
            return false;
        }
        level >= floor
    }

    pub fn is_privileged(&self, entity: EntityId, reported: PermissionLevel) -> bool {
        self.effective_level(entity, reported) >= self.privileged_level
    }

    pub fn ban(&mut self, entity: EntityId) {
        info!(entity = %entity, "entity banned");
        self.banned.insert(entity);
    }

    pub fn unban(&mut self, entity: EntityId) -> bool {
        self.banned.remove(&entity)
    }

    /// Pin `entity` to `level` regardless of what the transport reports.
    pub fn grant(&mut self, entity: EntityId, level: PermissionLevel) {
        self.overrides.insert(entity, level);
    }
}
