//! In-memory capability doubles for tests and the console demo.

use std::collections::{HashMap, HashSet};
use std::sync::RwLock;

use async_trait::async_trait;

use crate::traits::{EntityDirectory, LinkProbe, TeamDirectory};
use crate::types::{EntityId, EntityRef, TeamRef};

/// Entities kept in a map. An entity is active for every viewer unless it was
/// added with [`MemoryEntities::insert_inactive`].
#[derive(Debug, Default)]
pub struct MemoryEntities {
    names: RwLock<HashMap<EntityId, String>>,
    inactive: RwLock<HashSet<EntityId>>,
}

impl MemoryEntities {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, id: u64, name: impl Into<String>) -> &Self {
        self.names
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(EntityId(id), name.into());
        self
    }

    pub fn insert_inactive(&self, id: u64, name: impl Into<String>) -> &Self {
        self.insert(id, name);
        self.inactive
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(EntityId(id));
        self
    }
}

#[async_trait]
impl EntityDirectory for MemoryEntities {
    async fn find_entity(&self, id: EntityId, _viewer: EntityId) -> Option<EntityRef> {
        let names = self.names.read().unwrap_or_else(|e| e.into_inner());
        let name = names.get(&id)?.clone();
        let active = !self
            .inactive
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .contains(&id);
        Some(EntityRef { id, name, active })
    }
}

/// Teams keyed by lowercase name.
#[derive(Debug, Default)]
pub struct MemoryTeams {
    teams: HashMap<String, TeamRef>,
}

impl MemoryTeams {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_team(mut self, id: impl Into<String>, name: impl Into<String>) -> Self {
        let name = name.into();
        self.teams.insert(
            name.to_lowercase(),
            TeamRef { id: id.into(), name },
        );
        self
    }
}

impl TeamDirectory for MemoryTeams {
    fn find_team(&self, name: &str) -> Option<TeamRef> {
        self.teams.get(name).cloned()
    }
}

/// Probe answering from a fixed allow-list of image URLs.
#[derive(Debug, Default)]
pub struct FixedLinkProbe {
    images: HashSet<String>,
}

impl FixedLinkProbe {
    pub fn new<I, S>(images: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self { images: images.into_iter().map(Into::into).collect() }
    }
}

#[async_trait]
impl LinkProbe for FixedLinkProbe {
    async fn is_image(&self, url: &str) -> bool {
        self.images.contains(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_entities_report_activity() {
        let entities = MemoryEntities::new();
        entities.insert(1, "Alice").insert_inactive(2, "Bob");

        let alice = entities.find_entity(EntityId(1), EntityId(9)).await.unwrap();
        assert!(alice.active);
        let bob = entities.find_entity(EntityId(2), EntityId(9)).await.unwrap();
        assert!(!bob.active);
        assert!(entities.find_entity(EntityId(3), EntityId(9)).await.is_none());
    }

    #[test]
    fn memory_teams_are_keyed_lowercase() {
        let teams = MemoryTeams::new().with_team("t1", "Red Bananas");
        assert_eq!(teams.find_team("red bananas").unwrap().id, "t1");
        assert!(teams.find_team("Red Bananas").is_none());
    }
}
