use async_trait::async_trait;

use crate::types::{EntityId, EntityRef, TeamRef};

/// Read-only lookup of participants, supplied per invocation by the host.
///
/// Implementations must not mutate entity records as a side effect of a
/// lookup; the resolver may call this any number of times per command.
#[async_trait]
pub trait EntityDirectory: Send + Sync {
    /// Find an entity by id, computing `active` relative to `viewer`.
    async fn find_entity(&self, id: EntityId, viewer: EntityId) -> Option<EntityRef>;
}

/// Case-insensitive name → team mapping.
pub trait TeamDirectory: Send + Sync {
    /// `name` is already lowercased by the caller.
    fn find_team(&self, name: &str) -> Option<TeamRef>;
}

/// Content probe used by the Link resolver.
///
/// This is the only capability the pipeline calls that may block on the
/// network. It carries no timeout of its own beyond what the implementation
/// configures on its client.
#[async_trait]
pub trait LinkProbe: Send + Sync {
    /// Returns `true` when `url` resolves to an image.
    async fn is_image(&self, url: &str) -> bool;
}
