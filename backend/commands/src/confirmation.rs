//! Pending confirmations for destructive commands.
//!
//! A record is keyed by (command, entity, channel) and expires lazily: it is
//! only ever compared against the clock when someone looks at it. The sweep in
//! [`ConfirmationStore::purge_expired`] exists to bound memory, not for
//! correctness.
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use argot_core::{ChannelId, EntityId};
use tokio::time::Instant;
use tracing::debug;

type Key = (String, EntityId, ChannelId);

#[derive(Debug, Clone)]
pub struct PendingConfirmation {
    pub created_at: Instant,
}

#[derive(Debug)]
pub struct ConfirmationStore {
    timeout: Duration,
    pending: Mutex<HashMap<Key, PendingConfirmation>>,
}

impl ConfirmationStore {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout, pending: Mutex::new(HashMap::new()) }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Key, PendingConfirmation>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_live(&self, record: &PendingConfirmation, now: Instant) -> bool {
        now.saturating_duration_since(record.created_at) < self.timeout
    }

    /// Open (or restart) the confirmation window.
    pub fn begin(&self, command: &str, entity: EntityId, channel: ChannelId) {
        let record = PendingConfirmation { created_at: Instant::now() };
        self.lock().insert((command.to_string(), entity, channel), record);
    }

    /// Consume the pending record. `None` when there is none or it has
    /// expired; an expired record is removed either way.
    pub fn redeem(&self, command: &str, entity: EntityId, channel: ChannelId) -> Option<PendingConfirmation> {
        let now = Instant::now();
        let record = self.lock().remove(&(command.to_string(), entity, channel))?;
        self.is_live(&record, now).then_some(record)
    }

    pub fn is_pending(&self, command: &str, entity: EntityId, channel: ChannelId) -> bool {
        let now = Instant::now();
        self.lock()
            .get(&(command.to_string(), entity, channel))
            .is_some_and(|record| self.is_live(record, now))
    }

    /// Remove every expired record. Returns how many were dropped.
    pub fn purge_expired(&self) -> usize {
        let now = Instant::now();
        let mut pending = self.lock();
        let before = pending.len();
        pending.retain(|_, record| self.is_live(record, now));
        let removed = before - pending.len();
        if removed > 0 {
            debug!(removed, "purged expired confirmations");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
