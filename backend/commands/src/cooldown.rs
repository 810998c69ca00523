//! Per (command, entity) cooldown records.
//!
//! The check and the reservation happen under one lock, so two concurrent
//! invocations of the same command by the same entity cannot both pass. A
//! reservation is a [`CooldownPermit`]: committing it stamps the record,
//! dropping it releases the key without touching the timestamp. A key that is
//! still reserved is rejected as [`CooldownRejection::InFlight`], separately
//! from an ordinary wait.
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use argot_core::EntityId;
use tokio::time::Instant;
use tracing::debug;

type Key = (String, EntityId);

#[derive(Debug, Default)]
struct Record {
    last: Option<Instant>,
    in_flight: bool,
}

/// Why [`CooldownStore::try_acquire`] refused a reservation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownRejection {
    /// The last use is too recent; carries the time left.
    Waiting(Duration),
    /// Another invocation holds the key and has not finished yet.
    InFlight,
}

#[derive(Debug, Clone, Default)]
pub struct CooldownStore {
    records: Arc<Mutex<HashMap<Key, Record>>>,
}

impl CooldownStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<Key, Record>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Reserve the key for one invocation.
    pub fn try_acquire(
        &self,
        command: &str,
        entity: EntityId,
        cooldown: Duration,
    ) -> Result<CooldownPermit, CooldownRejection> {
        let now = Instant::now();
        let key = (command.to_string(), entity);
        let mut records = self.lock();
        let record = records.entry(key.clone()).or_default();

        if record.in_flight {
            return Err(CooldownRejection::InFlight);
        }
        if let Some(last) = record.last {
            let elapsed = now.saturating_duration_since(last);
            if elapsed < cooldown {
                return Err(CooldownRejection::Waiting(cooldown - elapsed));
            }
        }
        record.in_flight = true;

        Ok(CooldownPermit { store: self.clone(), key: Some(key) })
    }

    /// Time left before `entity` may run `command` again.
    pub fn remaining(&self, command: &str, entity: EntityId, cooldown: Duration) -> Option<Duration> {
        let records = self.lock();
        let last = records.get(&(command.to_string(), entity))?.last?;
        cooldown.checked_sub(Instant::now().saturating_duration_since(last)).filter(|d| !d.is_zero())
    }

    /// Drop idle records whose last use is at least `older_than` ago. Returns
    /// how many were removed.
    pub fn purge_idle(&self, older_than: Duration) -> usize {
        let now = Instant::now();
        let mut records = self.lock();
        let before = records.len();
        records.retain(|_, record| {
            record.in_flight
                || record.last.is_some_and(|last| now.saturating_duration_since(last) < older_than)
        });
        let removed = before - records.len();
        if removed > 0 {
            debug!(removed, "purged idle cooldown records");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn release(&self, key: &Key, commit: bool) {
        let mut records = self.lock();
        let Some(record) = records.get_mut(key) else {
            return;
        };
        record.in_flight = false;
        if commit {
            record.last = Some(Instant::now());
        } else if record.last.is_none() {
            records.remove(key);
        }
    }
}

/// A held cooldown reservation.
#[derive(Debug)]
#[must_use = "dropping a permit releases it without starting the cooldown"]
pub struct CooldownPermit {
    store: CooldownStore,
    key: Option<Key>,
}

impl CooldownPermit {
    /// Start the cooldown from now.
    pub fn commit(mut self) {
        if let Some(key) = self.key.take() {
            self.store.release(&key, true);
        }
    }
}

impl Drop for CooldownPermit {
    fn drop(&mut self) {
        if let Some(key) = self.key.take() {
            self.store.release(&key, false);
        }
    }
}
