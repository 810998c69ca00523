//! Waiting for the next message from a user.
//!
//! A handler that needs a follow-up answer ("hit or stand?") parks on
//! [`ReplyWaiter::wait_for`]. The transport offers every non-command message
//! to [`ReplyWaiter::offer`] before doing anything else with it; a message that
//! completes a wait is consumed.
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use argot_core::{ChannelId, EntityId};
use tokio::sync::oneshot;
use tracing::debug;

type Key = (EntityId, ChannelId);

struct Waiter {
    generation: u64,
    reply: oneshot::Sender<String>,
}

#[derive(Default)]
struct State {
    next_generation: u64,
    waiters: HashMap<Key, Waiter>,
}

#[derive(Default)]
pub struct ReplyWaiter {
    state: Mutex<State>,
}

impl std::fmt::Debug for ReplyWaiter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplyWaiter").field("waiting", &self.lock().waiters.len()).finish()
    }
}

impl ReplyWaiter {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait for the next message `entity` sends in `channel`. A newer wait on
    /// the same key supersedes this one, which then returns `None`.
    pub async fn wait_for(&self, entity: EntityId, channel: ChannelId, timeout: Duration) -> Option<String> {
        let (tx, rx) = oneshot::channel();
        let generation = {
            let mut state = self.lock();
            state.next_generation += 1;
            let generation = state.next_generation;
            state.waiters.insert((entity, channel), Waiter { generation, reply: tx });
            generation
        };

        let outcome = tokio::time::timeout(timeout, rx).await;

        let mut state = self.lock();
        if state.waiters.get(&(entity, channel)).is_some_and(|w| w.generation == generation) {
            state.waiters.remove(&(entity, channel));
        }
        match outcome {
            Ok(Ok(text)) => Some(text),
            Ok(Err(_)) => None,
            Err(_) => {
                debug!(entity = %entity, channel = %channel, "reply wait timed out");
                None
            }
        }
    }

    /// Hand `text` to a waiting handler. Returns `true` when it was taken.
    pub fn offer(&self, entity: EntityId, channel: ChannelId, text: &str) -> bool {
        let Some(waiter) = self.lock().waiters.remove(&(entity, channel)) else {
            return false;
        };
        waiter.reply.send(text.to_string()).is_ok()
    }

    pub fn is_waiting(&self, entity: EntityId, channel: ChannelId) -> bool {
        self.lock().waiters.contains_key(&(entity, channel))
    }
}
