use std::collections::HashMap;
use std::future::{poll_fn, Future};
use std::time::Duration;

use tokio_util::time::delay_queue::{DelayQueue, Key};
use tracing::{debug, info};

use crate::error::WatchError;
use crate::kernel::debounce::{Armed, PendingTable};
use crate::kernel::event::PendingConfirmation;
use crate::kernel::presence::SteamId;

/// Longest delay `KeyedDelayQueue` accepts. The timer wheel behind it tops
/// out a little past two years.
pub const MAX_DELAY: Duration = Duration::from_secs(365 * 24 * 60 * 60);

/// Delayed work queue for pending confirmations.
///
/// An entry must not come back from `next_expired` before its delay has
/// elapsed. Delivery may be late.
pub trait DelayedQueue {
    fn enqueue(
        &mut self,
        pending: PendingConfirmation,
        delay: Duration,
    ) -> impl Future<Output = Result<(), WatchError>> + Send;

    /// Next confirmation whose delay elapsed. Resolves to `None` only when
    /// the queue is empty; callers polling in a `select!` treat that as
    /// "nothing yet". Must be cancel safe.
    fn next_expired(&mut self) -> impl Future<Output = Option<PendingConfirmation>> + Send;
}

/// In-process delay queue keyed by identifier.
///
/// Arming an id that is already pending replaces the entry and restarts its
/// delay, so at most one re-check per id is ever live.
pub struct KeyedDelayQueue {
    entries: DelayQueue<PendingConfirmation>,
    keys: HashMap<SteamId, Key>,
    table: PendingTable,
}

impl Default for KeyedDelayQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl KeyedDelayQueue {
    pub fn new() -> Self {
        Self {
            entries: DelayQueue::new(),
            keys: HashMap::new(),
            table: PendingTable::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn table(&self) -> &PendingTable {
        &self.table
    }

    fn insert(&mut self, pending: PendingConfirmation, delay: Duration) -> Result<(), WatchError> {
        let id = pending.id;
        if delay > MAX_DELAY {
            return Err(WatchError::EnqueueFailed {
                id,
                details: format!("delay of {}s exceeds {}s", delay.as_secs(), MAX_DELAY.as_secs()),
            });
        }
        if let Armed::Replaced { previous } = self.table.arm(&pending) {
            info!(
                id = %id,
                previous = %previous.expected_activity_id,
                latest = %pending.expected_activity_id,
                "collapsing pending confirmation"
            );
        }
        if let Some(old) = self.keys.remove(&id) {
            self.entries.remove(&old);
        }
        let key = self.entries.insert(pending, delay);
        self.keys.insert(id, key);
        Ok(())
    }
}

impl DelayedQueue for KeyedDelayQueue {
    async fn enqueue(&mut self, pending: PendingConfirmation, delay: Duration) -> Result<(), WatchError> {
        debug!(id = %pending.id, delay_secs = delay.as_secs(), "enqueue confirmation");
        self.insert(pending, delay)
    }

    async fn next_expired(&mut self) -> Option<PendingConfirmation> {
        loop {
            let expired = poll_fn(|cx| self.entries.poll_expired(cx)).await?;
            let pending = expired.into_inner();
            self.keys.remove(&pending.id);
            if self.table.take_current(&pending) {
                return Some(pending);
            }
            debug!(id = %pending.id, "dropping stale confirmation delivery");
        }
    }
}
