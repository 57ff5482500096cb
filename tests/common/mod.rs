#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use friend_finder::kernel::event::PendingConfirmation;
use friend_finder::kernel::presence::{
    PersonaState, PresenceRecord, PresenceSnapshot, SteamId, TrackedActivities, Visibility,
};
use friend_finder::kernel::reactor::{Reactor, ReactorConfig};
use friend_finder::services::notify::{Channel, Destination, Notifier};
use friend_finder::services::queue::{DelayedQueue, KeyedDelayQueue};
use friend_finder::services::steam::PresenceFetcher;
use friend_finder::services::store::{MemoryStore, PresenceStore};
use friend_finder::WatchError;

pub const DEBOUNCE: Duration = Duration::from_secs(600);

pub fn tracked() -> TrackedActivities {
    TrackedActivities::new(["440", "570"])
}

/// Public, online, in `game` (empty for no game).
pub fn playing(id: u64, name: &str, game: &str, label: &str) -> PresenceSnapshot {
    PresenceSnapshot {
        id: SteamId(id),
        visibility: Visibility::Public,
        persona_state: PersonaState::Online,
        activity_id: game.to_string(),
        activity_label: label.to_string(),
        display_name: name.to_string(),
    }
}

pub fn idle(id: u64, name: &str) -> PresenceSnapshot {
    playing(id, name, "", "")
}

pub fn active_record(id: u64, game: &str) -> PresenceRecord {
    PresenceRecord {
        id: SteamId(id),
        active: true,
        activity_id: game.to_string(),
        display_name: String::new(),
    }
}

/// Presence the fake API currently reports, settable between work items.
#[derive(Default)]
pub struct FakeFetcher {
    presence: Mutex<HashMap<SteamId, PresenceSnapshot>>,
    failing: AtomicBool,
    answer_all: AtomicBool,
    calls: AtomicUsize,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&self, snapshot: PresenceSnapshot) {
        self.presence.lock().unwrap().insert(snapshot.id, snapshot);
    }

    pub fn remove(&self, id: u64) {
        self.presence.lock().unwrap().remove(&SteamId(id));
    }

    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Also return presence for ids nobody asked for.
    pub fn answer_all(&self, enabled: bool) {
        self.answer_all.store(enabled, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PresenceFetcher for FakeFetcher {
    async fn fetch(&self, ids: &[SteamId]) -> Result<Vec<PresenceSnapshot>, WatchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(WatchError::fetch("status code was not 200 (503)"));
        }
        let presence = self.presence.lock().unwrap();
        if self.answer_all.load(Ordering::SeqCst) {
            return Ok(presence.values().cloned().collect());
        }
        Ok(ids.iter().filter_map(|id| presence.get(id).cloned()).collect())
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<(Destination, String)>>,
    attempted: Mutex<Vec<Destination>>,
    rejected: Mutex<Vec<Destination>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Fail deliveries to `destination` only.
    pub fn reject(&self, destination: Destination) {
        self.rejected.lock().unwrap().push(destination);
    }

    pub fn attempted(&self) -> Vec<Destination> {
        self.attempted.lock().unwrap().clone()
    }

    pub fn sent(&self) -> Vec<(Destination, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.sent().into_iter().map(|(_, m)| m).collect()
    }
}

impl Notifier for RecordingNotifier {
    async fn notify(&self, destination: &Destination, message: &str) -> Result<(), WatchError> {
        self.attempted.lock().unwrap().push(destination.clone());
        if self.failing.load(Ordering::SeqCst) || self.rejected.lock().unwrap().contains(destination) {
            return Err(WatchError::NotifyFailed {
                destination: destination.to_string(),
                details: "gateway returned 500".to_string(),
            });
        }
        self.sent
            .lock()
            .unwrap()
            .push((destination.clone(), message.to_string()));
        Ok(())
    }
}

/// Store whose writes fail for `broken` ids and reads fail for `unreadable` ids.
#[derive(Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    pub broken: Vec<SteamId>,
    pub unreadable: Vec<SteamId>,
}

impl PresenceStore for FlakyStore {
    async fn load(&self, id: SteamId) -> Result<PresenceRecord, WatchError> {
        if self.unreadable.contains(&id) {
            return Err(WatchError::store(id, "permission denied"));
        }
        self.inner.load(id).await
    }

    async fn save(&self, record: &PresenceRecord) -> Result<(), WatchError> {
        if self.broken.contains(&record.id) {
            return Err(WatchError::store(record.id, "disk full"));
        }
        self.inner.save(record).await
    }
}

/// Queue that refuses every enqueue.
#[derive(Default)]
pub struct RejectingQueue;

impl DelayedQueue for RejectingQueue {
    async fn enqueue(&mut self, pending: PendingConfirmation, _delay: Duration) -> Result<(), WatchError> {
        Err(WatchError::EnqueueFailed {
            id: pending.id,
            details: "broker unavailable".to_string(),
        })
    }

    async fn next_expired(&mut self) -> Option<PendingConfirmation> {
        None
    }
}

pub fn sms() -> Destination {
    Destination {
        channel: Channel::Sms,
        address: "+15550100".to_string(),
    }
}

pub fn email() -> Destination {
    Destination {
        channel: Channel::Email,
        address: "me@example.com".to_string(),
    }
}

pub fn reactor_config(roster: &[u64]) -> ReactorConfig {
    ReactorConfig {
        roster: roster.iter().copied().map(SteamId).collect(),
        tracked: tracked(),
        poll_interval: Duration::from_secs(60),
        debounce: DEBOUNCE,
        destinations: vec![sms()],
    }
}

pub type TestReactor = Reactor<FakeFetcher, MemoryStore, RecordingNotifier, KeyedDelayQueue>;

pub fn reactor(roster: &[u64]) -> TestReactor {
    Reactor::new(
        reactor_config(roster),
        FakeFetcher::new(),
        MemoryStore::new(),
        RecordingNotifier::new(),
        KeyedDelayQueue::new(),
    )
}
