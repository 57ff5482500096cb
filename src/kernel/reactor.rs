use std::collections::{HashMap, HashSet};
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::debounce::{DebounceConfirmer, Resolution, SupersededReason};
use super::event::{PendingConfirmation, TransitionEvent, TransitionKind, WorkItem};
use super::presence::{PresenceSnapshot, SteamId, TrackedActivities};
use super::telemetry::event::{ConfirmationKind, TelemetryEvent};
use super::telemetry::recorder::TelemetryRecorder;
use super::time::Tick;
use super::transition::detect;
use crate::config::Config;
use crate::error::WatchError;
use crate::services::notify::{Destination, Notifier};
use crate::services::queue::DelayedQueue;
use crate::services::steam::PresenceFetcher;
use crate::services::store::PresenceStore;

#[derive(Debug, Clone)]
pub struct ReactorConfig {
    pub roster: Vec<SteamId>,
    pub tracked: TrackedActivities,
    pub poll_interval: Duration,
    pub debounce: Duration,
    pub destinations: Vec<Destination>,
}

impl ReactorConfig {
    pub fn from_config(config: &Config) -> Self {
        Self {
            roster: config.roster.clone(),
            tracked: config.tracked(),
            poll_interval: config.poll_interval(),
            debounce: config.debounce(),
            destinations: config.notify.destinations.clone(),
        }
    }
}

/// What one detection pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    pub tick: Tick,
    pub fetched: usize,
    /// Roster ids absent from the fetched batch; their records were untouched.
    pub missing: Vec<SteamId>,
    pub events: Vec<TransitionEvent>,
    pub armed: usize,
    pub store_failures: usize,
    pub enqueue_failures: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Pass(PassReport),
    Reconfirmed {
        id: SteamId,
        resolution: Resolution,
        /// Destinations that accepted the notification.
        delivered: usize,
    },
}

/// Entry point of the watcher. Collaborators are handed in explicitly; the
/// reactor keeps no presence state of its own between work items.
pub struct Reactor<F, S, N, Q> {
    pub fetcher: F,
    pub store: S,
    pub notifier: N,
    pub queue: Q,
    pub confirmer: DebounceConfirmer,
    pub telemetry: TelemetryRecorder,
    pub tick: Tick,
    config: ReactorConfig,
}

impl<F, S, N, Q> Reactor<F, S, N, Q>
where
    F: PresenceFetcher,
    S: PresenceStore,
    N: Notifier,
    Q: DelayedQueue,
{
    pub fn new(config: ReactorConfig, fetcher: F, store: S, notifier: N, queue: Q) -> Self {
        Self {
            confirmer: DebounceConfirmer::new(config.debounce, config.tracked.clone()),
            fetcher,
            store,
            notifier,
            queue,
            telemetry: TelemetryRecorder::new(),
            tick: Tick::new(),
            config,
        }
    }

    pub async fn handle(&mut self, item: WorkItem) -> Result<Outcome, WatchError> {
        match item {
            WorkItem::DetectionPass => self.detection_pass().await.map(Outcome::Pass),
            WorkItem::Reconfirm(pending) => self.reconfirm(pending).await,
        }
    }

    /// One pass over the whole roster.
    ///
    /// A failed batch fetch aborts before anything is written. Past that
    /// point failures are per identifier: that id is skipped, the rest of
    /// the batch continues.
    pub async fn detection_pass(&mut self) -> Result<PassReport, WatchError> {
        self.tick = self.tick.next();
        let tick = self.tick;

        // === 1. FETCH ===
        let snapshots = match self.fetcher.fetch(&self.config.roster).await {
            Ok(snapshots) => snapshots,
            Err(err) => {
                error!(tick = tick.frame, error = %err, "failed to retrieve player status");
                self.telemetry.record(TelemetryEvent::PassFailed { tick });
                return Err(err);
            }
        };

        let roster: HashSet<SteamId> = self.config.roster.iter().copied().collect();
        let mut fetched: Vec<PresenceSnapshot> = Vec::with_capacity(snapshots.len());
        for snapshot in snapshots {
            if roster.contains(&snapshot.id) {
                fetched.push(snapshot);
            } else {
                warn!(id = %snapshot.id, "ignoring presence for id outside the roster");
            }
        }

        let seen: HashSet<SteamId> = fetched.iter().map(|s| s.id).collect();
        let missing: Vec<SteamId> = self
            .config
            .roster
            .iter()
            .copied()
            .filter(|id| !seen.contains(id))
            .collect();
        for id in &missing {
            warn!(id = %id, "roster id absent from fetched batch, keeping stored record");
        }

        // === 2. LOAD ===
        let mut report = PassReport {
            tick,
            missing,
            ..PassReport::default()
        };
        let mut previous = HashMap::with_capacity(seen.len());
        let mut unreadable = HashSet::new();
        for id in &seen {
            match self.store.load(*id).await {
                Ok(record) => {
                    previous.insert(*id, record);
                }
                Err(err) => {
                    error!(id = %id, error = %err, "failure to get record");
                    report.store_failures += 1;
                    unreadable.insert(*id);
                }
            }
        }
        fetched.retain(|s| !unreadable.contains(&s.id));
        report.fetched = fetched.len();

        // === 3. DETECT ===
        let detection = detect(&previous, &fetched, &self.config.tracked, tick);

        // === 4. ARM ===
        let mut unarmed = HashSet::new();
        for event in &detection.events {
            match event.kind {
                TransitionKind::BecameActive => {
                    info!(id = %event.id, name = %event.display_name, game = %event.activity_id, "became active")
                }
                TransitionKind::BecameInactive => {
                    info!(id = %event.id, name = %event.display_name, "became inactive")
                }
            }

            let Some(pending) = self.confirmer.arm(event) else {
                continue;
            };
            match self.queue.enqueue(pending, self.confirmer.delay()).await {
                Ok(()) => report.armed += 1,
                Err(err) => {
                    // Leaving the record unsaved lets the next pass re-arm.
                    error!(id = %event.id, error = %err, "error occurred while queuing");
                    report.enqueue_failures += 1;
                    unarmed.insert(event.id);
                }
            }
        }

        // === 5. SAVE ===
        for record in &detection.records {
            if unarmed.contains(&record.id) {
                continue;
            }
            debug!(id = %record.id, active = record.active, game = %record.activity_id, "saving record");
            if let Err(err) = self.store.save(record).await {
                error!(id = %record.id, error = %err, "failure to save record");
                report.store_failures += 1;
            }
        }

        report.events = detection.events;

        let became_active = report
            .events
            .iter()
            .filter(|e| e.kind == TransitionKind::BecameActive)
            .count();
        self.telemetry.record(TelemetryEvent::PassCompleted {
            tick,
            fetched: report.fetched,
            missing: report.missing.len(),
            became_active,
            became_inactive: report.events.len() - became_active,
            armed: report.armed,
            store_failures: report.store_failures,
        });
        info!(
            tick = tick.frame,
            fetched = report.fetched,
            transitions = report.events.len(),
            armed = report.armed,
            "detection pass complete"
        );

        Ok(report)
    }

    /// Re-check one pending confirmation after its delay.
    ///
    /// The confirmation is consumed whatever happens: a failed re-fetch or a
    /// failed delivery is reported and not retried.
    pub async fn reconfirm(&mut self, pending: PendingConfirmation) -> Result<Outcome, WatchError> {
        let id = pending.id;
        debug!(id = %id, confirmation = %pending.confirmation_id, "reconfirming");

        let refetched = match self.fetch_one(id).await {
            Ok(snapshot) => snapshot,
            Err(err) => {
                warn!(id = %id, error = %err, "dropping confirmation, re-fetch failed");
                self.record_confirmation(id, ConfirmationKind::FetchFailed);
                return Err(err);
            }
        };

        let message = match self.confirmer.resolve(&pending, &refetched) {
            Resolution::Superseded(reason) => {
                match &reason {
                    SupersededReason::SwitchedActivity { from, to } => {
                        info!(id = %id, old_gameid = %from, new_gameid = %to, "player switching to a different game")
                    }
                    SupersededReason::NoLongerActive => {
                        info!(id = %id, "player no longer active, dropping confirmation")
                    }
                }
                self.record_confirmation(id, ConfirmationKind::Superseded);
                return Ok(Outcome::Reconfirmed {
                    id,
                    resolution: Resolution::Superseded(reason),
                    delivered: 0,
                });
            }
            Resolution::Confirmed { message } => message,
        };

        if self.config.destinations.is_empty() {
            warn!(id = %id, text = %message, "confirmed but no destinations configured");
            self.record_confirmation(id, ConfirmationKind::Undelivered);
            return Ok(Outcome::Reconfirmed {
                id,
                resolution: Resolution::Confirmed { message },
                delivered: 0,
            });
        }

        let mut delivered = 0;
        let mut last_err = None;
        for destination in &self.config.destinations {
            match self.notifier.notify(destination, &message).await {
                Ok(()) => delivered += 1,
                Err(err) => {
                    error!(id = %id, destination = %destination, error = %err, "couldn't send notification");
                    last_err = Some(err);
                }
            }
        }

        if let (0, Some(err)) = (delivered, last_err) {
            self.record_confirmation(id, ConfirmationKind::NotifyFailed);
            return Err(err);
        }

        info!(id = %id, delivered, "notified");
        self.record_confirmation(id, ConfirmationKind::Notified);
        Ok(Outcome::Reconfirmed {
            id,
            resolution: Resolution::Confirmed { message },
            delivered,
        })
    }

    async fn fetch_one(&self, id: SteamId) -> Result<PresenceSnapshot, WatchError> {
        self.fetcher
            .fetch(&[id])
            .await?
            .into_iter()
            .find(|s| s.id == id)
            .ok_or_else(|| WatchError::fetch(format!("no response from fetching player {}", id)))
    }

    fn record_confirmation(&mut self, id: SteamId, outcome: ConfirmationKind) {
        self.telemetry.record(TelemetryEvent::Confirmation { id, outcome });
    }

    /// Driver loop: a detection pass every `poll_interval`, a re-check for
    /// every confirmation as its delay elapses, until `shutdown` trips.
    pub async fn run(&mut self, shutdown: CancellationToken) {
        info!(
            poll_secs = self.config.poll_interval.as_secs(),
            debounce_secs = self.config.debounce.as_secs(),
            roster = self.config.roster.len(),
            tracked = self.config.tracked.len(),
            "watcher started"
        );

        let mut cadence = interval(self.config.poll_interval);
        cadence.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let item = tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                Some(pending) = self.queue.next_expired() => WorkItem::Reconfirm(pending),
                _ = cadence.tick() => WorkItem::DetectionPass,
            };

            // Failures are already logged; the next tick retries from the store.
            if let Err(err) = self.handle(item).await {
                debug!(error = %err, "work item failed");
            }
        }

        info!("watcher stopped");
    }
}
