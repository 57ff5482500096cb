//! Debounce confirmation of `BecameActive` transitions.
//!
//! ```text
//!            arm()                  delay elapses
//!  Idle ──────────────► Pending ────────────────► Reconfirming
//!   ▲                   │   ▲                        │
//!   │                   └───┘ arm() again:           │ resolve()
//!   │                   last write wins              ▼
//!   └──────────────── Confirmed | Superseded | Failed
//! ```
//!
//! The confirmer itself holds no per-identifier state. [`PendingTable`] is
//! the bookkeeping a delayed queue keeps so that at most one re-check per
//! identifier stays live.

use std::collections::HashMap;
use std::time::Duration;

use uuid::Uuid;

use super::event::{PendingConfirmation, TransitionEvent, TransitionKind};
use super::presence::{PresenceSnapshot, SteamId, TrackedActivities};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_secs(60 * 10);

/// Why a pending confirmation was dropped without notifying.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupersededReason {
    /// Still visible and online, but in a different (or untracked) game.
    SwitchedActivity { from: String, to: String },
    NoLongerActive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Confirmed { message: String },
    Superseded(SupersededReason),
}

#[derive(Debug, Clone)]
pub struct DebounceConfirmer {
    delay: Duration,
    tracked: TrackedActivities,
}

impl DebounceConfirmer {
    pub fn new(delay: Duration, tracked: TrackedActivities) -> Self {
        Self { delay, tracked }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Idle -> Pending. Only `BecameActive` events are worth a re-check.
    pub fn arm(&self, event: &TransitionEvent) -> Option<PendingConfirmation> {
        if event.kind != TransitionKind::BecameActive {
            return None;
        }
        Some(PendingConfirmation {
            confirmation_id: Uuid::new_v4(),
            id: event.id,
            expected_activity_id: event.activity_id.clone(),
            activity_label: event.activity_label.clone(),
            display_name: event.display_name.clone(),
            armed_at: event.observed_at,
        })
    }

    /// Reconfirming -> Confirmed | Superseded.
    ///
    /// Confirms only if the subject is still active and still in the exact
    /// activity captured when the confirmation was armed.
    pub fn resolve(&self, pending: &PendingConfirmation, refetched: &PresenceSnapshot) -> Resolution {
        if !refetched.is_active(&self.tracked) {
            if !refetched.activity_id.is_empty() && refetched.activity_id != pending.expected_activity_id {
                return Resolution::Superseded(SupersededReason::SwitchedActivity {
                    from: pending.expected_activity_id.clone(),
                    to: refetched.activity_id.clone(),
                });
            }
            return Resolution::Superseded(SupersededReason::NoLongerActive);
        }

        if refetched.activity_id != pending.expected_activity_id {
            return Resolution::Superseded(SupersededReason::SwitchedActivity {
                from: pending.expected_activity_id.clone(),
                to: refetched.activity_id.clone(),
            });
        }

        Resolution::Confirmed {
            message: notification_text(pending, refetched),
        }
    }
}

/// `"{name} is playing {game}"`, preferring the freshest names available.
pub fn notification_text(pending: &PendingConfirmation, refetched: &PresenceSnapshot) -> String {
    let name = first_non_empty(&[&refetched.display_name, &pending.display_name])
        .unwrap_or_else(|| pending.id.to_string());
    let game = first_non_empty(&[&refetched.activity_label, &pending.activity_label])
        .unwrap_or_else(|| pending.expected_activity_id.clone());
    format!("{} is playing {}", name, game)
}

fn first_non_empty(candidates: &[&String]) -> Option<String> {
    candidates
        .iter()
        .find(|s| !s.trim().is_empty())
        .map(|s| s.to_string())
}

/// Whether arming replaced an already pending confirmation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Armed {
    Scheduled,
    Replaced { previous: PendingConfirmation },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationState {
    Idle,
    Pending { expected_activity_id: String },
}

/// Latest pending confirmation per identifier.
#[derive(Debug, Default)]
pub struct PendingTable {
    latest: HashMap<SteamId, PendingConfirmation>,
}

impl PendingTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last write wins: a second arm for the same id replaces the first.
    pub fn arm(&mut self, pending: &PendingConfirmation) -> Armed {
        match self.latest.insert(pending.id, pending.clone()) {
            Some(previous) => Armed::Replaced { previous },
            None => Armed::Scheduled,
        }
    }

    /// Pending -> Reconfirming, only for the most recently armed delivery.
    ///
    /// Returns `false` for stale or duplicate deliveries, which the caller
    /// drops.
    pub fn take_current(&mut self, pending: &PendingConfirmation) -> bool {
        match self.latest.get(&pending.id) {
            Some(current) if current.confirmation_id == pending.confirmation_id => {
                self.latest.remove(&pending.id);
                true
            }
            _ => false,
        }
    }

    pub fn state(&self, id: SteamId) -> ConfirmationState {
        match self.latest.get(&id) {
            Some(p) => ConfirmationState::Pending {
                expected_activity_id: p.expected_activity_id.clone(),
            },
            None => ConfirmationState::Idle,
        }
    }

    pub fn len(&self) -> usize {
        self.latest.len()
    }

    pub fn is_empty(&self) -> bool {
        self.latest.is_empty()
    }
}
