use serde::{Deserialize, Serialize};

use crate::kernel::presence::SteamId;
use crate::kernel::time::Tick;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TelemetryEvent {
    PassCompleted {
        tick: Tick,
        fetched: usize,
        missing: usize,
        became_active: usize,
        became_inactive: usize,
        armed: usize,
        store_failures: usize,
    },

    PassFailed {
        tick: Tick,
    },

    Confirmation {
        id: SteamId,
        outcome: ConfirmationKind,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConfirmationKind {
    Notified,
    Superseded,
    FetchFailed,
    NotifyFailed,
    /// Confirmed with nowhere to send it.
    Undelivered,
}
