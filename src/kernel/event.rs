use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::presence::SteamId;
use super::time::Tick;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransitionKind {
    BecameActive,
    BecameInactive,
}

/// A change in whether a user is engaged in a tracked activity, relative to
/// the last stored snapshot. Ephemeral: produced by one pass, consumed by it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionEvent {
    pub id: SteamId,
    pub kind: TransitionKind,
    /// Activity the subject is (BecameActive) or was (BecameInactive) in.
    pub activity_id: String,
    pub activity_label: String,
    pub display_name: String,
    pub observed_at: Tick,
}

/// A transition awaiting re-validation after the debounce delay.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingConfirmation {
    pub confirmation_id: Uuid,
    pub id: SteamId,
    pub expected_activity_id: String,
    pub activity_label: String,
    pub display_name: String,
    pub armed_at: Tick,
}

/// Unit of work accepted by [`crate::kernel::reactor::Reactor::handle`].
///
/// Tagged so an external scheduler or queue consumer can deliver it as JSON.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "pending")]
pub enum WorkItem {
    DetectionPass,
    Reconfirm(PendingConfirmation),
}
