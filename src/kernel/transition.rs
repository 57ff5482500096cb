use std::collections::HashMap;

use super::event::{TransitionEvent, TransitionKind};
use super::presence::{PresenceRecord, PresenceSnapshot, SteamId, TrackedActivities};
use super::time::Tick;

/// Result of one detection: the events to act on and the records to persist.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Detection {
    pub events: Vec<TransitionEvent>,
    /// Updated record for every fetched identifier, event or not.
    pub records: Vec<PresenceRecord>,
}

/// Pure function: (previous records, fetched snapshots) -> transitions.
///
/// Only the `active` flag drives events. An identifier unknown in
/// `previous` starts from the inactive baseline. Moving from one tracked
/// activity to another while staying active emits nothing. When the same id
/// appears twice in `current`, the last snapshot wins.
pub fn detect(
    previous: &HashMap<SteamId, PresenceRecord>,
    current: &[PresenceSnapshot],
    tracked: &TrackedActivities,
    at: Tick,
) -> Detection {
    let mut latest: Vec<&PresenceSnapshot> = Vec::with_capacity(current.len());
    let mut position: HashMap<SteamId, usize> = HashMap::new();
    for snapshot in current {
        match position.get(&snapshot.id) {
            Some(&i) => latest[i] = snapshot,
            None => {
                position.insert(snapshot.id, latest.len());
                latest.push(snapshot);
            }
        }
    }

    let mut detection = Detection::default();

    for snapshot in latest {
        let was_active = previous.get(&snapshot.id).map(|r| r.active).unwrap_or(false);
        let record = PresenceRecord::observe(snapshot, tracked);

        match (was_active, record.active) {
            (false, true) => detection.events.push(TransitionEvent {
                id: snapshot.id,
                kind: TransitionKind::BecameActive,
                activity_id: record.activity_id.clone(),
                activity_label: snapshot.activity_label.clone(),
                display_name: snapshot.display_name.clone(),
                observed_at: at,
            }),
            (true, false) => detection.events.push(TransitionEvent {
                id: snapshot.id,
                kind: TransitionKind::BecameInactive,
                activity_id: previous
                    .get(&snapshot.id)
                    .map(|r| r.activity_id.clone())
                    .unwrap_or_default(),
                activity_label: String::new(),
                display_name: snapshot.display_name.clone(),
                observed_at: at,
            }),
            _ => {}
        }

        detection.records.push(record);
    }

    detection
}
