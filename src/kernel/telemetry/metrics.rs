use std::collections::VecDeque;

use super::event::{ConfirmationKind, TelemetryEvent};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TelemetrySnapshot {
    pub pass_stats: PassStats,
    pub confirmation_stats: ConfirmationStats,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassStats {
    pub completed: u64,
    pub failed: u64,
    pub became_active: u64,
    pub became_inactive: u64,
    pub armed: u64,
    pub missing: u64,
    pub store_failures: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmationStats {
    pub notified: u64,
    pub superseded: u64,
    pub fetch_failed: u64,
    pub notify_failed: u64,
    pub undelivered: u64,
}

pub fn compute_snapshot(events: &VecDeque<TelemetryEvent>) -> TelemetrySnapshot {
    let mut snap = TelemetrySnapshot::default();

    for event in events {
        match event {
            TelemetryEvent::PassCompleted {
                missing,
                became_active,
                became_inactive,
                armed,
                store_failures,
                ..
            } => {
                let stats = &mut snap.pass_stats;
                stats.completed += 1;
                stats.missing += *missing as u64;
                stats.became_active += *became_active as u64;
                stats.became_inactive += *became_inactive as u64;
                stats.armed += *armed as u64;
                stats.store_failures += *store_failures as u64;
            }
            TelemetryEvent::PassFailed { .. } => snap.pass_stats.failed += 1,
            TelemetryEvent::Confirmation { outcome, .. } => {
                let stats = &mut snap.confirmation_stats;
                match outcome {
                    ConfirmationKind::Notified => stats.notified += 1,
                    ConfirmationKind::Superseded => stats.superseded += 1,
                    ConfirmationKind::FetchFailed => stats.fetch_failed += 1,
                    ConfirmationKind::NotifyFailed => stats.notify_failed += 1,
                    ConfirmationKind::Undelivered => stats.undelivered += 1,
                }
            }
        }
    }

    snap
}
