//! Pass and confirmation telemetry.
//!
//! Telemetry is a read-only side-effect layer. Detection and debounce logic
//! never read it; it exists for operator visibility and verification.

pub mod event;
pub mod metrics;
pub mod recorder;
