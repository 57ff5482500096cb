pub mod debounce;
pub mod event;
pub mod presence;
pub mod reactor;
pub mod telemetry;
pub mod time;
pub mod transition;
