use crate::kernel::presence::SteamId;

/// Every failure the watcher can surface to the operator.
///
/// None of these are fatal to the driver loop: a failed pass leaves the
/// persisted state intact and the next scheduled pass retries from it.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    /// Upstream presence API unavailable or returned something unusable.
    #[error("presence fetch failed: {0}")]
    FetchFailed(String),

    #[error("store operation failed for {id}: {details}")]
    StoreFailed { id: SteamId, details: String },

    #[error("notification to {destination} failed: {details}")]
    NotifyFailed { destination: String, details: String },

    #[error("could not enqueue confirmation for {id}: {details}")]
    EnqueueFailed { id: SteamId, details: String },

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl WatchError {
    pub fn fetch(details: impl std::fmt::Display) -> Self {
        WatchError::FetchFailed(details.to_string())
    }

    pub fn store(id: SteamId, details: impl std::fmt::Display) -> Self {
        WatchError::StoreFailed {
            id,
            details: details.to_string(),
        }
    }
}

impl From<reqwest::Error> for WatchError {
    fn from(e: reqwest::Error) -> Self {
        WatchError::FetchFailed(e.to_string())
    }
}
