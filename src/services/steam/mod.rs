pub mod client;

use std::future::Future;

use crate::error::WatchError;
use crate::kernel::presence::{PresenceSnapshot, SteamId};

pub use client::SteamClient;

/// Source of current presence for a batch of identifiers.
///
/// Fails the whole batch with `FetchFailed`; identifiers the upstream does
/// not know are simply absent from the result.
pub trait PresenceFetcher {
    fn fetch(&self, ids: &[SteamId]) -> impl Future<Output = Result<Vec<PresenceSnapshot>, WatchError>> + Send;
}
