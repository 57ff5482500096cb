use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::WatchError;
use crate::kernel::debounce::DEFAULT_DEBOUNCE;
use crate::kernel::presence::{SteamId, TrackedActivities};
use crate::services::notify::Destination;
use crate::services::queue::MAX_DELAY;

pub const DEFAULT_CONFIG_PATH: &str = "friend-finder.toml";
pub const API_KEY_ENV: &str = "STEAM_API_KEY";

/// Games that count as a tracked activity when none are configured.
pub const DEFAULT_TRACKED_GAMES: &[&str] = &[
    "440", "945360", "275850", "1097150", "1062830", "477160", "246900", "312670", "1057240",
    "552500", "526870",
];

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub roster: Vec<SteamId>,
    pub tracked_activities: Vec<String>,
    pub poll_interval_secs: u64,
    pub debounce_secs: u64,
    pub steam: SteamConfig,
    pub store: StoreConfig,
    pub notify: NotifyConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SteamConfig {
    pub base_url: String,
    pub api_key: Option<String>,
    pub timeout_secs: u64,
    pub retry_attempts: u32,
    pub retry_backoff_secs: u64,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreConfig {
    /// JSON file for presence records; in-memory when absent.
    pub path: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NotifyConfig {
    /// Delivery gateway; notifications are only logged when absent.
    pub gateway_url: Option<String>,
    pub timeout_secs: u64,
    pub destinations: Vec<Destination>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            roster: Vec::new(),
            tracked_activities: DEFAULT_TRACKED_GAMES.iter().map(|s| s.to_string()).collect(),
            poll_interval_secs: 60,
            debounce_secs: DEFAULT_DEBOUNCE.as_secs(),
            steam: SteamConfig::default(),
            store: StoreConfig::default(),
            notify: NotifyConfig::default(),
        }
    }
}

impl Default for SteamConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.steampowered.com".to_string(),
            api_key: None,
            timeout_secs: 10,
            retry_attempts: 3,
            retry_backoff_secs: 2,
        }
    }
}

impl Default for NotifyConfig {
    fn default() -> Self {
        Self {
            gateway_url: None,
            timeout_secs: 10,
            destinations: Vec::new(),
        }
    }
}

impl Config {
    /// Read and validate a TOML config file. `STEAM_API_KEY` in the
    /// environment takes precedence over the file's `steam.api_key`.
    pub fn load(path: &Path) -> Result<Self, WatchError> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| WatchError::Config(format!("failed to read {}: {}", path.display(), e)))?;
        let mut config = Self::from_toml(&text)?;
        if let Ok(key) = std::env::var(API_KEY_ENV) {
            if !key.trim().is_empty() {
                config.steam.api_key = Some(key);
            }
        }
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, WatchError> {
        toml::from_str(text).map_err(|e| WatchError::Config(e.to_string()))
    }

    pub fn validate(&self) -> Result<(), WatchError> {
        if self.roster.is_empty() {
            return Err(WatchError::Config("roster is empty".into()));
        }
        if self.tracked_activities.is_empty() {
            return Err(WatchError::Config("tracked_activities is empty".into()));
        }
        if self.poll_interval_secs == 0 {
            return Err(WatchError::Config("poll_interval_secs must be positive".into()));
        }
        if self.debounce_secs == 0 {
            return Err(WatchError::Config("debounce_secs must be positive".into()));
        }
        if self.debounce() > MAX_DELAY {
            return Err(WatchError::Config(format!(
                "debounce_secs must be at most {}",
                MAX_DELAY.as_secs()
            )));
        }
        if self.steam.retry_attempts == 0 {
            return Err(WatchError::Config("steam.retry_attempts must be at least 1".into()));
        }
        match &self.steam.api_key {
            Some(key) if !key.trim().is_empty() => Ok(()),
            _ => Err(WatchError::Config(format!(
                "steam.api_key is not set (or export {})",
                API_KEY_ENV
            ))),
        }
    }

    pub fn tracked(&self) -> TrackedActivities {
        TrackedActivities::new(self.tracked_activities.iter().cloned())
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_secs(self.debounce_secs)
    }
}
