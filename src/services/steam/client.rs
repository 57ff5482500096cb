use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use super::PresenceFetcher;
use crate::config::SteamConfig;
use crate::error::WatchError;
use crate::kernel::presence::{PresenceSnapshot, SteamId};
use crate::services::retry::RetryPolicy;

const SUMMARIES_PATH: &str = "/ISteamUser/GetPlayerSummaries/v0002/";

/// Steam Web API client for `GetPlayerSummaries`.
#[derive(Clone)]
pub struct SteamClient {
    client: Client,
    base_url: String,
    api_key: String,
    retry: RetryPolicy,
}

#[derive(Deserialize)]
struct PlayerSummariesResult {
    response: PlayerList,
}

#[derive(Deserialize)]
struct PlayerList {
    #[serde(default)]
    players: Vec<PlayerSummary>,
}

// Only the fields the detector consumes; everything else is ignored.
#[derive(Deserialize)]
struct PlayerSummary {
    steamid: SteamId,
    #[serde(default)]
    communityvisibilitystate: u32,
    #[serde(default)]
    personastate: u32,
    #[serde(default)]
    personaname: String,
    #[serde(default)]
    gameid: String,
    #[serde(default)]
    gameextrainfo: String,
}

impl From<PlayerSummary> for PresenceSnapshot {
    fn from(p: PlayerSummary) -> Self {
        PresenceSnapshot {
            id: p.steamid,
            visibility: p.communityvisibilitystate.into(),
            persona_state: p.personastate.into(),
            activity_id: p.gameid,
            activity_label: p.gameextrainfo,
            display_name: p.personaname,
        }
    }
}

impl SteamClient {
    pub fn new(config: &SteamConfig) -> Result<Self, WatchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| WatchError::Config(format!("http client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().unwrap_or_default(),
            retry: RetryPolicy {
                max_attempts: config.retry_attempts,
                backoff: Duration::from_secs(config.retry_backoff_secs),
            },
        })
    }

    async fn fetch_once(&self, ids: &[SteamId]) -> Result<Vec<PresenceSnapshot>, WatchError> {
        let joined = ids.iter().map(|id| id.to_string()).collect::<Vec<_>>().join(",");
        debug!(steamids = %joined, "requesting player summaries");

        let response = self
            .client
            .get(format!("{}{}", self.base_url, SUMMARIES_PATH))
            .query(&[("key", self.api_key.as_str()), ("steamids", joined.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(WatchError::fetch(format!(
                "status code was not 200 ({})",
                response.status()
            )));
        }

        let body = response.text().await?;
        parse_summaries(&body, ids.len())
    }
}

impl PresenceFetcher for SteamClient {
    async fn fetch(&self, ids: &[SteamId]) -> Result<Vec<PresenceSnapshot>, WatchError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        self.retry
            .run("player summaries request", || self.fetch_once(ids))
            .await
    }
}

/// Decode a `GetPlayerSummaries` body requested for `requested` ids.
///
/// More players than were asked for means the response cannot be trusted
/// for this batch. Fewer, down to none, is fine: unknown or deleted
/// accounts are just absent.
pub(crate) fn parse_summaries(body: &str, requested: usize) -> Result<Vec<PresenceSnapshot>, WatchError> {
    let result: PlayerSummariesResult =
        serde_json::from_str(body).map_err(|e| WatchError::fetch(format!("failure to read json: {}", e)))?;
    let players = result.response.players;

    if players.len() < requested {
        debug!(returned = players.len(), requested, "response is missing some players");
    }
    if players.len() > requested {
        return Err(WatchError::fetch(format!(
            "too many players in the response {} != {}",
            players.len(),
            requested
        )));
    }

    Ok(players.into_iter().map(PresenceSnapshot::from).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernel::presence::{PersonaState, Visibility};

    const BODY: &str = r#"{
        "response": {
            "players": [
                {
                    "steamid": "76561197970839813",
                    "communityvisibilitystate": 3,
                    "profilestate": 1,
                    "personaname": "H311B0Y",
                    "lastlogoff": 1443115849,
                    "personastate": 1,
                    "gameextrainfo": "Team Fortress 2",
                    "gameid": "440",
                    "loccountrycode": "US"
                },
                {
                    "steamid": "76561197960287930",
                    "communityvisibilitystate": 1,
                    "personaname": "quiet",
                    "personastate": 0
                }
            ]
        }
    }"#;

    #[test]
    fn parses_consumed_fields() {
        let players = parse_summaries(BODY, 2).unwrap();
        assert_eq!(players.len(), 2);

        let first = &players[0];
        assert_eq!(first.id, SteamId(76561197970839813));
        assert_eq!(first.visibility, Visibility::Public);
        assert_eq!(first.persona_state, PersonaState::Online);
        assert_eq!(first.activity_id, "440");
        assert_eq!(first.activity_label, "Team Fortress 2");
        assert_eq!(first.display_name, "H311B0Y");

        let second = &players[1];
        assert_eq!(second.visibility, Visibility::Private);
        assert!(second.activity_id.is_empty());
    }

    #[test]
    fn empty_player_list_is_an_empty_batch() {
        let players = parse_summaries(r#"{"response":{"players":[]}}"#, 2).unwrap();
        assert!(players.is_empty());
    }

    #[test]
    fn rejects_more_players_than_requested() {
        let err = parse_summaries(BODY, 1).unwrap_err();
        assert!(matches!(err, WatchError::FetchFailed(_)));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(parse_summaries("<html>", 1).is_err());
    }
}
