use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// 64-bit Steam account identifier.
///
/// The upstream API sends ids as decimal strings, config files may use either
/// strings or integers, so both forms are accepted on input and the string
/// form is always written back.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "SteamIdRepr", into = "String")]
pub struct SteamId(pub u64);

#[derive(Deserialize)]
#[serde(untagged)]
enum SteamIdRepr {
    Number(u64),
    Text(String),
}

impl TryFrom<SteamIdRepr> for SteamId {
    type Error = String;

    fn try_from(repr: SteamIdRepr) -> Result<Self, Self::Error> {
        match repr {
            SteamIdRepr::Number(n) => Ok(SteamId(n)),
            SteamIdRepr::Text(s) => s.parse(),
        }
    }
}

impl FromStr for SteamId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(SteamId)
            .map_err(|e| format!("invalid steam id {:?}: {}", s, e))
    }
}

impl From<SteamId> for String {
    fn from(id: SteamId) -> Self {
        id.0.to_string()
    }
}

impl fmt::Display for SteamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// `communityvisibilitystate` as reported by the Steam Web API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Visibility {
    Private,
    FriendsOnly,
    Public,
    Unknown(u32),
}

impl From<u32> for Visibility {
    fn from(raw: u32) -> Self {
        match raw {
            1 => Visibility::Private,
            2 => Visibility::FriendsOnly,
            3 => Visibility::Public,
            other => Visibility::Unknown(other),
        }
    }
}

/// `personastate` as reported by the Steam Web API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PersonaState {
    Offline,
    Online,
    Busy,
    Away,
    Snooze,
    LookingToTrade,
    LookingToPlay,
    Unknown(u32),
}

impl From<u32> for PersonaState {
    fn from(raw: u32) -> Self {
        match raw {
            0 => PersonaState::Offline,
            1 => PersonaState::Online,
            2 => PersonaState::Busy,
            3 => PersonaState::Away,
            4 => PersonaState::Snooze,
            5 => PersonaState::LookingToTrade,
            6 => PersonaState::LookingToPlay,
            other => PersonaState::Unknown(other),
        }
    }
}

/// Freshly fetched presence attributes for one identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceSnapshot {
    pub id: SteamId,
    pub visibility: Visibility,
    pub persona_state: PersonaState,
    /// Steam `gameid`; empty when not in a game.
    pub activity_id: String,
    /// Steam `gameextrainfo`, the human readable game title.
    pub activity_label: String,
    pub display_name: String,
}

impl PresenceSnapshot {
    /// Whether this snapshot counts as "playing a tracked activity".
    ///
    /// All four conditions must hold: public profile, online persona,
    /// a non-empty activity, and that activity in the tracked set.
    pub fn is_active(&self, tracked: &TrackedActivities) -> bool {
        self.visibility == Visibility::Public
            && self.persona_state == PersonaState::Online
            && !self.activity_id.is_empty()
            && tracked.contains(&self.activity_id)
    }
}

/// Last-known presence of a tracked identifier, as persisted by the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PresenceRecord {
    pub id: SteamId,
    pub active: bool,
    #[serde(default)]
    pub activity_id: String,
    #[serde(default)]
    pub display_name: String,
}

impl PresenceRecord {
    /// Record for an identifier seen for the first time.
    pub fn baseline(id: SteamId) -> Self {
        Self {
            id,
            active: false,
            activity_id: String::new(),
            display_name: String::new(),
        }
    }

    /// Project a snapshot into the stored shape.
    /// `activity_id` is cleared whenever the snapshot is not active.
    pub fn observe(snapshot: &PresenceSnapshot, tracked: &TrackedActivities) -> Self {
        let active = snapshot.is_active(tracked);
        Self {
            id: snapshot.id,
            active,
            activity_id: if active {
                snapshot.activity_id.clone()
            } else {
                String::new()
            },
            display_name: snapshot.display_name.clone(),
        }
    }
}

/// The configured set of activity ids eligible to trigger notifications.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TrackedActivities {
    ids: HashSet<String>,
}

impl TrackedActivities {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            ids: ids.into_iter().map(Into::into).collect(),
        }
    }

    pub fn contains(&self, activity_id: &str) -> bool {
        self.ids.contains(activity_id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(visibility: u32, persona: u32, game: &str) -> PresenceSnapshot {
        PresenceSnapshot {
            id: SteamId(1),
            visibility: visibility.into(),
            persona_state: persona.into(),
            activity_id: game.to_string(),
            activity_label: String::new(),
            display_name: "p".to_string(),
        }
    }

    #[test]
    fn active_requires_every_condition() {
        let tracked = TrackedActivities::new(["440"]);
        assert!(snapshot(3, 1, "440").is_active(&tracked));
        assert!(!snapshot(1, 1, "440").is_active(&tracked), "private profile");
        assert!(!snapshot(3, 3, "440").is_active(&tracked), "away persona");
        assert!(!snapshot(3, 1, "").is_active(&tracked), "no game");
        assert!(!snapshot(3, 1, "570").is_active(&tracked), "untracked game");
    }

    #[test]
    fn inactive_record_has_no_activity() {
        let tracked = TrackedActivities::new(["440"]);
        let record = PresenceRecord::observe(&snapshot(3, 1, "570"), &tracked);
        assert!(!record.active);
        assert!(record.activity_id.is_empty());
    }

    #[test]
    fn tracked_set_deduplicates() {
        let tracked = TrackedActivities::new(["440", "570", "440"]);
        assert_eq!(tracked.len(), 2);
        assert!(!tracked.is_empty());
        assert!(TrackedActivities::new(Vec::<String>::new()).is_empty());
    }

    #[test]
    fn steam_id_accepts_string_and_number() {
        let from_text: SteamId = serde_json::from_str("\"76561197970839813\"").unwrap();
        let from_number: SteamId = serde_json::from_str("76561197970839813").unwrap();
        assert_eq!(from_text, from_number);
        assert_eq!(serde_json::to_string(&from_text).unwrap(), "\"76561197970839813\"");
    }
}
