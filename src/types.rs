use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Opaque ID types for type safety
pub type ConnectionId = String;
pub type RoomCode = String;

/// Maximum length of a display name, in characters
pub const MAX_NAME_CHARS: usize = 16;
/// Maximum length of a clue, in characters
pub const MAX_CLUE_CHARS: usize = 120;
/// Name given to players who join without one
pub const DEFAULT_DISPLAY_NAME: &str = "Player";
/// Category value that pools every category in the catalog
pub const ALL_CATEGORIES: &str = "All";

pub const MIN_ROUNDS: u32 = 1;
pub const MAX_ROUNDS: u32 = 10;
pub const DEFAULT_ROUNDS: u32 = 3;
pub const MIN_WAIT_SECONDS: u32 = 5;
pub const MAX_WAIT_SECONDS: u32 = 300;
pub const DEFAULT_WAIT_SECONDS: u32 = 20;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RoomPhase {
    Lobby,
    Playing,
    Voting,
    Results,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum VotingMode {
    #[default]
    Secret,
    Open,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RoomSettings {
    pub round_count: u32,
    pub category: String,
    pub voting_mode: VotingMode,
    pub turn_wait_seconds: u32,
}

impl Default for RoomSettings {
    fn default() -> Self {
        Self {
            round_count: DEFAULT_ROUNDS,
            category: ALL_CATEGORIES.to_string(),
            voting_mode: VotingMode::Secret,
            turn_wait_seconds: DEFAULT_WAIT_SECONDS,
        }
    }
}

/// Settings as sent by a client creating a room; every field is optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRequest {
    pub rounds: Option<u32>,
    pub category: Option<String>,
    pub voting_mode: Option<String>,
    pub wait_seconds: Option<u32>,
}

impl RoomSettings {
    /// Clamp a client request into valid settings, filling defaults
    pub fn from_request(req: &SettingsRequest) -> Self {
        let category = req
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(ALL_CATEGORIES)
            .to_string();

        Self {
            round_count: req
                .rounds
                .unwrap_or(DEFAULT_ROUNDS)
                .clamp(MIN_ROUNDS, MAX_ROUNDS),
            category,
            voting_mode: match req.voting_mode.as_deref() {
                Some("open") => VotingMode::Open,
                _ => VotingMode::Secret,
            },
            turn_wait_seconds: req
                .wait_seconds
                .unwrap_or(DEFAULT_WAIT_SECONDS)
                .clamp(MIN_WAIT_SECONDS, MAX_WAIT_SECONDS),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub id: ConnectionId,
    pub display_name: String,
    pub is_ready: bool,
}

impl Player {
    pub fn new(id: ConnectionId, requested_name: &str) -> Self {
        Self {
            id,
            display_name: clean_display_name(requested_name),
            is_ready: false,
        }
    }
}

/// Trim and truncate a requested display name, falling back to the default
pub fn clean_display_name(raw: &str) -> String {
    let name: String = raw.trim().chars().take(MAX_NAME_CHARS).collect();
    let name = name.trim_end();
    if name.is_empty() {
        DEFAULT_DISPLAY_NAME.to_string()
    } else {
        name.to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Clue {
    pub player_id: ConnectionId,
    pub display_name: String,
    pub text: String,
    pub round: u32,
    pub ts: DateTime<Utc>,
}

/// A secret word together with the hint handed to the impostor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WordPair {
    pub word: String,
    pub hint: String,
}

/// Room snapshot safe to show every member (no secret, no impostor)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicRoom {
    pub code: RoomCode,
    pub players: Vec<Player>,
    pub settings: RoomSettings,
    pub phase: RoomPhase,
    pub current_round: u32,
    pub host_id: Option<ConnectionId>,
}
