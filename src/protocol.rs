use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::GameError;
use crate::game::tally::VoteCount;
use crate::types::*;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Create a room and join it as host
    CreateRoom {
        display_name: Option<String>,
        #[serde(default)]
        settings: SettingsRequest,
    },
    JoinRoom {
        code: RoomCode,
        display_name: Option<String>,
    },
    ToggleReady {
        code: RoomCode,
        ready: bool,
    },
    StartGame {
        code: RoomCode,
    },
    SubmitClue {
        code: RoomCode,
        text: String,
    },
    SubmitVote {
        code: RoomCode,
        target_id: ConnectionId,
    },
    ResetRoom {
        code: RoomCode,
    },
    /// Leave a room; without a code, leaves whatever room the connection is in
    LeaveRoom {
        code: Option<RoomCode>,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "t", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// First message on every connection
    Welcome {
        connection_id: ConnectionId,
    },
    RoomUpdate {
        room: PublicRoom,
    },
    GameStarted {
        room: PublicRoom,
    },
    /// Sent to one player only: the word, or the hint for the impostor
    PrivateCard {
        card: Card,
    },
    RoundStarted {
        round: u32,
        order: Vec<ConnectionId>,
    },
    ClueAccepted {
        round: u32,
        clue: PublicClue,
    },
    TurnUpdate {
        round: u32,
        current_speaker_id: ConnectionId,
        current_speaker_name: String,
        ends_at: DateTime<Utc>,
    },
    VotingStarted {
        voting_mode: VotingMode,
    },
    /// Only broadcast in open voting mode
    VoteUpdate {
        voter_name: String,
        target_id: ConnectionId,
    },
    GameResults(GameResults),
    ErrorMessage {
        code: String,
        message: String,
    },
}

impl From<&GameError> for ServerMessage {
    fn from(err: &GameError) -> Self {
        ServerMessage::ErrorMessage {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Card {
    Player { word: String },
    Impostor { hint: String },
}

/// Clue as shown to everyone (no player id)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PublicClue {
    pub display_name: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ResultClue {
    pub round: u32,
    pub display_name: String,
    pub text: String,
}

impl From<&Clue> for ResultClue {
    fn from(c: &Clue) -> Self {
        Self {
            round: c.round,
            display_name: c.display_name.clone(),
            text: c.text.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CastVote {
    pub voter_id: ConnectionId,
    pub target_id: ConnectionId,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GameResults {
    pub votes: Vec<CastVote>,
    pub counts: Vec<VoteCount>,
    pub selected_id: Option<ConnectionId>,
    pub selected_name: Option<String>,
    pub impostor_id: Option<ConnectionId>,
    pub impostor_name: Option<String>,
    pub secret_word: String,
    pub impostor_hint: String,
    pub impostor_caught: bool,
    pub clues: Vec<ResultClue>,
}
