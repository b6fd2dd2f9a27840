use thiserror::Error;

use crate::types::RoomPhase;

/// Every way a client request can be rejected.
///
/// Rejections are reported to the requesting connection only and never
/// change room state.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GameError {
    #[error("Room not found")]
    RoomNotFound,
    #[error("Game already in progress, joining is closed")]
    GameInProgress,
    #[error("You are not a member of this room")]
    NotAMember,
    #[error("Only the host can do that")]
    NotHost,
    #[error("Not allowed while the room is in {0:?}")]
    WrongPhase(RoomPhase),
    #[error("At least {min} players are required")]
    NotEnoughPlayers { min: usize },
    #[error("Everyone must be ready")]
    PlayersNotReady,
    #[error("Clue cannot be empty")]
    EmptyClue,
    #[error("It is not your turn")]
    NotYourTurn,
    #[error("You already gave a clue this round")]
    AlreadySubmitted,
    #[error("Profanity detected")]
    Profanity,
    #[error("Do not reveal the secret word")]
    LeaksSecret,
    #[error("Vote target is not a player in this room")]
    InvalidTarget,
}

impl GameError {
    /// Stable machine-readable code sent alongside the message
    pub fn code(&self) -> &'static str {
        match self {
            GameError::RoomNotFound => "ROOM_NOT_FOUND",
            GameError::GameInProgress => "GAME_IN_PROGRESS",
            GameError::NotAMember => "NOT_A_MEMBER",
            GameError::NotHost => "NOT_HOST",
            GameError::WrongPhase(_) => "WRONG_PHASE",
            GameError::NotEnoughPlayers { .. } => "NOT_ENOUGH_PLAYERS",
            GameError::PlayersNotReady => "PLAYERS_NOT_READY",
            GameError::EmptyClue => "EMPTY_CLUE",
            GameError::NotYourTurn => "NOT_YOUR_TURN",
            GameError::AlreadySubmitted => "ALREADY_SUBMITTED",
            GameError::Profanity => "PROFANITY",
            GameError::LeaksSecret => "LEAKS_SECRET",
            GameError::InvalidTarget => "INVALID_TARGET",
        }
    }
}
