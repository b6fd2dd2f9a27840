//! Per-room state machine
//!
//! ```text
//! Lobby ──start_game──▶ Playing ──last turn──▶ Voting ──all voted──▶ Results
//!   ▲                                                                  │
//!   └────────────────────────────reset─────────────────────────────────┘
//! ```
//!
//! Operations never perform I/O. Each returns [`Effects`]: the messages to
//! fan out and at most one timer command for the runtime to execute.
//! Rejected operations return a [`GameError`] and leave the room unchanged.

use rand::seq::{IndexedRandom, SliceRandom};
use std::time::Duration;

use super::clue::{validate_clue, ClueContext};
use super::scheduler::{TimerCommand, TurnScheduler, TurnStep};
use super::tally::tally;
use crate::catalog::Catalog;
use crate::error::GameError;
use crate::protocol::{Card, CastVote, GameResults, PublicClue, ResultClue, ServerMessage};
use crate::types::*;

#[derive(Debug, Clone, PartialEq)]
pub enum Recipient {
    /// Every player currently in the room
    Members,
    Connection(ConnectionId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Outbound {
    pub to: Recipient,
    pub message: ServerMessage,
}

/// Side effects of a room operation
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Effects {
    pub outbound: Vec<Outbound>,
    /// Last timer command issued; it supersedes any earlier one
    pub timer: Option<TimerCommand>,
}

impl Effects {
    fn broadcast(&mut self, message: ServerMessage) {
        self.outbound.push(Outbound {
            to: Recipient::Members,
            message,
        });
    }

    fn send_to(&mut self, id: &str, message: ServerMessage) {
        self.outbound.push(Outbound {
            to: Recipient::Connection(id.to_string()),
            message,
        });
    }

    pub fn is_empty(&self) -> bool {
        self.outbound.is_empty() && self.timer.is_none()
    }
}

#[derive(Debug, Clone)]
pub struct Room {
    pub code: RoomCode,
    pub host_id: Option<ConnectionId>,
    /// Join order
    pub players: Vec<Player>,
    pub settings: RoomSettings,
    pub phase: RoomPhase,
    pub clues: Vec<Clue>,
    /// (voter, target) in the order votes were cast
    pub votes: Vec<(ConnectionId, ConnectionId)>,
    pub impostor_id: Option<ConnectionId>,
    /// Secret word and impostor hint, always set together
    pub word: Option<WordPair>,
    pub scheduler: TurnScheduler,
}

impl Room {
    pub fn new(code: RoomCode, settings: RoomSettings) -> Self {
        Self {
            code,
            host_id: None,
            players: Vec::new(),
            settings,
            phase: RoomPhase::Lobby,
            clues: Vec::new(),
            votes: Vec::new(),
            impostor_id: None,
            word: None,
            scheduler: TurnScheduler::default(),
        }
    }

    pub fn public_view(&self) -> PublicRoom {
        PublicRoom {
            code: self.code.clone(),
            players: self.players.clone(),
            settings: self.settings.clone(),
            phase: self.phase,
            current_round: self.scheduler.current_round(),
            host_id: self.host_id.clone(),
        }
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn is_member(&self, id: &str) -> bool {
        self.player(id).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    fn display_name(&self, id: &str) -> Option<String> {
        self.player(id).map(|p| p.display_name.clone())
    }

    fn require_member(&self, id: &str) -> Result<(), GameError> {
        if self.is_member(id) {
            Ok(())
        } else {
            Err(GameError::NotAMember)
        }
    }

    fn require_phase(&self, phase: RoomPhase) -> Result<(), GameError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(GameError::WrongPhase(self.phase))
        }
    }

    fn snapshot(&self, effects: &mut Effects) {
        effects.broadcast(ServerMessage::RoomUpdate {
            room: self.public_view(),
        });
    }

    /// Add a player. The first player of an empty room becomes host.
    pub fn add_player(&mut self, id: &str, display_name: &str) -> Result<Effects, GameError> {
        if matches!(self.phase, RoomPhase::Playing | RoomPhase::Voting) {
            return Err(GameError::GameInProgress);
        }

        if !self.is_member(id) {
            self.players.push(Player::new(id.to_string(), display_name));
        }
        if self.host_id.is_none() {
            self.host_id = Some(id.to_string());
        }

        let mut effects = Effects::default();
        self.snapshot(&mut effects);
        Ok(effects)
    }

    /// Remove a player, moving the host role and repairing an active game.
    ///
    /// Returns None if the connection was not a player here.
    pub fn remove_player(&mut self, id: &str) -> Option<Effects> {
        let pos = self.players.iter().position(|p| p.id == id)?;
        self.players.remove(pos);

        if self.host_id.as_deref() == Some(id) {
            self.host_id = self.players.first().map(|p| p.id.clone());
        }

        let mut effects = Effects::default();
        if self.players.is_empty() {
            if self.phase == RoomPhase::Playing {
                effects.timer = Some(self.scheduler.cancel());
            }
            return Some(effects);
        }

        self.snapshot(&mut effects);
        match self.phase {
            RoomPhase::Playing => {
                if self.scheduler.remove_speaker(id) {
                    let step = self.scheduler.settle();
                    self.apply_step(step, &mut effects);
                }
            }
            RoomPhase::Voting => {
                self.scheduler.retire_speaker(id);
                self.votes.retain(|(voter, target)| voter != id && target != id);
                if self.votes.len() == self.players.len() {
                    self.finish_voting(&mut effects);
                }
            }
            // Results are already out; keep the record consistent with the roster
            RoomPhase::Results => {
                self.scheduler.retire_speaker(id);
                self.votes.retain(|(voter, target)| voter != id && target != id);
            }
            RoomPhase::Lobby => {}
        }
        Some(effects)
    }

    pub fn toggle_ready(&mut self, id: &str, ready: bool) -> Result<Effects, GameError> {
        self.require_phase(RoomPhase::Lobby)?;
        let player = self
            .players
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or(GameError::NotAMember)?;
        player.is_ready = ready;

        let mut effects = Effects::default();
        self.snapshot(&mut effects);
        Ok(effects)
    }

    /// Return to the lobby after a finished game. Any member may do this.
    pub fn reset(&mut self, requester: &str) -> Result<Effects, GameError> {
        self.require_member(requester)?;
        self.require_phase(RoomPhase::Results)?;

        let mut effects = Effects::default();
        effects.timer = Some(self.scheduler.cancel());
        self.scheduler.reset();
        self.phase = RoomPhase::Lobby;
        self.clues.clear();
        self.votes.clear();
        self.impostor_id = None;
        self.word = None;
        for player in &mut self.players {
            player.is_ready = false;
        }

        self.snapshot(&mut effects);
        Ok(effects)
    }

    pub fn start_game(
        &mut self,
        requester: &str,
        min_players: usize,
        catalog: &Catalog,
    ) -> Result<Effects, GameError> {
        if self.host_id.as_deref() != Some(requester) {
            return Err(GameError::NotHost);
        }
        self.require_phase(RoomPhase::Lobby)?;
        if self.players.len() < min_players {
            return Err(GameError::NotEnoughPlayers { min: min_players });
        }
        if !self.players.iter().all(|p| p.is_ready) {
            return Err(GameError::PlayersNotReady);
        }

        let mut rng = rand::rng();
        let impostor_id = self
            .players
            .choose(&mut rng)
            .map(|p| p.id.clone())
            .ok_or(GameError::NotEnoughPlayers { min: min_players.max(1) })?;
        let word = catalog.pick_word_pair(&self.settings.category);

        let mut order: Vec<ConnectionId> = self.players.iter().map(|p| p.id.clone()).collect();
        order.shuffle(&mut rng);

        self.impostor_id = Some(impostor_id.clone());
        self.word = Some(word.clone());
        self.phase = RoomPhase::Playing;
        self.clues.clear();
        self.votes.clear();
        self.scheduler.start(order, self.settings.round_count);

        tracing::info!(
            room = %self.code,
            players = self.players.len(),
            rounds = self.settings.round_count,
            "Game started"
        );

        let mut effects = Effects::default();
        effects.broadcast(ServerMessage::GameStarted {
            room: self.public_view(),
        });
        for player in &self.players {
            let card = if player.id == impostor_id {
                Card::Impostor {
                    hint: word.hint.clone(),
                }
            } else {
                Card::Player {
                    word: word.word.clone(),
                }
            };
            effects.send_to(&player.id, ServerMessage::PrivateCard { card });
        }
        self.announce_round(&mut effects);
        self.begin_turn(&mut effects);
        Ok(effects)
    }

    pub fn submit_clue(&mut self, id: &str, raw_text: &str) -> Result<Effects, GameError> {
        self.require_phase(RoomPhase::Playing)?;
        let player = self.player(id).ok_or(GameError::NotAMember)?;
        let round = self.scheduler.current_round();
        let secret = self.word.as_ref().map(|w| w.word.as_str()).unwrap_or_default();

        let ctx = ClueContext {
            submitter: id,
            expected_speaker: self.scheduler.current_speaker().map(String::as_str),
            already_submitted: self
                .clues
                .iter()
                .any(|c| c.round == round && c.player_id == id),
            secret,
        };
        let text = validate_clue(&ctx, raw_text)?;

        let clue = Clue {
            player_id: id.to_string(),
            display_name: player.display_name.clone(),
            text,
            round,
            ts: chrono::Utc::now(),
        };

        let mut effects = Effects::default();
        effects.broadcast(ServerMessage::ClueAccepted {
            round,
            clue: PublicClue {
                display_name: clue.display_name.clone(),
                text: clue.text.clone(),
            },
        });
        self.clues.push(clue);

        effects.timer = Some(self.scheduler.cancel());
        self.advance_turn(&mut effects);
        Ok(effects)
    }

    /// The turn timer fired. Stale generations are ignored.
    pub fn expire_turn(&mut self, generation: u64) -> Effects {
        let mut effects = Effects::default();
        if self.phase != RoomPhase::Playing || !self.scheduler.is_current(generation) {
            tracing::debug!(room = %self.code, generation, "Ignoring stale turn timer");
            return effects;
        }

        tracing::debug!(
            room = %self.code,
            speaker = ?self.scheduler.current_speaker(),
            "Turn timed out"
        );
        self.advance_turn(&mut effects);
        effects
    }

    /// Record a binding vote. A second vote from the same voter is ignored.
    pub fn submit_vote(&mut self, voter: &str, target: &str) -> Result<Effects, GameError> {
        self.require_phase(RoomPhase::Voting)?;
        let voter_name = self.display_name(voter).ok_or(GameError::NotAMember)?;
        if !self.is_member(target) {
            return Err(GameError::InvalidTarget);
        }

        let mut effects = Effects::default();
        if self.votes.iter().any(|(v, _)| v == voter) {
            tracing::debug!(room = %self.code, voter, "Ignoring repeated vote");
            return Ok(effects);
        }

        self.votes.push((voter.to_string(), target.to_string()));
        if self.settings.voting_mode == VotingMode::Open {
            effects.broadcast(ServerMessage::VoteUpdate {
                voter_name,
                target_id: target.to_string(),
            });
        }

        if self.votes.len() == self.players.len() {
            self.finish_voting(&mut effects);
        }
        Ok(effects)
    }

    fn advance_turn(&mut self, effects: &mut Effects) {
        let step = self.scheduler.advance();
        self.apply_step(step, effects);
    }

    fn apply_step(&mut self, step: TurnStep, effects: &mut Effects) {
        match step {
            TurnStep::Speaker => self.begin_turn(effects),
            TurnStep::NewRound(_) => {
                self.announce_round(effects);
                self.begin_turn(effects);
            }
            TurnStep::Exhausted => {
                self.phase = RoomPhase::Voting;
                effects.timer = Some(self.scheduler.cancel());
                tracing::info!(room = %self.code, "Voting started");
                effects.broadcast(ServerMessage::VotingStarted {
                    voting_mode: self.settings.voting_mode,
                });
            }
        }
    }

    fn announce_round(&self, effects: &mut Effects) {
        effects.broadcast(ServerMessage::RoundStarted {
            round: self.scheduler.current_round(),
            order: self.scheduler.speak_order().to_vec(),
        });
    }

    fn begin_turn(&mut self, effects: &mut Effects) {
        let wait = Duration::from_secs(u64::from(self.settings.turn_wait_seconds));
        let command = self.scheduler.arm(wait);
        effects.timer = Some(command);

        let (Some(speaker), Some(ends_at)) = (
            self.scheduler.current_speaker().cloned(),
            self.scheduler.deadline(),
        ) else {
            return;
        };
        effects.broadcast(ServerMessage::TurnUpdate {
            round: self.scheduler.current_round(),
            current_speaker_name: self.display_name(&speaker).unwrap_or_default(),
            current_speaker_id: speaker,
            ends_at,
        });
    }

    fn finish_voting(&mut self, effects: &mut Effects) {
        self.phase = RoomPhase::Results;
        effects.timer = Some(self.scheduler.cancel());

        let outcome = tally(self.votes.iter().map(|(v, t)| (v, t)));
        let impostor_caught =
            outcome.selected_id.is_some() && outcome.selected_id == self.impostor_id;
        let (secret_word, impostor_hint) = self
            .word
            .as_ref()
            .map(|w| (w.word.clone(), w.hint.clone()))
            .unwrap_or_default();

        let results = GameResults {
            votes: self
                .votes
                .iter()
                .map(|(voter, target)| CastVote {
                    voter_id: voter.clone(),
                    target_id: target.clone(),
                })
                .collect(),
            selected_name: outcome
                .selected_id
                .as_deref()
                .and_then(|id| self.display_name(id)),
            impostor_name: self
                .impostor_id
                .as_deref()
                .and_then(|id| self.display_name(id)),
            selected_id: outcome.selected_id,
            counts: outcome.counts,
            impostor_id: self.impostor_id.clone(),
            secret_word,
            impostor_hint,
            impostor_caught,
            clues: self.clues.iter().map(ResultClue::from).collect(),
        };

        tracing::info!(
            room = %self.code,
            impostor_caught,
            "Game finished"
        );
        effects.broadcast(ServerMessage::GameResults(results));
    }
}
