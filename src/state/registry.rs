//! Room registry: owns every live room and tracks which room each
//! connection belongs to.

use rand::Rng;
use std::collections::HashMap;

use crate::error::GameError;
use crate::game::{Effects, Recipient, Room, TimerCommand};
use crate::protocol::ServerMessage;
use crate::types::*;

/// Safe character set for room codes (excludes 0/O, 1/I/L to avoid confusion)
const CODE_CHARS: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZ23456789";
const CODE_LENGTH: usize = 6;

/// Generate a random room code
fn generate_room_code() -> String {
    let mut rng = rand::rng();
    (0..CODE_LENGTH)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect()
}

/// Room effects resolved to concrete connections
#[derive(Debug, Default)]
pub struct Dispatch {
    pub deliveries: Vec<(ConnectionId, ServerMessage)>,
    pub timers: Vec<(RoomCode, TimerCommand)>,
}

impl Dispatch {
    /// Messages addressed to one connection, in delivery order
    #[cfg(test)]
    pub fn messages_for(&self, id: &str) -> Vec<&ServerMessage> {
        self.deliveries
            .iter()
            .filter(|(to, _)| to == id)
            .map(|(_, m)| m)
            .collect()
    }

    fn extend(&mut self, other: Dispatch) {
        self.deliveries.extend(other.deliveries);
        self.timers.extend(other.timers);
    }
}

#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: HashMap<RoomCode, Room>,
    memberships: HashMap<ConnectionId, RoomCode>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    pub fn get(&self, code: &str) -> Option<&Room> {
        self.rooms.get(code)
    }

    /// Room the connection currently belongs to
    pub fn room_of(&self, id: &str) -> Option<&RoomCode> {
        self.memberships.get(id)
    }

    /// Create an empty lobby under a fresh code
    pub fn create_room(&mut self, settings: RoomSettings) -> RoomCode {
        let code = loop {
            let code = generate_room_code();
            if !self.rooms.contains_key(&code) {
                break code;
            }
            // Collision - try again
        };

        tracing::info!(room = %code, ?settings, "Room created");
        self.rooms
            .insert(code.clone(), Room::new(code.clone(), settings));
        code
    }

    /// Join a room, leaving any other room the connection was in first
    pub fn join_room(
        &mut self,
        code: &str,
        id: &str,
        display_name: &str,
    ) -> Result<Dispatch, GameError> {
        let room = self.rooms.get(code).ok_or(GameError::RoomNotFound)?;
        if matches!(room.phase, RoomPhase::Playing | RoomPhase::Voting) {
            return Err(GameError::GameInProgress);
        }

        let mut dispatch = Dispatch::default();
        if let Some(previous) = self.memberships.get(id).cloned() {
            if previous != code {
                dispatch.extend(self.leave(Some(&previous), id));
            }
        }

        let room = self.rooms.get_mut(code).ok_or(GameError::RoomNotFound)?;
        let effects = room.add_player(id, display_name)?;
        self.memberships.insert(id.to_string(), code.to_string());
        tracing::info!(room = %code, connection = %id, "Player joined");

        dispatch.extend(self.resolve(code, effects));
        Ok(dispatch)
    }

    /// Remove a connection from a room. Without a code, the connection's
    /// tracked room is used. Leaving twice is a no-op.
    pub fn leave(&mut self, code: Option<&str>, id: &str) -> Dispatch {
        let Some(code) = code
            .map(str::to_string)
            .or_else(|| self.memberships.get(id).cloned())
        else {
            return Dispatch::default();
        };

        if self.memberships.get(id) == Some(&code) {
            self.memberships.remove(id);
        }

        let Some(room) = self.rooms.get_mut(&code) else {
            return Dispatch::default();
        };
        let Some(effects) = room.remove_player(id) else {
            return Dispatch::default();
        };
        tracing::info!(room = %code, connection = %id, "Player left");

        let mut dispatch = self.resolve(&code, effects);
        if room_is_empty(self.rooms.get(&code)) {
            self.rooms.remove(&code);
            dispatch.timers.push((code.clone(), TimerCommand::Cancel));
            tracing::info!(room = %code, "Room destroyed");
        }
        dispatch
    }

    /// Transport-level loss of a connection
    pub fn disconnect(&mut self, id: &str) -> Dispatch {
        self.leave(None, id)
    }

    /// Run a room operation and resolve its effects
    pub fn with_room<F>(&mut self, code: &str, op: F) -> Result<Dispatch, GameError>
    where
        F: FnOnce(&mut Room) -> Result<Effects, GameError>,
    {
        let room = self.rooms.get_mut(code).ok_or(GameError::RoomNotFound)?;
        let effects = op(room)?;
        Ok(self.resolve(code, effects))
    }

    /// Deliver a turn timer expiry to its room
    pub fn expire_turn(&mut self, code: &str, generation: u64) -> Dispatch {
        match self.rooms.get_mut(code) {
            Some(room) => {
                let effects = room.expire_turn(generation);
                self.resolve(code, effects)
            }
            None => Dispatch::default(),
        }
    }

    fn resolve(&self, code: &str, effects: Effects) -> Dispatch {
        let members: Vec<ConnectionId> = self
            .rooms
            .get(code)
            .map(|room| room.players.iter().map(|p| p.id.clone()).collect())
            .unwrap_or_default();

        let mut dispatch = Dispatch::default();
        for outbound in effects.outbound {
            match outbound.to {
                Recipient::Members => {
                    for member in &members {
                        dispatch
                            .deliveries
                            .push((member.clone(), outbound.message.clone()));
                    }
                }
                Recipient::Connection(id) => dispatch.deliveries.push((id, outbound.message)),
            }
        }
        if let Some(command) = effects.timer {
            dispatch.timers.push((code.to_string(), command));
        }
        dispatch
    }
}

fn room_is_empty(room: Option<&Room>) -> bool {
    room.map(Room::is_empty).unwrap_or(false)
}
