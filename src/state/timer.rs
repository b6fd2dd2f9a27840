use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::task::AbortHandle;

use super::AppState;
use crate::game::TimerCommand;
use crate::types::RoomCode;

/// Pending turn timers, at most one per room.
///
/// Arming always aborts the room's previous timer before spawning the new
/// one. A timer that already woke up and is waiting for the registry is
/// caught by the generation check in the room instead.
#[derive(Debug, Default)]
pub struct TurnTimers {
    pending: Mutex<HashMap<RoomCode, AbortHandle>>,
}

impl TurnTimers {
    pub fn apply(&self, state: &Arc<AppState>, code: &RoomCode, command: TimerCommand) {
        let mut pending = match self.pending.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(previous) = pending.remove(code) {
            previous.abort();
        }

        if let TimerCommand::Arm { generation, delay } = command {
            let state = state.clone();
            let room = code.clone();
            let handle = tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                state.expire_turn(&room, generation).await;
            });
            pending.insert(code.clone(), handle.abort_handle());
        }
    }

    /// Number of rooms with a pending timer
    pub fn pending_count(&self) -> usize {
        match self.pending.lock() {
            Ok(guard) => guard.values().filter(|h| !h.is_finished()).count(),
            Err(poisoned) => poisoned.into_inner().values().filter(|h| !h.is_finished()).count(),
        }
    }
}
