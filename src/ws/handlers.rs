//! WebSocket message dispatch
//!
//! Resolves each client event to a room operation. Successful operations
//! fan out through the connection hub; the return value is the reply for
//! the sender alone, which is only ever an error.

use crate::error::GameError;
use crate::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use crate::types::{clean_display_name, RoomSettings};
use std::sync::Arc;

/// Handle a client message and return an optional reply for the sender
pub async fn handle_message(
    msg: ClientMessage,
    connection_id: &str,
    state: &Arc<AppState>,
) -> Option<ServerMessage> {
    let result = match msg {
        ClientMessage::CreateRoom {
            display_name,
            settings,
        } => {
            let settings = RoomSettings::from_request(&settings);
            let name = clean_display_name(display_name.as_deref().unwrap_or_default());
            state
                .create_room(connection_id, &name, settings)
                .await
                .map(|code| {
                    tracing::info!(room = %code, host = %connection_id, "Room opened by {}", name);
                })
        }

        ClientMessage::JoinRoom { code, display_name } => {
            let name = clean_display_name(display_name.as_deref().unwrap_or_default());
            state.join_room(&code, connection_id, &name).await
        }

        ClientMessage::ToggleReady { code, ready } => {
            state.toggle_ready(&code, connection_id, ready).await
        }

        ClientMessage::StartGame { code } => state.start_game(&code, connection_id).await,

        ClientMessage::SubmitClue { code, text } => {
            state.submit_clue(&code, connection_id, &text).await
        }

        ClientMessage::SubmitVote { code, target_id } => {
            state.submit_vote(&code, connection_id, &target_id).await
        }

        ClientMessage::ResetRoom { code } => state.reset_room(&code, connection_id).await,

        ClientMessage::LeaveRoom { code } => {
            state.leave_room(code.as_deref(), connection_id).await;
            Ok(())
        }
    };

    result.err().map(|e| reject(connection_id, &e))
}

fn reject(connection_id: &str, err: &GameError) -> ServerMessage {
    tracing::warn!(connection = %connection_id, code = err.code(), "Request rejected: {}", err);
    ServerMessage::from(err)
}
