use impostor::catalog::Catalog;
use impostor::config::ServerConfig;
use impostor::protocol::{Card, ClientMessage, ServerMessage};
use impostor::state::AppState;
use impostor::types::{ConnectionId, RoomCode, RoomPhase, SettingsRequest};
use impostor::ws::handlers::handle_message;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedReceiver;

struct Client {
    id: ConnectionId,
    rx: UnboundedReceiver<ServerMessage>,
}

impl Client {
    async fn connect(state: &Arc<AppState>) -> Self {
        let (id, rx) = state.connect().await;
        Self { id, rx }
    }

    fn drain(&mut self) -> Vec<ServerMessage> {
        let mut out = Vec::new();
        while let Ok(msg) = self.rx.try_recv() {
            out.push(msg);
        }
        out
    }
}

fn new_state() -> Arc<AppState> {
    let catalog =
        Catalog::from_json(r#"{"Food": [{"word": "pizza", "hint": "italian"}]}"#).unwrap();
    Arc::new(AppState::new(ServerConfig::default(), catalog))
}

async fn send(state: &Arc<AppState>, client: &Client, msg: ClientMessage) -> Option<ServerMessage> {
    handle_message(msg, &client.id, state).await
}

fn error_code(reply: Option<ServerMessage>) -> Option<String> {
    match reply {
        Some(ServerMessage::ErrorMessage { code, .. }) => Some(code),
        _ => None,
    }
}

/// Create a room with four members; returns the code and the clients, host first
async fn lobby(state: &Arc<AppState>, settings: SettingsRequest) -> (RoomCode, Vec<Client>) {
    let mut clients = Vec::new();
    for _ in 0..4 {
        clients.push(Client::connect(state).await);
    }

    let reply = send(
        state,
        &clients[0],
        ClientMessage::CreateRoom {
            display_name: Some("Ada".to_string()),
            settings,
        },
    )
    .await;
    assert!(reply.is_none());

    let code = match clients[0].drain().as_slice() {
        [ServerMessage::RoomUpdate { room }] => room.code.clone(),
        other => panic!("Expected room update, got {:?}", other),
    };

    for (i, name) in ["Bo", "Cy", "Di"].iter().enumerate() {
        let reply = send(
            state,
            &clients[i + 1],
            ClientMessage::JoinRoom {
                code: code.clone(),
                display_name: Some(name.to_string()),
            },
        )
        .await;
        assert!(reply.is_none());
    }

    for client in &clients {
        let reply = send(
            state,
            client,
            ClientMessage::ToggleReady {
                code: code.clone(),
                ready: true,
            },
        )
        .await;
        assert!(reply.is_none());
    }

    for client in clients.iter_mut() {
        client.drain();
    }
    (code, clients)
}

/// End-to-end: lobby, one round of clues, open voting, results, reset
#[tokio::test]
async fn test_full_game_flow() {
    let state = new_state();
    let settings = SettingsRequest {
        rounds: Some(1),
        category: Some("Food".to_string()),
        voting_mode: Some("open".to_string()),
        wait_seconds: Some(60),
    };
    let (code, mut clients) = lobby(&state, settings).await;

    let reply = send(
        &state,
        &clients[0],
        ClientMessage::StartGame { code: code.clone() },
    )
    .await;
    assert!(reply.is_none());

    // Every player gets exactly one private card; one of them is the impostor
    let mut impostor = None;
    let mut order = Vec::new();
    for client in clients.iter_mut() {
        let msgs = client.drain();
        assert!(matches!(msgs.first(), Some(ServerMessage::GameStarted { .. })));

        let cards: Vec<&Card> = msgs
            .iter()
            .filter_map(|m| match m {
                ServerMessage::PrivateCard { card } => Some(card),
                _ => None,
            })
            .collect();
        match cards.as_slice() {
            [Card::Impostor { hint }] => {
                assert_eq!(hint, "italian");
                assert!(impostor.replace(client.id.clone()).is_none());
            }
            [Card::Player { word }] => assert_eq!(word, "pizza"),
            other => panic!("Expected one card, got {:?}", other),
        }

        for msg in &msgs {
            if let ServerMessage::RoundStarted { round, order: o } = msg {
                assert_eq!(*round, 1);
                order = o.clone();
            }
        }
        assert!(msgs
            .iter()
            .any(|m| matches!(m, ServerMessage::TurnUpdate { .. })));
    }
    let impostor = impostor.expect("One player should be the impostor");
    assert_eq!(order.len(), 4);

    // Out-of-turn clue is rejected privately
    let not_first = clients.iter().find(|c| c.id != order[0]).unwrap();
    let reply = send(
        &state,
        not_first,
        ClientMessage::SubmitClue {
            code: code.clone(),
            text: "cheesy".to_string(),
        },
    )
    .await;
    assert_eq!(error_code(reply).as_deref(), Some("NOT_YOUR_TURN"));

    // Speaking the secret word is rejected
    let first = clients.iter().find(|c| c.id == order[0]).unwrap();
    let reply = send(
        &state,
        first,
        ClientMessage::SubmitClue {
            code: code.clone(),
            text: "Pizzeria".to_string(),
        },
    )
    .await;
    assert_eq!(error_code(reply).as_deref(), Some("LEAKS_SECRET"));

    let clues = ["round food", "cheesy", "oven baked", "slices"];
    for (speaker, text) in order.iter().zip(clues) {
        let client = clients.iter().find(|c| &c.id == speaker).unwrap();
        let reply = send(
            &state,
            client,
            ClientMessage::SubmitClue {
                code: code.clone(),
                text: text.to_string(),
            },
        )
        .await;
        assert!(reply.is_none(), "clue {:?} rejected: {:?}", text, reply);
    }

    let msgs = clients[1].drain();
    let accepted: Vec<&str> = msgs
        .iter()
        .filter_map(|m| match m {
            ServerMessage::ClueAccepted { clue, .. } => Some(clue.text.as_str()),
            _ => None,
        })
        .collect();
    assert_eq!(accepted, clues);
    assert!(matches!(
        msgs.last(),
        Some(ServerMessage::VotingStarted { .. })
    ));
    assert_eq!(state.timers.pending_count(), 0);
    for client in clients.iter_mut() {
        client.drain();
    }

    // Everyone votes for the impostor except the impostor
    let scapegoat = clients.iter().find(|c| c.id != impostor).unwrap().id.clone();
    for client in &clients {
        let target = if client.id == impostor {
            scapegoat.clone()
        } else {
            impostor.clone()
        };
        let reply = send(
            &state,
            client,
            ClientMessage::SubmitVote {
                code: code.clone(),
                target_id: target,
            },
        )
        .await;
        assert!(reply.is_none());
    }

    let msgs = clients[2].drain();
    let updates = msgs
        .iter()
        .filter(|m| matches!(m, ServerMessage::VoteUpdate { .. }))
        .count();
    assert_eq!(updates, 4);

    let results = match msgs.last() {
        Some(ServerMessage::GameResults(results)) => results.clone(),
        other => panic!("Expected results, got {:?}", other),
    };
    assert!(results.impostor_caught);
    assert_eq!(results.selected_id.as_deref(), Some(impostor.as_str()));
    assert_eq!(results.impostor_id.as_deref(), Some(impostor.as_str()));
    assert_eq!(results.secret_word, "pizza");
    assert_eq!(results.impostor_hint, "italian");
    assert_eq!(results.votes.len(), 4);
    assert_eq!(results.clues.len(), 4);

    // Back to the lobby
    let reply = send(
        &state,
        &clients[3],
        ClientMessage::ResetRoom { code: code.clone() },
    )
    .await;
    assert!(reply.is_none());

    let registry = state.registry.read().await;
    let room = registry.get(&code).unwrap();
    assert_eq!(room.phase, RoomPhase::Lobby);
    assert!(room.players.iter().all(|p| !p.is_ready));
    assert!(room.clues.is_empty());
}

#[tokio::test]
async fn test_start_preconditions() {
    let state = new_state();
    let mut clients = Vec::new();
    for _ in 0..4 {
        clients.push(Client::connect(&state).await);
    }

    send(
        &state,
        &clients[0],
        ClientMessage::CreateRoom {
            display_name: Some("Ada".to_string()),
            settings: SettingsRequest::default(),
        },
    )
    .await;
    let code = state.registry.read().await.room_of(&clients[0].id).cloned().unwrap();

    // Host alone
    let reply = send(&state, &clients[0], ClientMessage::StartGame { code: code.clone() }).await;
    assert_eq!(error_code(reply).as_deref(), Some("NOT_ENOUGH_PLAYERS"));

    for client in &clients[1..] {
        send(
            &state,
            client,
            ClientMessage::JoinRoom {
                code: code.clone(),
                display_name: None,
            },
        )
        .await;
    }

    // Nobody is ready yet
    let reply = send(&state, &clients[0], ClientMessage::StartGame { code: code.clone() }).await;
    assert_eq!(error_code(reply).as_deref(), Some("PLAYERS_NOT_READY"));

    // Only the host may start
    let reply = send(&state, &clients[1], ClientMessage::StartGame { code: code.clone() }).await;
    assert_eq!(error_code(reply).as_deref(), Some("NOT_HOST"));

    // Voting before the game is running
    let reply = send(
        &state,
        &clients[1],
        ClientMessage::SubmitVote {
            code: code.clone(),
            target_id: clients[2].id.clone(),
        },
    )
    .await;
    assert_eq!(error_code(reply).as_deref(), Some("WRONG_PHASE"));
}

#[tokio::test]
async fn test_join_rejected_mid_game() {
    let state = new_state();
    let (code, clients) = lobby(&state, SettingsRequest::default()).await;
    send(&state, &clients[0], ClientMessage::StartGame { code: code.clone() }).await;

    let late = Client::connect(&state).await;
    let reply = send(
        &state,
        &late,
        ClientMessage::JoinRoom {
            code: code.clone(),
            display_name: Some("Late".to_string()),
        },
    )
    .await;
    assert_eq!(error_code(reply).as_deref(), Some("GAME_IN_PROGRESS"));
}

#[tokio::test]
async fn test_host_leaving_hands_over_and_last_leave_destroys() {
    let state = new_state();
    let (code, mut clients) = lobby(&state, SettingsRequest::default()).await;

    state.disconnect(&clients[0].id).await;
    let msgs = clients[1].drain();
    match msgs.as_slice() {
        [ServerMessage::RoomUpdate { room }] => {
            assert_eq!(room.host_id.as_deref(), Some(clients[1].id.as_str()));
            assert_eq!(room.players.len(), 3);
        }
        other => panic!("Expected room update, got {:?}", other),
    }

    for client in &clients[1..] {
        let reply = send(&state, client, ClientMessage::LeaveRoom { code: None }).await;
        assert!(reply.is_none());
    }
    assert!(state.registry.read().await.get(&code).is_none());

    let late = Client::connect(&state).await;
    let reply = send(
        &state,
        &late,
        ClientMessage::JoinRoom {
            code,
            display_name: None,
        },
    )
    .await;
    assert_eq!(error_code(reply).as_deref(), Some("ROOM_NOT_FOUND"));
}
