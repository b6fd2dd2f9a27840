mod registry;
mod timer;

pub use registry::{Dispatch, RoomRegistry};
pub use timer::TurnTimers;

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};

use crate::catalog::Catalog;
use crate::config::ServerConfig;
use crate::error::GameError;
use crate::protocol::ServerMessage;
use crate::types::*;

/// Shared application state
///
/// Every room mutation runs under the registry write lock, and the
/// resulting messages and timer commands are applied before the lock is
/// released. Rooms therefore see one operation at a time.
pub struct AppState {
    pub registry: RwLock<RoomRegistry>,
    /// Outbound channel per live connection
    pub connections: RwLock<HashMap<ConnectionId, mpsc::UnboundedSender<ServerMessage>>>,
    pub timers: TurnTimers,
    pub catalog: Arc<Catalog>,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(config: ServerConfig, catalog: Catalog) -> Self {
        Self {
            registry: RwLock::new(RoomRegistry::new()),
            connections: RwLock::new(HashMap::new()),
            timers: TurnTimers::default(),
            catalog: Arc::new(catalog),
            config: Arc::new(config),
        }
    }

    /// Register a new connection and return its id and message stream
    pub async fn connect(&self) -> (ConnectionId, mpsc::UnboundedReceiver<ServerMessage>) {
        let id = ulid::Ulid::new().to_string();
        let (tx, rx) = mpsc::unbounded_channel();
        self.connections.write().await.insert(id.clone(), tx);
        tracing::debug!(connection = %id, "Connection registered");
        (id, rx)
    }

    /// Forget a connection and remove it from its room
    pub async fn disconnect(self: &Arc<Self>, id: &str) {
        self.connections.write().await.remove(id);
        self.run(|registry| Ok(registry.disconnect(id)))
            .await
            .ok();
        tracing::debug!(connection = %id, "Connection closed");
    }

    /// Create a room and join it as host
    pub async fn create_room(
        self: &Arc<Self>,
        id: &str,
        display_name: &str,
        settings: RoomSettings,
    ) -> Result<RoomCode, GameError> {
        let mut created = None;
        self.run(|registry| {
            let code = registry.create_room(settings);
            let dispatch = registry.join_room(&code, id, display_name)?;
            created = Some(code);
            Ok(dispatch)
        })
        .await?;
        created.ok_or(GameError::RoomNotFound)
    }

    pub async fn join_room(
        self: &Arc<Self>,
        code: &str,
        id: &str,
        display_name: &str,
    ) -> Result<(), GameError> {
        self.run(|registry| registry.join_room(code, id, display_name))
            .await
    }

    pub async fn leave_room(self: &Arc<Self>, code: Option<&str>, id: &str) {
        self.run(|registry| Ok(registry.leave(code, id))).await.ok();
    }

    pub async fn toggle_ready(
        self: &Arc<Self>,
        code: &str,
        id: &str,
        ready: bool,
    ) -> Result<(), GameError> {
        self.run(|registry| registry.with_room(code, |room| room.toggle_ready(id, ready)))
            .await
    }

    pub async fn start_game(self: &Arc<Self>, code: &str, id: &str) -> Result<(), GameError> {
        let min_players = self.config.min_players;
        let catalog = self.catalog.clone();
        self.run(|registry| {
            registry.with_room(code, |room| room.start_game(id, min_players, &catalog))
        })
        .await
    }

    pub async fn submit_clue(
        self: &Arc<Self>,
        code: &str,
        id: &str,
        text: &str,
    ) -> Result<(), GameError> {
        self.run(|registry| registry.with_room(code, |room| room.submit_clue(id, text)))
            .await
    }

    pub async fn submit_vote(
        self: &Arc<Self>,
        code: &str,
        id: &str,
        target: &str,
    ) -> Result<(), GameError> {
        self.run(|registry| registry.with_room(code, |room| room.submit_vote(id, target)))
            .await
    }

    pub async fn reset_room(self: &Arc<Self>, code: &str, id: &str) -> Result<(), GameError> {
        self.run(|registry| registry.with_room(code, |room| room.reset(id)))
            .await
    }

    /// Called by a turn timer when it fires
    pub async fn expire_turn(self: &Arc<Self>, code: &RoomCode, generation: u64) {
        self.run(|registry| Ok(registry.expire_turn(code, generation)))
            .await
            .ok();
    }

    /// Send a message to a single connection
    pub async fn send_to(&self, id: &str, message: ServerMessage) {
        if let Some(tx) = self.connections.read().await.get(id) {
            // Receiver gone means the connection is closing
            let _ = tx.send(message);
        }
    }

    /// Run a registry operation and execute its dispatch while still
    /// holding the registry lock.
    async fn run<F>(self: &Arc<Self>, op: F) -> Result<(), GameError>
    where
        F: FnOnce(&mut RoomRegistry) -> Result<Dispatch, GameError>,
    {
        let mut registry = self.registry.write().await;
        let dispatch = op(&mut *registry)?;

        {
            let connections = self.connections.read().await;
            for (to, message) in dispatch.deliveries {
                if let Some(tx) = connections.get(&to) {
                    let _ = tx.send(message);
                }
            }
        }

        for (code, command) in dispatch.timers {
            self.timers.apply(self, &code, command);
        }

        drop(registry);
        Ok(())
    }
}
