//! Player registry.
//!
//! Canonical state of every logged-in player, keyed by unique name. All
//! mutations take the write lock; every enumeration done for a broadcast
//! happens under the same lock, so a send never races a join or a leave.

use super::Monster;
use crate::broadcast::Broadcaster;
use crate::connection::ConnectionHandle;
use crate::error::WorldError;
use crate::messaging::GameMessage;
use crate::types::{MonsterId, PlayerId, Point};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// A logged-in player.
///
/// Copies handed out by the registry are snapshots; changing them has no
/// effect on the registry.
#[derive(Debug, Clone)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub age: u32,
    pub connection: ConnectionHandle,
    pub position: Point,
    /// Display-only vertical coordinate
    pub vertical_offset: f32,
    pub rotation_y: f32,
    pub health: i32,
    pub max_health: i32,
}

impl Player {
    /// Sets health, clamped to `[0, max_health]`.
    pub fn set_health(&mut self, health: i32) {
        self.health = health.clamp(0, self.max_health);
    }

    /// Whether the player's health is exhausted.
    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }

    fn spawn_self_message(&self) -> GameMessage {
        GameMessage::SpawnMyPlayer {
            x: self.position.x,
            y: self.vertical_offset,
            z: self.position.z,
            rotation_y: self.rotation_y,
        }
    }

    fn spawn_other_message(&self) -> GameMessage {
        GameMessage::SpawnOtherPlayer {
            player_id: self.name.clone(),
            x: self.position.x,
            y: self.vertical_offset,
            z: self.position.z,
            rotation_y: self.rotation_y,
        }
    }
}

/// Position of one player as seen by target detection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlayerPosition {
    pub id: PlayerId,
    pub position: Point,
}

/// A position update reported by a client.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayerMove {
    pub name: String,
    pub position: Point,
    pub vertical_offset: f32,
    pub rotation_y: f32,
}

/// Registry of logged-in players.
#[derive(Debug)]
pub struct PlayerRegistry {
    players: RwLock<BTreeMap<String, Player>>,
    next_id: AtomicU64,
    max_health: i32,
    broadcaster: Arc<Broadcaster>,
}

impl PlayerRegistry {
    /// Creates an empty registry whose players start with `max_health`.
    pub fn new(broadcaster: Arc<Broadcaster>, max_health: i32) -> Self {
        Self {
            players: RwLock::new(BTreeMap::new()),
            next_id: AtomicU64::new(1),
            max_health,
            broadcaster,
        }
    }

    /// Registers a player and runs the login spawn sequence.
    ///
    /// In order, under the registry's write lock:
    /// 1. the new player gets their own spawn confirmation,
    /// 2. then `path_preview`, when one is given,
    /// 3. then one spawn event per monster in `monsters`,
    /// 4. then one spawn-as-other event per existing player,
    /// 5. and every existing player gets a spawn-as-other for the new player.
    ///
    /// # Errors
    ///
    /// [`WorldError::NameTaken`] if a live player already uses `name`.
    pub async fn add_player(
        &self,
        name: &str,
        age: u32,
        connection: ConnectionHandle,
        monsters: &[Monster],
        path_preview: Option<GameMessage>,
    ) -> Result<Player, WorldError> {
        let mut players = self.players.write().await;
        if players.contains_key(name) {
            return Err(WorldError::NameTaken(name.to_string()));
        }

        let player = Player {
            id: PlayerId(self.next_id.fetch_add(1, Ordering::Relaxed)),
            name: name.to_string(),
            age,
            connection,
            position: Point::default(),
            vertical_offset: 0.0,
            rotation_y: 0.0,
            health: self.max_health,
            max_health: self.max_health,
        };

        let own = &player.connection;
        self.broadcaster.send_to(own, &player.spawn_self_message());

        if let Some(preview) = path_preview {
            self.broadcaster.send_to(own, &preview);
        }

        for monster in monsters {
            self.broadcaster.send_to(own, &monster.spawn_message());
        }

        for other in players.values() {
            self.broadcaster.send_to(own, &other.spawn_other_message());
        }

        let announced = self.broadcaster.broadcast(
            players.values().map(|p| &p.connection),
            &player.spawn_other_message(),
        );

        players.insert(player.name.clone(), player.clone());
        info!(
            "👋 Player {} ({}) logged in, announced to {} players",
            player.name, player.id, announced
        );
        Ok(player)
    }

    /// Removes a player and tells everyone left.
    ///
    /// # Errors
    ///
    /// [`WorldError::PlayerNotFound`] if nobody is registered under `name`.
    pub async fn remove_player(&self, name: &str) -> Result<Player, WorldError> {
        let mut players = self.players.write().await;
        let removed = players
            .remove(name)
            .ok_or_else(|| WorldError::PlayerNotFound(name.to_string()))?;

        let message = GameMessage::Logout {
            player_id: removed.name.clone(),
        };
        self.broadcaster
            .broadcast(players.values().map(|p| &p.connection), &message);

        info!("👋 Player {} ({}) logged out", removed.name, removed.id);
        Ok(removed)
    }

    /// Looks a player up by name.
    pub async fn get_player(&self, name: &str) -> Result<Player, WorldError> {
        self.players
            .read()
            .await
            .get(name)
            .cloned()
            .ok_or_else(|| WorldError::PlayerNotFound(name.to_string()))
    }

    /// Copies of all live players, in name order.
    pub async fn list_players(&self) -> Vec<Player> {
        self.players.read().await.values().cloned().collect()
    }

    /// Positional snapshot of all live players, in name order.
    pub async fn list_positions(&self) -> Vec<PlayerPosition> {
        self.players
            .read()
            .await
            .values()
            .map(|p| PlayerPosition {
                id: p.id,
                position: p.position,
            })
            .collect()
    }

    /// Number of live players.
    pub async fn len(&self) -> usize {
        self.players.read().await.len()
    }

    /// Whether no player is logged in.
    pub async fn is_empty(&self) -> bool {
        self.players.read().await.is_empty()
    }

    /// Applies a client position update and relays it to everyone else.
    ///
    /// # Errors
    ///
    /// [`WorldError::PlayerNotFound`] if the update names an unknown player.
    pub async fn move_player(&self, update: PlayerMove) -> Result<(), WorldError> {
        let mut players = self.players.write().await;
        let player = players
            .get_mut(&update.name)
            .ok_or_else(|| WorldError::PlayerNotFound(update.name.clone()))?;

        player.position = update.position;
        player.vertical_offset = update.vertical_offset;
        player.rotation_y = update.rotation_y;
        let mover = player.connection.id();

        let message = GameMessage::PlayerPosition {
            player_id: update.name,
            x: update.position.x,
            y: update.vertical_offset,
            z: update.position.z,
            rotation_y: update.rotation_y,
        };
        let relayed = self.broadcaster.broadcast_except(
            players.values().map(|p| &p.connection),
            mover,
            &message,
        );
        debug!("🏃 Relayed position update to {} players", relayed);
        Ok(())
    }

    /// Applies monster damage to the player with `id` and announces it.
    ///
    /// # Returns
    ///
    /// The player's remaining health, or `None` if the player has left.
    pub async fn apply_damage(&self, id: PlayerId, monster_id: MonsterId, damage: i32) -> Option<i32> {
        let mut players = self.players.write().await;
        let Some(player) = players.values_mut().find(|p| p.id == id) else {
            warn!("⚠️ Monster {} hit player {} who is no longer here", monster_id, id);
            return None;
        };

        player.set_health(player.health - damage);
        let health = player.health;
        let message = GameMessage::PlayerDamaged {
            player_id: player.name.clone(),
            monster_id,
            damage,
            health,
        };
        self.broadcaster
            .broadcast(players.values().map(|p| &p.connection), &message);
        Some(health)
    }

    /// Sends a message to every live player.
    pub async fn broadcast_all(&self, message: &GameMessage) -> usize {
        let players = self.players.read().await;
        self.broadcaster
            .broadcast(players.values().map(|p| &p.connection), message)
    }
}
