//! The world service object.
//!
//! [`World`] is built once at startup and shared by reference with every
//! connection worker and the tick scheduler. It composes the two registries,
//! the broadcaster and the navigation gateway, and serializes membership
//! changes (joins, leaves, spawns, despawns) so that every login snapshot
//! agrees with the spawn broadcasts around it.

use crate::broadcast::{Broadcaster, DeliveryStats};
use crate::config::ServerConfig;
use crate::connection::ConnectionHandle;
use crate::error::WorldError;
use crate::messaging::{GameMessage, NavV3};
use crate::navigation::NavigationGateway;
use crate::registry::{Monster, MonsterRegistry, Player, PlayerMove, PlayerPosition, PlayerRegistry};
use crate::types::MonsterId;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

/// Authoritative world state plus the services that publish it.
#[derive(Debug)]
pub struct World {
    config: ServerConfig,
    broadcaster: Arc<Broadcaster>,
    players: PlayerRegistry,
    monsters: MonsterRegistry,
    navigation: NavigationGateway,
    membership: Mutex<()>,
}

impl World {
    /// Creates an empty world.
    pub fn new(config: ServerConfig, navigation: NavigationGateway) -> Self {
        let broadcaster = Arc::new(Broadcaster::new());
        Self {
            players: PlayerRegistry::new(broadcaster.clone(), config.player_max_health),
            monsters: MonsterRegistry::new(config.ai.clone()),
            broadcaster,
            navigation,
            config,
            membership: Mutex::new(()),
        }
    }

    /// Logs a player in and runs the spawn sequence.
    ///
    /// The new player receives their own spawn, the path preview (when
    /// navigation is enabled and a route exists), every monster, then every
    /// other player; the others are told about the newcomer.
    pub async fn add_player(&self, name: &str, age: u32, connection: ConnectionHandle) -> Result<Player, WorldError> {
        let _membership = self.membership.lock().await;
        let monsters = self.monsters.list_monsters().await;
        let preview = self.path_preview();
        self.players
            .add_player(name, age, connection, &monsters, preview)
            .await
    }

    /// Logs a player out and tells everyone left.
    pub async fn remove_player(&self, name: &str) -> Result<Player, WorldError> {
        let _membership = self.membership.lock().await;
        self.players.remove_player(name).await
    }

    pub async fn get_player(&self, name: &str) -> Result<Player, WorldError> {
        self.players.get_player(name).await
    }

    pub async fn list_players(&self) -> Vec<Player> {
        self.players.list_players().await
    }

    pub async fn list_positions(&self) -> Vec<PlayerPosition> {
        self.players.list_positions().await
    }

    /// Applies a client position update.
    ///
    /// Updates for unknown players are logged and dropped.
    pub async fn move_player(&self, update: PlayerMove) {
        let name = update.name.clone();
        if let Err(e) = self.players.move_player(update).await {
            warn!("⚠️ Ignoring position update for {}: {}", name, e);
        }
    }

    /// Spawns a monster and announces it.
    pub async fn add_monster(&self) -> Monster {
        let _membership = self.membership.lock().await;
        self.monsters.add_monster(&self.players).await
    }

    /// Despawns a monster and announces it.
    pub async fn remove_monster(&self, id: MonsterId) -> Result<Monster, WorldError> {
        let _membership = self.membership.lock().await;
        self.monsters.remove_monster(id, &self.players).await
    }

    pub async fn list_monsters(&self) -> Vec<Monster> {
        self.monsters.list_monsters().await
    }

    /// Path between the configured preview endpoints, if one can be found.
    pub fn path_preview(&self) -> Option<GameMessage> {
        let nav = &self.config.navigation;
        if !nav.preview_enabled || !self.navigation.is_enabled() {
            return None;
        }
        let [fx, fy, fz] = nav.preview_from;
        let [tx, ty, tz] = nav.preview_to;
        let from = NavV3 { x: fx, y: fy, z: fz };
        let to = NavV3 { x: tx, y: ty, z: tz };

        match self.navigation.find_path(from, to) {
            Ok(paths) => Some(GameMessage::PathTest { paths }),
            Err(e) => {
                debug!("🧭 No login path preview: {}", e);
                None
            }
        }
    }

    pub fn players(&self) -> &PlayerRegistry {
        &self.players
    }

    pub fn monsters(&self) -> &MonsterRegistry {
        &self.monsters
    }

    pub fn navigation(&self) -> &NavigationGateway {
        &self.navigation
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Outbound delivery counters.
    pub fn delivery_stats(&self) -> DeliveryStats {
        self.broadcaster.stats()
    }
}
