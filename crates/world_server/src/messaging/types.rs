//! Message type definitions for client-server communication.
//!
//! Every frame payload carries exactly one [`GameMessage`]. The enum is
//! internally tagged, so the encoded form names its variant:
//!
//! ```json
//! { "type": "spawn_monster", "monster_id": 1, "x": 0.0, "z": 0.0 }
//! ```

use crate::types::MonsterId;
use serde::{Deserialize, Serialize};

/// One vertex of a previewed navigation path, in client coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NavV3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

/// All message kinds exchanged over the wire, in both directions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum GameMessage {
    /// Client → server: first message of every connection
    Login { name: String, age: u32 },

    /// Server → new player: your own avatar has spawned
    SpawnMyPlayer {
        x: f32,
        y: f32,
        z: f32,
        rotation_y: f32,
    },

    /// Server → player: another player's avatar is present
    SpawnOtherPlayer {
        player_id: String,
        x: f32,
        y: f32,
        z: f32,
        rotation_y: f32,
    },

    /// Server → player: a monster is present
    SpawnMonster { monster_id: MonsterId, x: f32, z: f32 },

    /// Server → player: a monster was removed from the world
    DespawnMonster { monster_id: MonsterId },

    /// Server → player: a monster moved
    MonsterMove { monster_id: MonsterId, x: f32, z: f32 },

    /// Both directions: a player's position update
    PlayerPosition {
        player_id: String,
        x: f32,
        y: f32,
        z: f32,
        rotation_y: f32,
    },

    /// Server → player: a monster hit a player
    PlayerDamaged {
        player_id: String,
        monster_id: MonsterId,
        damage: i32,
        health: i32,
    },

    /// Client → server: leave the world; server → player: someone left
    Logout { player_id: String },

    /// Server → new player: a sample path computed on the navigation mesh
    PathTest { paths: Vec<NavV3> },
}

impl GameMessage {
    /// Short variant name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            GameMessage::Login { .. } => "login",
            GameMessage::SpawnMyPlayer { .. } => "spawn_my_player",
            GameMessage::SpawnOtherPlayer { .. } => "spawn_other_player",
            GameMessage::SpawnMonster { .. } => "spawn_monster",
            GameMessage::DespawnMonster { .. } => "despawn_monster",
            GameMessage::MonsterMove { .. } => "monster_move",
            GameMessage::PlayerPosition { .. } => "player_position",
            GameMessage::PlayerDamaged { .. } => "player_damaged",
            GameMessage::Logout { .. } => "logout",
            GameMessage::PathTest { .. } => "path_test",
        }
    }
}
