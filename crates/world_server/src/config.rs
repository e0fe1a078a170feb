//! Server configuration types and defaults.
//!
//! This module contains the server configuration structure and default values
//! used to initialize and customize the world server behavior.

use crate::connection::client::DEFAULT_OUTBOUND_CAPACITY;
use crate::types::Point;
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Configuration structure for the world server.
///
/// Contains all necessary parameters to configure server behavior including
/// network settings, AI tuning, player defaults and the navigation mesh source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// The socket address to bind the server to
    pub bind_address: SocketAddr,

    /// Maximum number of concurrent connections allowed
    pub max_connections: usize,

    /// AI tick interval in milliseconds
    pub tick_interval_ms: u64,

    /// Maximum payload size of a single frame in bytes
    pub max_message_size: usize,

    /// Frames a connection may have queued before further frames to it are dropped
    pub outbound_queue_capacity: usize,

    /// Monster AI tuning
    pub ai: AiConfig,

    /// Maximum health assigned to a player at login
    pub player_max_health: i32,

    /// Navigation mesh source and login path preview
    pub navigation: NavigationConfig,
}

/// Tuning parameters for the monster behavior tree.
///
/// Distances are in world units, speeds in world units per tick.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    /// Range inside which a latched target is pursued
    pub detect_range: f32,

    /// Range inside which a latched target is attacked
    pub attack_range: f32,

    /// Damage applied by one successful attack
    pub attack_damage: i32,

    /// Minimum time between two successful attacks of the same monster
    pub attack_cooldown_ms: u64,

    /// Distance covered per tick while chasing
    pub chase_speed: f32,

    /// Distance covered per tick while patrolling
    pub patrol_speed: f32,

    /// Distance under which a waypoint or target counts as reached
    pub arrival_epsilon: f32,

    /// Maximum (and initial) health of a spawned monster
    pub monster_max_health: i32,

    /// Cyclic waypoint list attached to every spawned monster
    pub patrol_path: Vec<Point>,
}

/// Navigation mesh location and the path previewed to players at login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationConfig {
    /// JSON document with `vertices` and `triangles`
    pub mesh_path: PathBuf,

    /// Whether a path preview is sent to players after their spawn
    pub preview_enabled: bool,

    /// Preview start, in client coordinates `[x, y, z]`
    pub preview_from: [f32; 3],

    /// Preview end, in client coordinates `[x, y, z]`
    pub preview_to: [f32; 3],
}

impl ServerConfig {
    /// The tick interval as a [`Duration`].
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl AiConfig {
    /// The attack cooldown as a [`Duration`].
    pub fn attack_cooldown(&self) -> Duration {
        Duration::from_millis(self.attack_cooldown_ms)
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 8080)),
            max_connections: 1000,
            tick_interval_ms: 16, // ~60 ticks per second
            max_message_size: 64 * 1024, // 64KB
            outbound_queue_capacity: DEFAULT_OUTBOUND_CAPACITY,
            ai: AiConfig::default(),
            player_max_health: 100,
            navigation: NavigationConfig::default(),
        }
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            detect_range: 10.0,
            attack_range: 2.0,
            attack_damage: 10,
            attack_cooldown_ms: 1000,
            chase_speed: 3.0,
            patrol_speed: 2.0,
            arrival_epsilon: 1.0,
            monster_max_health: 100,
            patrol_path: default_patrol_path(),
        }
    }
}

impl Default for NavigationConfig {
    fn default() -> Self {
        Self {
            mesh_path: PathBuf::from("NavMeshData.json"),
            preview_enabled: true,
            preview_from: [-230.0, 0.0, -291.0],
            preview_to: [235.0, 0.0, 180.0],
        }
    }
}

/// Square loop around the spawn point.
pub fn default_patrol_path() -> Vec<Point> {
    vec![
        Point::new(0.0, 0.0),
        Point::new(10.0, 0.0),
        Point::new(10.0, 10.0),
        Point::new(0.0, 10.0),
    ]
}
