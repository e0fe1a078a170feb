//! Configuration management for the world server.
//!
//! This module handles loading, validation, and conversion of server configuration
//! from TOML files and command-line arguments.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::info;
use world_server::{config::default_patrol_path, AiConfig, NavigationConfig, Point, ServerConfig};

fn default_max_connections() -> usize {
    1000
}

/// Default tick interval for serde deserialization
fn default_tick_interval() -> u64 {
    16 // ~60 ticks per second
}

fn default_max_message_size() -> usize {
    64 * 1024
}

fn default_outbound_queue_capacity() -> usize {
    1024
}

fn default_detect_range() -> f32 { 10.0 }
fn default_attack_range() -> f32 { 2.0 }
fn default_attack_damage() -> i32 { 10 }
fn default_attack_cooldown_ms() -> u64 { 1000 }
fn default_chase_speed() -> f32 { 3.0 }
fn default_patrol_speed() -> f32 { 2.0 }
fn default_arrival_epsilon() -> f32 { 1.0 }
fn default_max_health() -> i32 { 100 }
fn default_initial_monsters() -> usize { 1 }

fn default_mesh_path() -> String {
    "NavMeshData.json".to_string()
}
fn default_preview_enabled() -> bool { true }
fn default_preview_from() -> [f32; 3] { [-230.0, 0.0, -291.0] }
fn default_preview_to() -> [f32; 3] { [235.0, 0.0, 180.0] }

fn default_log_level() -> String {
    "info".to_string()
}

/// Application configuration loaded from TOML file.
///
/// Every section may be omitted; missing values fall back to the defaults
/// the server ships with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Network and tick settings
    #[serde(default)]
    pub server: ServerSettings,
    /// Monster AI tuning
    #[serde(default)]
    pub ai: AiSettings,
    /// Player defaults
    #[serde(default)]
    pub players: PlayerSettings,
    /// Navigation mesh and login path preview
    #[serde(default)]
    pub navigation: NavigationSettings,
    /// Logging configuration settings
    #[serde(default)]
    pub logging: LoggingSettings,
}

/// Server-specific configuration settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    /// Network address to bind the server to (e.g., "127.0.0.1:8080")
    pub bind_address: String,
    /// Maximum number of concurrent client connections
    #[serde(default = "default_max_connections")]
    pub max_connections: usize,
    /// AI tick interval in milliseconds
    #[serde(default = "default_tick_interval")]
    pub tick_interval_ms: u64,
    /// Largest accepted frame payload in bytes
    #[serde(default = "default_max_message_size")]
    pub max_message_size: usize,
    /// Frames queued per connection before further frames to it are dropped
    #[serde(default = "default_outbound_queue_capacity")]
    pub outbound_queue_capacity: usize,
}

/// Monster behavior tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiSettings {
    #[serde(default = "default_detect_range")]
    pub detect_range: f32,
    #[serde(default = "default_attack_range")]
    pub attack_range: f32,
    #[serde(default = "default_attack_damage")]
    pub attack_damage: i32,
    #[serde(default = "default_attack_cooldown_ms")]
    pub attack_cooldown_ms: u64,
    #[serde(default = "default_chase_speed")]
    pub chase_speed: f32,
    #[serde(default = "default_patrol_speed")]
    pub patrol_speed: f32,
    #[serde(default = "default_arrival_epsilon")]
    pub arrival_epsilon: f32,
    #[serde(default = "default_max_health")]
    pub monster_max_health: i32,
    /// Monsters spawned when the server starts
    #[serde(default = "default_initial_monsters")]
    pub initial_monsters: usize,
    /// Waypoints shared by every spawned monster
    #[serde(default = "default_patrol_path")]
    pub patrol_path: Vec<Point>,
}

/// Player defaults.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerSettings {
    #[serde(default = "default_max_health")]
    pub max_health: i32,
}

/// Navigation mesh source and the path previewed at login.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NavigationSettings {
    /// JSON mesh file; navigation is disabled if it cannot be loaded
    #[serde(default = "default_mesh_path")]
    pub mesh_path: String,
    #[serde(default = "default_preview_enabled")]
    pub preview_enabled: bool,
    #[serde(default = "default_preview_from")]
    pub preview_from: [f32; 3],
    #[serde(default = "default_preview_to")]
    pub preview_to: [f32; 3],
}

/// Logging system configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSettings {
    /// Log level filter (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Whether to output logs in JSON format
    #[serde(default)]
    pub json_format: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            bind_address: "127.0.0.1:8080".to_string(),
            max_connections: default_max_connections(),
            tick_interval_ms: default_tick_interval(),
            max_message_size: default_max_message_size(),
            outbound_queue_capacity: default_outbound_queue_capacity(),
        }
    }
}

impl Default for AiSettings {
    fn default() -> Self {
        Self {
            detect_range: default_detect_range(),
            attack_range: default_attack_range(),
            attack_damage: default_attack_damage(),
            attack_cooldown_ms: default_attack_cooldown_ms(),
            chase_speed: default_chase_speed(),
            patrol_speed: default_patrol_speed(),
            arrival_epsilon: default_arrival_epsilon(),
            monster_max_health: default_max_health(),
            initial_monsters: default_initial_monsters(),
            patrol_path: default_patrol_path(),
        }
    }
}

impl Default for PlayerSettings {
    fn default() -> Self {
        Self {
            max_health: default_max_health(),
        }
    }
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self {
            mesh_path: default_mesh_path(),
            preview_enabled: default_preview_enabled(),
            preview_from: default_preview_from(),
            preview_to: default_preview_to(),
        }
    }
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json_format: false,
        }
    }
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// If the file doesn't exist, creates a default configuration file at the specified path
    /// and returns the default configuration.
    pub async fn load_from_file(path: &PathBuf) -> Result<Self, Box<dyn std::error::Error>> {
        if path.exists() {
            let content = tokio::fs::read_to_string(path).await?;
            let config: AppConfig = toml::from_str(&content)?;
            Ok(config)
        } else {
            let default_config = AppConfig::default();
            let toml_content = toml::to_string_pretty(&default_config)?;
            tokio::fs::write(path, toml_content).await?;
            info!("Created default configuration file: {}", path.display());
            Ok(default_config)
        }
    }

    /// Converts the application configuration to the world server configuration.
    pub fn to_server_config(&self) -> Result<ServerConfig, Box<dyn std::error::Error>> {
        Ok(ServerConfig {
            bind_address: self.server.bind_address.parse()?,
            max_connections: self.server.max_connections,
            tick_interval_ms: self.server.tick_interval_ms,
            max_message_size: self.server.max_message_size,
            outbound_queue_capacity: self.server.outbound_queue_capacity,
            ai: AiConfig {
                detect_range: self.ai.detect_range,
                attack_range: self.ai.attack_range,
                attack_damage: self.ai.attack_damage,
                attack_cooldown_ms: self.ai.attack_cooldown_ms,
                chase_speed: self.ai.chase_speed,
                patrol_speed: self.ai.patrol_speed,
                arrival_epsilon: self.ai.arrival_epsilon,
                monster_max_health: self.ai.monster_max_health,
                patrol_path: self.ai.patrol_path.clone(),
            },
            player_max_health: self.players.max_health,
            navigation: NavigationConfig {
                mesh_path: PathBuf::from(&self.navigation.mesh_path),
                preview_enabled: self.navigation.preview_enabled,
                preview_from: self.navigation.preview_from,
                preview_to: self.navigation.preview_to,
            },
        })
    }

    /// Validates the configuration for consistency and correctness.
    ///
    /// # Returns
    ///
    /// `Ok(())` if the configuration is valid, or an error string describing the issue.
    pub fn validate(&self) -> Result<(), String> {
        if self.server.bind_address.parse::<std::net::SocketAddr>().is_err() {
            return Err(format!(
                "Invalid bind address: {}",
                &self.server.bind_address
            ));
        }

        if self.server.tick_interval_ms == 0 {
            return Err("server.tick_interval_ms must be greater than 0".to_string());
        }
        if self.server.max_message_size == 0 {
            return Err("server.max_message_size must be greater than 0".to_string());
        }

        if self.server.outbound_queue_capacity == 0 {
            return Err("server.outbound_queue_capacity must be greater than 0".to_string());
        }

        let ai = &self.ai;
        for (name, value) in [
            ("detect_range", ai.detect_range),
            ("attack_range", ai.attack_range),
            ("chase_speed", ai.chase_speed),
            ("patrol_speed", ai.patrol_speed),
            ("arrival_epsilon", ai.arrival_epsilon),
        ] {
            if !(value > 0.0) {
                return Err(format!("ai.{name} must be a positive number, got {value}"));
            }
        }
        if ai.attack_range > ai.detect_range {
            return Err("ai.attack_range cannot exceed ai.detect_range".to_string());
        }
        if ai.attack_damage < 0 {
            return Err("ai.attack_damage cannot be negative".to_string());
        }
        if ai.monster_max_health <= 0 {
            return Err("ai.monster_max_health must be greater than 0".to_string());
        }
        if ai.patrol_path.is_empty() {
            return Err("ai.patrol_path needs at least one waypoint".to_string());
        }

        if self.players.max_health <= 0 {
            return Err("players.max_health must be greater than 0".to_string());
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            return Err(format!(
                "Invalid log level: {}. Must be one of: {valid_levels:?}",
                &self.logging.level
            ));
        }

        Ok(())
    }
}
