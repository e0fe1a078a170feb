//! Main application logic and lifecycle management.
//!
//! This module contains the `Application` struct that orchestrates
//! server startup, monitoring, and shutdown.

use crate::{
    cli::CliArgs,
    config::AppConfig,
    logging::display_banner,
    signals::{setup_signal_handlers, setup_signal_handlers_silent},
};
use std::sync::Arc;
use tokio::time::{timeout, Duration};
use tracing::{error, info, warn};
use world_server::{connection::ConnectionManager, ShutdownState, World, WorldServer};

/// Main application struct.
///
/// The `Application` manages the complete lifecycle of the world server:
/// configuration loading, initial monster population, periodic health
/// reports and graceful shutdown.
pub struct Application {
    /// Loaded application configuration
    config: AppConfig,
    /// World server instance
    server: WorldServer,
}

impl Application {
    /// Creates a new application instance.
    ///
    /// # Process
    ///
    /// 1. Load configuration from file (creating default if missing)
    /// 2. Apply command-line argument overrides
    /// 3. Validate merged configuration
    /// 4. Display startup banner
    /// 5. Initialize the world server (this loads the navigation mesh)
    pub async fn new(args: CliArgs) -> Result<Self, Box<dyn std::error::Error>> {
        info!("🔧 Loading configuration from: {}", args.config_path.display());
        let config = AppConfig::load_from_file(&args.config_path).await?;
        let config = apply_overrides(config, args);

        if let Err(e) = config.validate() {
            return Err(format!("Configuration validation failed: {e}").into());
        } else {
            info!("✅ Configuration loaded and validated successfully");
        }

        display_banner();

        let server_config = config.to_server_config()?;
        let server = WorldServer::new(server_config);

        if server.world().navigation().is_enabled() {
            info!("🧭 Navigation mesh loaded from {}", config.navigation.mesh_path);
        } else {
            warn!("🧭 Navigation disabled - path queries will report unavailable");
        }

        Ok(Self { config, server })
    }

    /// Runs the application until a termination signal arrives, then shuts
    /// the server down in phases and reports final statistics.
    pub async fn run(self) -> Result<(), Box<dyn std::error::Error>> {
        info!("🌟 Starting World Server Application");
        self.log_configuration_summary();

        let world = self.server.world();
        let connections = self.server.connection_manager();

        for _ in 0..self.config.ai.initial_monsters {
            let monster = world.add_monster().await;
            info!("👾 Spawned monster {} at {}", monster.id, monster.position);
        }

        let config = self.config.clone();
        let shutdown_state = ShutdownState::new();
        let shutdown_state_for_server = shutdown_state.clone();

        let server_handle = {
            let server = self.server;
            tokio::spawn(async move {
                match server.start_with_shutdown_state(shutdown_state_for_server).await {
                    Ok(()) => {
                        info!("✅ Server completed successfully");
                    }
                    Err(e) => {
                        error!("❌ Server error: {:?}", e);
                        std::process::exit(1);
                    }
                }
            })
        };

        let monitoring_handle = {
            let world = world.clone();
            let connections = connections.clone();

            tokio::spawn(async move {
                let mut interval = tokio::time::interval(Duration::from_secs(60));
                let mut last_frames_enqueued = 0u64;

                loop {
                    interval.tick().await;

                    let stats = world.delivery_stats();
                    let frames_this_period = stats.frames_enqueued - last_frames_enqueued;
                    last_frames_enqueued = stats.frames_enqueued;

                    info!(
                        "📊 World Health - {} players | {} monsters | {} connections | {} frames/min | {} failed deliveries",
                        world.players().len().await,
                        world.monsters().len().await,
                        connections.connection_count().await,
                        frames_this_period,
                        stats.send_failures
                    );
                }
            })
        };

        info!("✅ World Server is now running!");
        info!("🎮 Ready to accept connections on {}", config.server.bind_address);
        info!("🔍 Health monitoring active - stats every 60 seconds");
        info!("🛑 Press Ctrl+C to gracefully shutdown");

        let signal_shutdown_state = setup_signal_handlers().await?;

        // second signal: no more grace
        tokio::spawn(async move {
            if let Err(e) = setup_signal_handlers_silent().await {
                error!("Failed to set up merciless shutdown signal handler: {e}");
                return;
            }

            warn!("Shutdown handler received again! I'll make this quick.");
            std::process::exit(1);
        });

        if signal_shutdown_state.is_shutdown_initiated() {
            shutdown_state.initiate_shutdown();
        }

        info!("🛑 Shutdown signal received, beginning graceful shutdown...");

        info!("📡 Phase 1: Stopping health monitoring...");
        monitoring_handle.abort();

        info!("⏳ Phase 2: Stopping accept loop and AI tick loop...");
        match timeout(Duration::from_secs(8), server_handle).await {
            Ok(Ok(())) => info!("✅ Server task completed gracefully"),
            Ok(Err(e)) => error!("❌ Server task failed: {e}"),
            Err(_) => warn!("⏰ Server task did not complete within timeout, proceeding with cleanup"),
        }
        shutdown_state.complete_shutdown();

        info!("⏳ Phase 3: Waiting for connections to close...");
        wait_for_connections(&connections).await;

        log_final_statistics(&world).await;

        info!("✅ World Server shutdown complete");
        Ok(())
    }

    fn log_configuration_summary(&self) {
        info!("📋 Configuration Summary:");
        info!("  🌐 Bind address: {}", self.config.server.bind_address);
        info!("  👥 Max connections: {}", self.config.server.max_connections);
        info!("  ⏱️ Tick interval: {}ms", self.config.server.tick_interval_ms);
        info!("  📬 Outbound queue: {} frames per connection", self.config.server.outbound_queue_capacity);
        info!(
            "  🧠 AI: detect {:.1} | attack {:.1} | chase {:.1}/tick | patrol {:.1}/tick",
            self.config.ai.detect_range,
            self.config.ai.attack_range,
            self.config.ai.chase_speed,
            self.config.ai.patrol_speed
        );
        info!("  🧭 Navigation mesh: {}", self.config.navigation.mesh_path);
    }
}

/// Merges command-line overrides into the file configuration.
fn apply_overrides(mut config: AppConfig, args: CliArgs) -> AppConfig {
    if let Some(bind_address) = args.bind_address {
        config.server.bind_address = bind_address;
    }

    if let Some(navmesh) = args.navmesh_path {
        config.navigation.mesh_path = navmesh.to_string_lossy().to_string();
    }

    if let Some(log_level) = args.log_level {
        config.logging.level = log_level;
    }

    if let Some(tick_ms) = args.tick_interval_ms {
        config.server.tick_interval_ms = tick_ms;
    }

    if args.json_logs {
        config.logging.json_format = true;
    }

    config
}

async fn wait_for_connections(connections: &Arc<ConnectionManager>) {
    for _ in 0..10 {
        if connections.connection_count().await == 0 {
            return;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    warn!(
        "⏰ {} connections still open after shutdown",
        connections.connection_count().await
    );
}

async fn log_final_statistics(world: &World) {
    let stats = world.delivery_stats();
    info!("📊 Final Statistics:");
    info!("  - Players still registered: {}", world.players().len().await);
    info!("  - Monsters alive: {}", world.monsters().len().await);
    info!("  - Frames delivered: {}", stats.frames_enqueued);
    info!("  - Failed deliveries: {}", stats.send_failures);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_cli_overrides_win_over_file() {
        let args = CliArgs::try_parse_from([
            "world",
            "--bind",
            "0.0.0.0:9100",
            "--navmesh",
            "arena.json",
            "--log-level",
            "warn",
            "--tick-ms",
            "20",
            "--json-logs",
        ])
        .unwrap();

        let config = apply_overrides(AppConfig::default(), args);
        assert_eq!(config.server.bind_address, "0.0.0.0:9100");
        assert_eq!(config.navigation.mesh_path, "arena.json");
        assert_eq!(config.logging.level, "warn");
        assert_eq!(config.server.tick_interval_ms, 20);
        assert!(config.logging.json_format);
    }

    #[test]
    fn test_no_overrides_keeps_file_values() {
        let args = CliArgs::try_parse_from(["world"]).unwrap();
        let mut file = AppConfig::default();
        file.server.tick_interval_ms = 40;

        let config = apply_overrides(file, args);
        assert_eq!(config.server.tick_interval_ms, 40);
        assert_eq!(config.server.bind_address, "127.0.0.1:8080");
    }

    #[tokio::test]
    async fn test_new_rejects_invalid_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let path: PathBuf = dir.path().join("config.toml");
        tokio::fs::write(&path, "[ai]\nattack_range = 50.0\n").await.unwrap();

        let args = CliArgs::try_parse_from(["world", "--config", path.to_str().unwrap()]).unwrap();
        let err = Application::new(args).await.err().expect("validation should fail");
        assert!(err.to_string().contains("attack_range"));
    }
}
