//! Core world server implementation.
//!
//! This module contains the main `WorldServer` struct, which binds the TCP
//! listener, runs the accept loop, spawns one worker per connection and
//! drives the AI tick loop until shutdown.

use super::{handlers::handle_connection, ShutdownState};
use crate::{
    ai::TickScheduler,
    config::ServerConfig,
    connection::ConnectionManager,
    error::{ServerError, WorldError},
    navigation::NavigationGateway,
    world::World,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};

/// The core world server structure.
///
/// `WorldServer` owns the shared [`World`] and the [`ConnectionManager`] and
/// wires them to the network.
///
/// # Architecture
///
/// * **Accept loop**: one task accepting TCP connections up to `max_connections`
/// * **Connection workers**: one task per client reading frames and routing them
/// * **Outbound writers**: one task per client draining its ordered queue
/// * **AI tick loop**: one task evaluating every monster each tick
pub struct WorldServer {
    /// Server configuration settings
    config: ServerConfig,

    /// Shared world state
    world: Arc<World>,

    /// Manager for client connections
    connection_manager: Arc<ConnectionManager>,

    /// Shutdown state used by [`WorldServer::start`] and [`WorldServer::shutdown`]
    shutdown_state: ShutdownState,
}

impl WorldServer {
    /// Creates a new world server, loading the navigation mesh named in the
    /// configuration.
    ///
    /// A missing or malformed mesh disables navigation; the server still starts.
    pub fn new(config: ServerConfig) -> Self {
        let navigation = NavigationGateway::load(&config.navigation.mesh_path);
        Self::with_navigation(config, navigation)
    }

    /// Creates a new world server around an already prepared gateway.
    pub fn with_navigation(config: ServerConfig, navigation: NavigationGateway) -> Self {
        let world = Arc::new(World::new(config.clone(), navigation));
        let connection_manager = Arc::new(ConnectionManager::with_queue_capacity(config.outbound_queue_capacity));
        Self {
            config,
            world,
            connection_manager,
            shutdown_state: ShutdownState::new(),
        }
    }

    /// Starts the server and runs until [`WorldServer::shutdown`] is called.
    pub async fn start(&self) -> Result<(), ServerError> {
        self.start_with_shutdown_state(self.shutdown_state.clone()).await
    }

    /// Starts the server and runs until `shutdown_state` is initiated.
    ///
    /// # Server Lifecycle
    ///
    /// 1. Bind the listener on the configured address
    /// 2. Start the AI tick loop
    /// 3. Accept connections until shutdown
    /// 4. Close every connection and wait for the tick loop to stop
    pub async fn start_with_shutdown_state(&self, shutdown_state: ShutdownState) -> Result<(), ServerError> {
        let listener = self.bind().await?;
        self.serve(listener, shutdown_state).await
    }

    /// Binds the configured address.
    pub async fn bind(&self) -> Result<TcpListener, ServerError> {
        TcpListener::bind(self.config.bind_address)
            .await
            .map_err(|e| ServerError::Network(format!("bind {} failed: {e}", self.config.bind_address)))
    }

    /// Runs the tick loop and the accept loop on an already bound listener.
    pub async fn serve(&self, listener: TcpListener, shutdown_state: ShutdownState) -> Result<(), ServerError> {
        let local_addr = listener.local_addr()?;
        info!("🚀 World server listening on {}", local_addr);

        let scheduler = TickScheduler::new(self.world.clone(), self.config.tick_interval());
        let tick_task = tokio::spawn(scheduler.run(shutdown_state.clone()));

        loop {
            let accepted = tokio::select! {
                accepted = listener.accept() => accepted,
                _ = shutdown_state.wait() => {
                    info!("🛑 Accept loop stopping - shutdown initiated");
                    break;
                }
            };

            let (stream, addr) = match accepted {
                Ok(pair) => pair,
                Err(e) => {
                    error!("Failed to accept connection: {}", e);
                    continue;
                }
            };

            if self.connection_manager.connection_count().await >= self.config.max_connections {
                warn!(
                    "⚠️ Rejecting {}: connection limit of {} reached",
                    addr, self.config.max_connections
                );
                drop(stream);
                continue;
            }
            if let Err(e) = stream.set_nodelay(true) {
                warn!("⚠️ Could not disable Nagle for {}: {}", addr, e);
            }

            let connection_manager = self.connection_manager.clone();
            let world = self.world.clone();
            let shutdown = shutdown_state.clone();
            tokio::spawn(async move {
                if let Err(e) = handle_connection(stream, addr, connection_manager, world, shutdown).await {
                    error!("Connection error: {:?}", e);
                }
            });
        }

        info!("🧹 Performing server cleanup...");
        for name in self.connection_manager.close_all().await {
            match self.world.remove_player(&name).await {
                Ok(_) | Err(WorldError::PlayerNotFound(_)) => {}
                Err(e) => warn!("⚠️ Failed to remove player {}: {}", name, e),
            }
        }
        if let Err(e) = tick_task.await {
            error!("AI tick task ended abnormally: {}", e);
        }
        info!("✅ Server stopped");
        Ok(())
    }

    /// Initiates server shutdown.
    pub async fn shutdown(&self) -> Result<(), ServerError> {
        info!("🛑 Shutting down server...");
        self.shutdown_state.initiate_shutdown();
        Ok(())
    }

    /// Shared world state.
    pub fn world(&self) -> Arc<World> {
        self.world.clone()
    }

    /// Connection bookkeeping.
    pub fn connection_manager(&self) -> Arc<ConnectionManager> {
        self.connection_manager.clone()
    }

    /// The configuration the server was built with.
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }
}
