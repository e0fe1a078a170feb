//! Utility functions and helper methods for the world server.
//!
//! This module provides convenient factory functions for creating server
//! instances with different configurations.

use crate::{config::ServerConfig, server::WorldServer};

/// Creates a new world server with default configuration.
///
/// # Example
///
/// ```rust
/// # #[tokio::main]
/// # async fn main() {
/// use world_server::create_server;
///
/// let server = create_server();
/// # }
/// ```
pub fn create_server() -> WorldServer {
    WorldServer::new(ServerConfig::default())
}

/// Creates a new world server with custom configuration.
///
/// # Example
///
/// ```rust
/// # #[tokio::main]
/// # async fn main() {
/// use world_server::{create_server_with_config, ServerConfig};
///
/// let config = ServerConfig {
///     bind_address: "0.0.0.0:9000".parse().unwrap(),
///     max_connections: 5000,
///     ..Default::default()
/// };
///
/// let server = create_server_with_config(config);
/// # }
/// ```
pub fn create_server_with_config(config: ServerConfig) -> WorldServer {
    WorldServer::new(config)
}
