//! Connection manager for tracking and managing client connections.
//!
//! This module provides the central bookkeeping for all open sockets:
//! connection ids, remote addresses, the player each connection logged in
//! as, and the writer task behind each outbound queue.

use super::{
    client::{ClientConnection, DEFAULT_OUTBOUND_CAPACITY},
    ConnectionHandle, ConnectionId,
};
use crate::messaging::Frame;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::io::AsyncWrite;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// Central manager for all client connections.
///
/// # Architecture
///
/// * Uses `RwLock<HashMap>` for thread-safe connection storage
/// * Implements atomic connection ID generation
/// * Owns one outbound writer task per connection
/// * Maps connections to the player name they logged in with
#[derive(Debug)]
pub struct ConnectionManager {
    /// Map of connection ID to client connection information
    connections: Arc<RwLock<HashMap<ConnectionId, ClientConnection>>>,

    /// Atomic counter for generating unique connection IDs
    next_id: AtomicUsize,

    /// Bound on each connection's outbound queue
    queue_capacity: usize,
}

impl ConnectionManager {
    /// Creates a new, empty connection manager.
    pub fn new() -> Self {
        Self::with_queue_capacity(DEFAULT_OUTBOUND_CAPACITY)
    }

    /// Creates a manager whose connections queue at most `queue_capacity` frames.
    pub fn with_queue_capacity(queue_capacity: usize) -> Self {
        Self {
            connections: Arc::new(RwLock::new(HashMap::new())),
            next_id: AtomicUsize::new(1),
            queue_capacity,
        }
    }

    /// Registers a connection and starts draining its outbound queue into `writer`.
    ///
    /// # Returns
    ///
    /// The handle producers use to enqueue frames for this connection.
    pub async fn add_connection<W>(&self, remote_addr: SocketAddr, writer: W) -> ConnectionHandle
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let connection_id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (handle, writer_task) = ConnectionHandle::spawn_writer(connection_id, self.queue_capacity, writer);
        let connection = ClientConnection::new(remote_addr, handle.clone(), writer_task);

        let mut connections = self.connections.write().await;
        connections.insert(connection_id, connection);
        info!("🔗 Connection {} from {}", connection_id, remote_addr);
        handle
    }

    /// Removes a connection and drops whatever is still queued for it.
    ///
    /// # Returns
    ///
    /// The name of the player that was logged in over the connection, if any.
    pub async fn remove_connection(&self, connection_id: ConnectionId) -> Option<String> {
        let removed = {
            let mut connections = self.connections.write().await;
            connections.remove(&connection_id)
        };

        let connection = removed?;
        info!(
            "❌ Connection {} from {} disconnected after {:.1}s",
            connection_id,
            connection.remote_addr,
            connection.connected_at.elapsed().as_secs_f64()
        );
        let player_name = connection.player_name.clone();
        connection.close();
        player_name
    }

    /// Associates a player name with a connection after a successful login.
    pub async fn set_player_name(&self, connection_id: ConnectionId, name: &str) {
        let mut connections = self.connections.write().await;
        if let Some(connection) = connections.get_mut(&connection_id) {
            connection.player_name = Some(name.to_string());
        }
    }

    /// Forgets the player association, e.g. after an explicit logout.
    pub async fn clear_player_name(&self, connection_id: ConnectionId) -> Option<String> {
        let mut connections = self.connections.write().await;
        connections
            .get_mut(&connection_id)
            .and_then(|c| c.player_name.take())
    }

    /// Retrieves the player name associated with a connection.
    pub async fn get_player_name(&self, connection_id: ConnectionId) -> Option<String> {
        let connections = self.connections.read().await;
        connections
            .get(&connection_id)
            .and_then(|c| c.player_name.clone())
    }

    /// Queues a frame for one connection.
    pub async fn send_to_connection(&self, connection_id: ConnectionId, frame: Frame) {
        let connections = self.connections.read().await;
        match connections.get(&connection_id) {
            Some(connection) => {
                if let Err(e) = connection.handle.send(frame) {
                    warn!("⚠️ Dropped frame for connection {}: {}", connection_id, e);
                }
            }
            None => warn!("⚠️ No connection {} to send to", connection_id),
        }
    }

    /// Number of currently open connections.
    pub async fn connection_count(&self) -> usize {
        self.connections.read().await.len()
    }

    /// Drops every connection, e.g. during shutdown.
    ///
    /// # Returns
    ///
    /// The names of the players that were still logged in, so the caller
    /// can take them out of the world.
    pub async fn close_all(&self) -> Vec<String> {
        let drained: Vec<ClientConnection> = {
            let mut connections = self.connections.write().await;
            connections.drain().map(|(_, c)| c).collect()
        };

        let mut player_names = Vec::new();
        for mut connection in drained {
            if let Some(name) = connection.player_name.take() {
                player_names.push(name);
            }
            connection.close();
        }
        player_names
    }
}

impl Default for ConnectionManager {
    fn default() -> Self {
        Self::new()
    }
}
