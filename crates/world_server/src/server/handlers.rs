//! Connection handling logic for framed TCP clients.
//!
//! This module contains the per-connection worker: it registers the
//! connection, reads length-prefixed frames, routes each decoded message to
//! the world and removes the player when the connection ends.

use super::ShutdownState;
use crate::connection::{ConnectionHandle, ConnectionManager};
use crate::error::{FrameError, ServerError, WorldError};
use crate::messaging::{read_message, GameMessage};
use crate::registry::PlayerMove;
use crate::types::Point;
use crate::world::World;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::{debug, info, warn};

/// What the read loop should do after a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Close,
}

/// Handles a single client connection from establishment to cleanup.
///
/// # Connection Flow
///
/// 1. Register the connection and start its outbound writer
/// 2. Read frames until EOF, a fatal frame error, logout or shutdown
/// 3. Route `Login`, `PlayerPosition` and `Logout` to the world
/// 4. Remove the player that was logged in over it, if any
/// 5. Remove the connection, dropping anything still queued for it
///
/// Malformed payloads are skipped; the length prefix keeps the stream in
/// sync, so the next frame is still readable.
pub async fn handle_connection<S>(
    stream: S,
    addr: SocketAddr,
    connections: Arc<ConnectionManager>,
    world: Arc<World>,
    shutdown: ShutdownState,
) -> Result<(), ServerError>
where
    S: AsyncRead + AsyncWrite + Send + 'static,
{
    let (mut reader, writer) = tokio::io::split(stream);
    let handle = connections.add_connection(addr, writer).await;
    let connection_id = handle.id();
    let max_message_size = world.config().max_message_size;

    loop {
        let message = tokio::select! {
            message = read_message(&mut reader, max_message_size) => message,
            _ = shutdown.wait() => {
                debug!("🛑 Connection {} closing for shutdown", connection_id);
                break;
            }
        };

        match message {
            Ok(message) => {
                if route_message(message, &handle, &connections, &world).await == Flow::Close {
                    break;
                }
            }
            Err(e) if e.is_disconnect() => {
                debug!("🔌 Connection {} closed by peer", connection_id);
                break;
            }
            Err(FrameError::Serialization(e)) => {
                warn!("⚠️ Skipping malformed frame from connection {}: {}", connection_id, e);
            }
            Err(e) => {
                warn!("⚠️ Dropping connection {}: {}", connection_id, e);
                break;
            }
        }
    }

    // The player leaves the world while its queue is still open
    if let Some(name) = connections.clear_player_name(connection_id).await {
        match world.remove_player(&name).await {
            Ok(_) | Err(WorldError::PlayerNotFound(_)) => {}
            Err(e) => warn!("⚠️ Failed to remove player {}: {}", name, e),
        }
    }
    connections.remove_connection(connection_id).await;
    Ok(())
}

/// Applies one client message to the world.
async fn route_message(
    message: GameMessage,
    handle: &ConnectionHandle,
    connections: &ConnectionManager,
    world: &World,
) -> Flow {
    let connection_id = handle.id();
    let session = connections.get_player_name(connection_id).await;
    debug!("📨 Connection {} sent {}", connection_id, message.kind());

    match (message, session) {
        (GameMessage::Login { name, age }, None) => {
            match world.add_player(&name, age, handle.clone()).await {
                Ok(player) => {
                    connections.set_player_name(connection_id, &player.name).await;
                }
                Err(e) => warn!("⚠️ Login from connection {} rejected: {}", connection_id, e),
            }
            Flow::Continue
        }
        (GameMessage::Login { name, .. }, Some(current)) => {
            warn!(
                "⚠️ Connection {} already logged in as {}, ignoring login as {}",
                connection_id, current, name
            );
            Flow::Continue
        }
        (
            GameMessage::PlayerPosition {
                player_id,
                x,
                y,
                z,
                rotation_y,
            },
            Some(name),
        ) => {
            if player_id != name {
                debug!(
                    "Connection {} reported position for {} as {}",
                    connection_id, player_id, name
                );
            }
            world
                .move_player(PlayerMove {
                    name,
                    position: Point::new(x, z),
                    vertical_offset: y,
                    rotation_y,
                })
                .await;
            Flow::Continue
        }
        (GameMessage::Logout { .. }, Some(name)) => {
            connections.clear_player_name(connection_id).await;
            if let Err(e) = world.remove_player(&name).await {
                warn!("⚠️ Logout of {} failed: {}", name, e);
            }
            info!("🚪 Connection {} logged out", connection_id);
            Flow::Close
        }
        (message, None) => {
            warn!(
                "⚠️ Ignoring {} from connection {} before login",
                message.kind(),
                connection_id
            );
            Flow::Continue
        }
        (message, Some(name)) => {
            debug!("Ignoring unexpected {} from {}", message.kind(), name);
            Flow::Continue
        }
    }
}
