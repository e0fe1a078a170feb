//! Client connection representation and outbound delivery.
//!
//! Every connection owns an ordered outbound queue. Producers (login
//! handling, the tick scheduler, other players' updates) only ever enqueue
//! frames through a [`ConnectionHandle`]; a dedicated writer task drains the
//! queue into the socket. A stalled socket therefore only stalls its own
//! writer task, and its queue is capped so a client that stops reading
//! cannot grow server memory without limit.

use super::ConnectionId;
use crate::error::FrameError;
use crate::messaging::Frame;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tracing::{debug, error};

/// Frames a connection may have queued before further sends are refused.
pub const DEFAULT_OUTBOUND_CAPACITY: usize = 1024;

/// Cheap, cloneable sending side of one connection's outbound queue.
///
/// Frames enqueued through the same handle (or its clones) are written in
/// enqueue order. Holding a handle does not keep the socket alive: once the
/// connection is removed, sends fail with [`FrameError::ConnectionClosed`].
/// A full queue refuses the frame with [`FrameError::QueueFull`].
#[derive(Debug, Clone)]
pub struct ConnectionHandle {
    id: ConnectionId,
    outbound: mpsc::Sender<Frame>,
}

impl ConnectionHandle {
    /// Creates a handle whose frames are delivered to the returned receiver.
    ///
    /// Used by the writer task, and directly by tests as an in-memory sink.
    pub fn channel(id: ConnectionId) -> (Self, mpsc::Receiver<Frame>) {
        Self::with_capacity(id, DEFAULT_OUTBOUND_CAPACITY)
    }

    /// Like [`ConnectionHandle::channel`] with an explicit queue bound.
    ///
    /// A capacity of zero is raised to one.
    pub fn with_capacity(id: ConnectionId, capacity: usize) -> (Self, mpsc::Receiver<Frame>) {
        let (outbound, receiver) = mpsc::channel(capacity.max(1));
        (Self { id, outbound }, receiver)
    }

    /// Creates a handle and spawns the task that drains it into `writer`.
    pub fn spawn_writer<W>(id: ConnectionId, capacity: usize, writer: W) -> (Self, JoinHandle<()>)
    where
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (handle, receiver) = Self::with_capacity(id, capacity);
        let task = tokio::spawn(drain_outbound(id, receiver, writer));
        (handle, task)
    }

    /// The connection this handle delivers to.
    pub fn id(&self) -> ConnectionId {
        self.id
    }

    /// Enqueues a frame without waiting for the socket.
    pub fn send(&self, frame: Frame) -> Result<(), FrameError> {
        self.outbound.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => FrameError::QueueFull(self.id),
            TrySendError::Closed(_) => FrameError::ConnectionClosed(self.id),
        })
    }

    /// Whether the writer side has gone away.
    pub fn is_closed(&self) -> bool {
        self.outbound.is_closed()
    }
}

/// Writes queued frames in order until the queue closes or a write fails.
async fn drain_outbound<W>(id: ConnectionId, mut receiver: mpsc::Receiver<Frame>, mut writer: W)
where
    W: AsyncWrite + Unpin,
{
    while let Some(frame) = receiver.recv().await {
        let result = async {
            writer.write_all(&frame).await?;
            writer.flush().await
        }
        .await;

        if let Err(e) = result {
            error!("❌ Write to connection {} failed: {}", id, e);
            break;
        }
    }
    debug!("🔌 Outbound writer for connection {} finished", id);
}

/// Represents an individual client connection to the server.
///
/// Tracks the network address, connection timing, the player that logged in
/// over it (if any) and the outbound writer task.
#[derive(Debug)]
pub struct ClientConnection {
    /// The name of the player logged in over this connection (None until login)
    pub player_name: Option<String>,

    /// The remote network address of the client
    pub remote_addr: SocketAddr,

    /// When this connection was established
    pub connected_at: Instant,

    /// Sending side of the outbound queue
    pub handle: ConnectionHandle,

    /// Task draining the outbound queue into the socket
    writer_task: JoinHandle<()>,
}

impl ClientConnection {
    /// Creates a new client connection around an already spawned writer.
    pub fn new(remote_addr: SocketAddr, handle: ConnectionHandle, writer_task: JoinHandle<()>) -> Self {
        Self {
            player_name: None,
            remote_addr,
            connected_at: Instant::now(),
            handle,
            writer_task,
        }
    }

    /// Stops the writer; frames still queued are dropped.
    pub fn close(self) {
        self.writer_task.abort();
    }
}
