//! Error types and handling for the world server.
//!
//! This module defines the error types that can occur during server operations,
//! providing clear categorization of different failure modes. Registry errors
//! are returned to the caller; codec and delivery errors are logged at the
//! boundary that decides to keep going.

use crate::types::MonsterId;

/// Enumeration of possible server lifecycle errors.
///
/// Categorizes errors into network-related and internal server errors
/// to help with debugging and error handling.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Network-related errors such as binding failures or connection issues
    #[error("Network error: {0}")]
    Network(String),

    /// Raw socket I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of registry operations.
///
/// None of these are fatal; they are surfaced to whoever asked.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorldError {
    /// No live player is registered under this name
    #[error("player not found: {0}")]
    PlayerNotFound(String),

    /// No live monster carries this id
    #[error("monster not found: {0}")]
    MonsterNotFound(MonsterId),

    /// A live player already holds this name
    #[error("player name already in use: {0}")]
    NameTaken(String),
}

/// Failures while encoding, decoding or moving frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload could not be serialized or deserialized
    #[error("serialization failure: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The announced or produced payload exceeds the configured limit
    #[error("frame of {size} bytes exceeds limit of {limit} bytes")]
    FrameTooLarge {
        /// Payload length in bytes
        size: usize,
        /// Configured maximum
        limit: usize,
    },

    /// Reading from or writing to the byte stream failed
    #[error("I/O failure: {0}")]
    Io(#[from] std::io::Error),

    /// The connection's outbound queue is gone
    #[error("connection {0} is closed")]
    ConnectionClosed(usize),

    /// The connection's outbound queue is at capacity
    #[error("outbound queue for connection {0} is full")]
    QueueFull(usize),
}

impl FrameError {
    /// Whether the error means the peer went away cleanly.
    pub fn is_disconnect(&self) -> bool {
        match self {
            FrameError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::BrokenPipe
            ),
            FrameError::ConnectionClosed(_) => true,
            _ => false,
        }
    }
}

/// Failures while loading the navigation mesh document.
///
/// Never escapes gateway construction: a failed load leaves the gateway
/// disabled.
#[derive(Debug, thiserror::Error)]
pub enum MeshLoadError {
    /// The document could not be read
    #[error("cannot read navigation mesh: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not a valid mesh description
    #[error("malformed navigation mesh: {0}")]
    Parse(#[from] serde_json::Error),

    /// A triangle references a vertex that does not exist
    #[error("triangle {triangle} references vertex {index}, mesh has {vertex_count} vertices")]
    InvalidTriangle {
        triangle: usize,
        index: usize,
        vertex_count: usize,
    },

    /// The document holds no triangles
    #[error("navigation mesh has no triangles")]
    EmptyMesh,
}

/// Failures of a path query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum NavigationError {
    /// No mesh is loaded
    #[error("navigation is unavailable")]
    Unavailable,

    /// An endpoint lies outside every triangle
    #[error("point is outside the navigation mesh")]
    OutsideMesh,

    /// The endpoints lie on disconnected parts of the mesh
    #[error("no route between the requested points")]
    NoRoute,
}
