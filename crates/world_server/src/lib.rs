//! # World Server - Authoritative Multiplayer Core
//!
//! The authoritative core of a real-time multiplayer world: it owns the
//! canonical state of connected players and live monsters, runs a periodic
//! behavior-tree AI for every monster, and keeps all clients in sync over a
//! length-prefixed binary protocol.
//!
//! ## Architecture Overview
//!
//! ### Core Components
//!
//! * **Entity Registries** ([`registry`]) - Players keyed by unique name,
//!   monsters keyed by a never-reused id, each behind its own read/write lock
//! * **Behavior Tree Engine** ([`behavior`]) - A closed set of composite and
//!   leaf nodes executed once per tick per monster
//! * **AI Tick Scheduler** ([`ai`]) - A fixed-interval driver (~60 Hz)
//! * **Broadcast Service** ([`broadcast`]) - Direct, all, all-but-one and
//!   explicit-list delivery of encoded frames
//! * **Pathfinding Gateway** ([`navigation`]) - Read-only path queries over a
//!   triangle mesh, disabled when the mesh cannot be loaded
//! * **World** ([`World`]) - The service object composing all of the above
//!
//! ### Message Flow
//!
//! 1. A client sends `[u32 LE length][payload]` frames over TCP
//! 2. The connection worker decodes each frame into a [`GameMessage`]
//! 3. Login, position and logout messages mutate the registries
//! 4. Resulting events are encoded once and enqueued on every recipient's
//!    ordered outbound queue
//! 5. A per-connection writer task drains the queue into the socket
//!
//! Independently, the tick scheduler evaluates every monster's tree and
//! enqueues movement and damage events the same way. Nothing on the tick
//! path ever waits on a socket.
//!
//! ## Thread Safety
//!
//! * Registries use `RwLock<BTreeMap>`; enumeration for a broadcast happens
//!   under the same lock as mutation
//! * When both registry locks are held, the monster lock is taken first
//! * Membership changes (joins, leaves, spawns, despawns) are serialized by
//!   the [`World`] so login snapshots never miss a concurrent spawn
//!
//! ## Error Handling
//!
//! * [`WorldError`] - unknown players or monsters, taken names
//! * [`FrameError`] - encoding, oversize frames, broken streams
//! * [`ServerError`] - binding and lifecycle failures
//! * [`NavigationError`] / [`MeshLoadError`] - path queries and mesh loading

// Re-export core types and functions for easy access
pub use config::{AiConfig, NavigationConfig, ServerConfig};
pub use error::{FrameError, MeshLoadError, NavigationError, ServerError, WorldError};
pub use messaging::{GameMessage, NavV3};
pub use server::{ShutdownState, WorldServer};
pub use types::{MonsterId, PlayerId, Point};
pub use utils::{create_server, create_server_with_config};
pub use world::World;

// Public module declarations
pub mod ai;
pub mod behavior;
pub mod broadcast;
pub mod config;
pub mod connection;
pub mod error;
pub mod messaging;
pub mod navigation;
pub mod registry;
pub mod server;
pub mod types;
pub mod utils;
pub mod world;

// Include tests
#[cfg(test)]
mod tests;
