//! Connection management for client connections.
//!
//! This module handles the lifecycle of client connections, including
//! connection tracking, player name association, and ordered outbound
//! delivery.

pub mod client;
pub mod manager;

pub use client::ConnectionHandle;
pub use manager::ConnectionManager;

/// Type alias for connection identifiers.
///
/// Connection IDs are used to uniquely identify client connections
/// throughout their lifecycle on the server.
pub type ConnectionId = usize;
