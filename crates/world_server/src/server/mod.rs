//! Core server implementation and connection handling.
//!
//! This module contains the main world server structure, the logic for
//! handling client connections and the shared shutdown state.

pub mod core;
pub mod handlers;
pub mod shutdown;

pub use core::WorldServer;
pub use shutdown::ShutdownState;
