//! Wire messages and framing for client-server communication.
//!
//! This module provides the message schema and the length-prefixed frame
//! codec used on every connection.

pub mod codec;
pub mod types;

pub use codec::{decode, encode, read_message, write_message, Frame};
pub use types::{GameMessage, NavV3};
