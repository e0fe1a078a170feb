//! Network broadcast service.
//!
//! Turns a [`GameMessage`] into one frame and enqueues it on every selected
//! connection. Serialization happens once per message regardless of the
//! number of recipients. Delivery is per recipient: a closed or full queue is
//! counted and skipped, the remaining recipients still get the frame.
//!
//! Recipient enumeration is the caller's job; the world holds the registry
//! lock while it hands recipients to these methods, so a removed player is
//! never a target.

use crate::connection::{ConnectionHandle, ConnectionId};
use crate::error::FrameError;
use crate::messaging::{encode, Frame, GameMessage};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, error, trace, warn};

/// Counters describing outbound traffic since startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStats {
    /// Frames successfully enqueued
    pub frames_enqueued: u64,
    /// Per-recipient enqueue failures
    pub send_failures: u64,
    /// Messages that could not be encoded at all
    pub serialization_failures: u64,
}

/// Fan-out of encoded messages to connection queues.
#[derive(Debug, Default)]
pub struct Broadcaster {
    frames_enqueued: AtomicU64,
    send_failures: AtomicU64,
    serialization_failures: AtomicU64,
}

impl Broadcaster {
    /// Creates a broadcaster with zeroed counters.
    pub fn new() -> Self {
        Self::default()
    }

    /// Direct reply to one connection.
    ///
    /// # Returns
    ///
    /// `true` if the frame was enqueued.
    pub fn send_to(&self, recipient: &ConnectionHandle, message: &GameMessage) -> bool {
        match self.encode(message) {
            Some(frame) => self.deliver(recipient, &frame),
            None => false,
        }
    }

    /// Broadcast to every recipient yielded by `recipients`.
    ///
    /// Covers both "all players" and "explicit list" policies.
    ///
    /// # Returns
    ///
    /// The number of connections the frame was enqueued on.
    pub fn broadcast<'a, I>(&self, recipients: I, message: &GameMessage) -> usize
    where
        I: IntoIterator<Item = &'a ConnectionHandle>,
    {
        let Some(frame) = self.encode(message) else {
            return 0;
        };
        let delivered = recipients
            .into_iter()
            .filter(|recipient| self.deliver(recipient, &frame))
            .count();
        trace!("📡 Broadcast {} to {} connections", message.kind(), delivered);
        delivered
    }

    /// Broadcast to every recipient except the triggering connection.
    pub fn broadcast_except<'a, I>(&self, recipients: I, excluded: ConnectionId, message: &GameMessage) -> usize
    where
        I: IntoIterator<Item = &'a ConnectionHandle>,
    {
        self.broadcast(
            recipients.into_iter().filter(|recipient| recipient.id() != excluded),
            message,
        )
    }

    /// Broadcast to an explicit list of connections.
    pub fn broadcast_to_list(&self, recipients: &[ConnectionHandle], message: &GameMessage) -> usize {
        self.broadcast(recipients.iter(), message)
    }

    /// Snapshot of the delivery counters.
    pub fn stats(&self) -> DeliveryStats {
        DeliveryStats {
            frames_enqueued: self.frames_enqueued.load(Ordering::Relaxed),
            send_failures: self.send_failures.load(Ordering::Relaxed),
            serialization_failures: self.serialization_failures.load(Ordering::Relaxed),
        }
    }

    fn encode(&self, message: &GameMessage) -> Option<Frame> {
        match encode(message) {
            Ok(frame) => Some(frame),
            Err(e) => {
                self.serialization_failures.fetch_add(1, Ordering::Relaxed);
                error!("❌ Failed to encode {} message: {}", message.kind(), e);
                None
            }
        }
    }

    fn deliver(&self, recipient: &ConnectionHandle, frame: &Frame) -> bool {
        match recipient.send(frame.clone()) {
            Ok(()) => {
                self.frames_enqueued.fetch_add(1, Ordering::Relaxed);
                true
            }
            Err(e) => {
                self.send_failures.fetch_add(1, Ordering::Relaxed);
                match e {
                    // slow reader, the frame is dropped for this recipient only
                    FrameError::QueueFull(id) => warn!("⚠️ Outbound queue full, dropping frame for connection {}", id),
                    // the connection is being torn down
                    FrameError::ConnectionClosed(id) => debug!("🔌 Connection {} closed, frame dropped", id),
                    e => error!("❌ Failed to send to connection {}: {}", recipient.id(), e),
                }
                false
            }
        }
    }
}
