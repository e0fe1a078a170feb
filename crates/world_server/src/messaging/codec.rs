//! Length-prefixed framing.
//!
//! A frame is a 4-byte little-endian payload length followed by exactly that
//! many payload bytes. Payloads are serialized [`GameMessage`]s.

use super::GameMessage;
use crate::error::FrameError;
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

/// A complete, immutable frame ready to be written to any number of sinks.
pub type Frame = Arc<[u8]>;

/// Size of the length prefix in bytes.
pub const LENGTH_PREFIX_LEN: usize = 4;

/// Wraps an already serialized payload in a frame.
pub fn frame_payload(payload: &[u8]) -> Result<Frame, FrameError> {
    let len = u32::try_from(payload.len()).map_err(|_| FrameError::FrameTooLarge {
        size: payload.len(),
        limit: u32::MAX as usize,
    })?;
    let mut buf = Vec::with_capacity(LENGTH_PREFIX_LEN + payload.len());
    buf.extend_from_slice(&len.to_le_bytes());
    buf.extend_from_slice(payload);
    Ok(buf.into())
}

/// Serializes a message and frames it.
pub fn encode(message: &GameMessage) -> Result<Frame, FrameError> {
    let payload = serde_json::to_vec(message)?;
    frame_payload(&payload)
}

/// Deserializes one payload (without its length prefix).
pub fn decode(payload: &[u8]) -> Result<GameMessage, FrameError> {
    Ok(serde_json::from_slice(payload)?)
}

/// Reads one frame and returns its payload.
///
/// Rejects announced lengths above `max_len` before allocating.
pub async fn read_frame<R>(reader: &mut R, max_len: usize) -> Result<Vec<u8>, FrameError>
where
    R: AsyncRead + Unpin,
{
    let len = reader.read_u32_le().await? as usize;
    if len > max_len {
        return Err(FrameError::FrameTooLarge {
            size: len,
            limit: max_len,
        });
    }
    let mut payload = vec![0u8; len];
    reader.read_exact(&mut payload).await?;
    Ok(payload)
}

/// Reads and decodes one message.
pub async fn read_message<R>(reader: &mut R, max_len: usize) -> Result<GameMessage, FrameError>
where
    R: AsyncRead + Unpin,
{
    let payload = read_frame(reader, max_len).await?;
    decode(&payload)
}

/// Encodes and writes one message, flushing afterwards.
pub async fn write_message<W>(writer: &mut W, message: &GameMessage) -> Result<(), FrameError>
where
    W: AsyncWrite + Unpin,
{
    let frame = encode(message)?;
    writer.write_all(&frame).await?;
    writer.flush().await?;
    Ok(())
}
