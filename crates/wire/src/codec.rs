// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Length-prefixed JSON framing: a 4-byte big-endian length prefix followed
//! by a JSON payload.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio::time::{timeout, Duration};

/// Frames larger than this are rejected before the length-prefixed payload
/// is even read, bounding memory use from a malicious or confused peer.
pub const MAX_FRAME_BYTES: u32 = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("frame of {0} bytes exceeds the {MAX_FRAME_BYTES}-byte limit")]
    FrameTooLarge(u32),

    #[error("connection closed")]
    ConnectionClosed,

    #[error("timed out waiting for peer")]
    Timeout,
}

/// Serializes `value` to JSON without a length prefix.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, WireError> {
    Ok(serde_json::to_vec(value)?)
}

/// Deserializes a JSON payload previously produced by [`encode`].
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, WireError> {
    Ok(serde_json::from_slice(bytes)?)
}

/// Writes `payload` prefixed with its 4-byte big-endian length.
pub async fn write_message<W: AsyncWrite + Unpin>(
    writer: &mut W,
    payload: &[u8],
) -> Result<(), WireError> {
    let len: u32 = payload.len().try_into().map_err(|_| WireError::FrameTooLarge(u32::MAX))?;
    writer.write_all(&len.to_be_bytes()).await?;
    writer.write_all(payload).await?;
    writer.flush().await?;
    Ok(())
}

/// Reads one length-prefixed payload. Returns [`WireError::ConnectionClosed`]
/// if the peer closes before a length prefix arrives.
pub async fn read_message<R: AsyncRead + Unpin>(reader: &mut R) -> Result<Vec<u8>, WireError> {
    let mut len_buf = [0u8; 4];
    match reader.read_exact(&mut len_buf).await {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => {
            return Err(WireError::ConnectionClosed)
        }
        Err(e) => return Err(e.into()),
    }
    let len = u32::from_be_bytes(len_buf);
    if len > MAX_FRAME_BYTES {
        return Err(WireError::FrameTooLarge(len));
    }
    let mut payload = vec![0u8; len as usize];
    reader.read_exact(&mut payload).await?;
    Ok(payload)
}

/// Convenience wrapper: serialize, frame, and write within a bounded poll.
pub async fn write_json<W: AsyncWrite + Unpin, T: Serialize>(
    writer: &mut W,
    value: &T,
    poll_timeout: Duration,
) -> Result<(), WireError> {
    let payload = encode(value)?;
    timeout(poll_timeout, write_message(writer, &payload)).await.map_err(|_| WireError::Timeout)?
}

/// Convenience wrapper: read, frame-strip, and deserialize within a bounded poll.
pub async fn read_json<R: AsyncRead + Unpin, T: DeserializeOwned>(
    reader: &mut R,
    poll_timeout: Duration,
) -> Result<T, WireError> {
    let payload =
        timeout(poll_timeout, read_message(reader)).await.map_err(|_| WireError::Timeout)??;
    decode(&payload)
}

#[cfg(test)]
#[path = "codec_tests.rs"]
mod tests;
