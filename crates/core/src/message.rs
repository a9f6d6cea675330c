// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The client → server [`Message`] payload and the server → client [`Frame`]
//! stream that flows back through a petition's [`ReplyQueue`].

use crate::id::PetitionId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

/// A client-originated request: an opaque id plus an arbitrary payload.
///
/// `extras` is never interpreted by the engine; it is handed to
/// `Manager::convert_to_petition` verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: PetitionId,
    #[serde(default)]
    pub extras: HashMap<String, Value>,
}

impl Message {
    pub fn new(id: impl Into<PetitionId>) -> Self {
        Self { id: id.into(), extras: HashMap::new() }
    }

    pub fn with_extras(mut self, extras: HashMap<String, Value>) -> Self {
        self.extras = extras;
        self
    }
}

/// One item in a petition's reply stream.
///
/// "The stream is always terminated by exactly one of: an integer, or the
/// sentinel. Clients consume until a non-string frame is observed."
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Frame {
    Chunk(Vec<u8>),
    Code(i32),
    End,
}

impl Frame {
    pub fn text(s: impl AsRef<str>) -> Self {
        Frame::Chunk(s.as_ref().as_bytes().to_vec())
    }

    /// `true` once this frame terminates the stream (I5's "no further frame
    /// may be written" boundary).
    pub fn is_terminal(&self) -> bool {
        matches!(self, Frame::Code(_) | Frame::End)
    }
}

/// Per-petition, server-to-client ordered frame stream.
///
/// Backed by an unbounded `mpsc` channel so `write` never blocks the worker
/// producing frames. `close` is idempotent; `write` after close silently
/// drops the frame (I5), matching the teacher's pattern of swallowing sends
/// on a torn-down channel rather than propagating an error the producer
/// cannot usefully act on.
#[derive(Debug, Clone)]
pub struct ReplyQueue {
    sender: mpsc::UnboundedSender<Frame>,
    closed: Arc<AtomicBool>,
}

impl ReplyQueue {
    /// Creates a fresh reply queue and the receiver half the IPC layer
    /// streams out to the client.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<Frame>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender, closed: Arc::new(AtomicBool::new(false)) }, receiver)
    }

    /// Pushes a frame unless the queue has already been closed.
    pub fn write(&self, frame: Frame) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        if self.sender.send(frame).is_err() {
            self.closed.store(true, Ordering::Release);
        }
    }

    /// Writes the terminal return code and closes the queue.
    pub fn finish(&self, code: i32) {
        self.write(Frame::Code(code));
        self.close();
    }

    /// Idempotent close. Subsequent `write` calls are silently swallowed.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

#[cfg(test)]
#[path = "message_tests.rs"]
mod tests;
