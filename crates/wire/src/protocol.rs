// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC envelope types shared between `orcha-daemon`'s listener and clients.
//!
//! A connection always opens with [`Request::Hello`]. `submit` keeps the
//! connection open and streams [`Response::Frame`] messages back until a
//! terminal [`orcha_core::Frame`] is reached; `cancel` gets a single
//! [`Response`] and the connection closes.

use orcha_core::{Frame, Message, PetitionId};
use serde::{Deserialize, Serialize};

/// Client -> server.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Pre-shared key handshake. Must be the first message on every
    /// connection (`spec.md` §4.5/§6 — Orcha's listener is TCP-only).
    Hello {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        key: Option<String>,
    },

    /// `submit(message) -> reply-queue-proxy`.
    Submit { message: Message },

    /// `cancel(id) -> none`.
    Cancel { id: PetitionId },
}

/// Server -> client.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Generic success (acknowledges `cancel`).
    Ok,

    /// Handshake accepted.
    Hello { version: String },

    /// The pre-shared key did not match.
    Unauthorized,

    /// `submit` was accepted; the reply stream follows as further
    /// [`Response::Frame`] messages on this same connection.
    Submitted { id: PetitionId },

    /// One item of a petition's reply stream.
    Frame { frame: Frame },

    /// The server is draining and rejected the request.
    ManagerShutdown,

    /// Any other failure.
    Error { message: String },
}

#[cfg(test)]
#[path = "protocol_tests.rs"]
mod tests;
