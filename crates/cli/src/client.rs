// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The client half of `orcha run`: connects to a running `orcha serve`,
//! performs the `Hello` handshake, then submits one message and streams its
//! reply to stdout until a terminal frame is observed (`spec.md` §4.5/§6,
//! mirrors the original `orcha.lib.client`/`BasePlugin.client_main`).

use std::time::Duration;

use orcha_core::{Frame, Message, PetitionId};
use orcha_wire::{read_json, write_json, Request, Response, WireError};
use tokio::net::TcpStream;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("could not connect to {addr}: {source}")]
    Connect { addr: String, #[source] source: std::io::Error },

    #[error(transparent)]
    Wire(#[from] WireError),

    #[error("authentication failed")]
    Unauthorized,

    #[error("server rejected the request: {0}")]
    Rejected(String),

    #[error("server is draining (ManagerShutdown)")]
    ManagerShutdown,
}

/// Connects to `addr`, authenticates with `key`, and returns the stream
/// ready for exactly one `Submit` or `Cancel` request.
async fn connect(addr: &str, key: Option<&str>, timeout: Duration) -> Result<TcpStream, ClientError> {
    let mut stream = TcpStream::connect(addr)
        .await
        .map_err(|source| ClientError::Connect { addr: addr.to_string(), source })?;

    write_json(&mut stream, &Request::Hello { key: key.map(str::to_string) }, timeout).await?;
    match read_json::<_, Response>(&mut stream, timeout).await? {
        Response::Hello { .. } => Ok(stream),
        Response::Unauthorized => Err(ClientError::Unauthorized),
        other => Err(ClientError::Rejected(format!("{other:?}"))),
    }
}

/// Submits `message` and streams its reply frames to `on_frame` until a
/// terminal frame arrives, returning the petition's final return code (`0`
/// when the stream ends with [`Frame::End`] rather than a code, matching
/// "clients consume until a non-string frame is observed").
pub async fn submit_and_stream(
    addr: &str,
    key: Option<&str>,
    timeout: Duration,
    message: Message,
    mut on_frame: impl FnMut(&Frame),
) -> Result<i32, ClientError> {
    let mut stream = connect(addr, key, timeout).await?;
    write_json(&mut stream, &Request::Submit { message }, timeout).await?;

    match read_json::<_, Response>(&mut stream, timeout).await? {
        Response::Submitted { .. } => {}
        Response::ManagerShutdown => return Err(ClientError::ManagerShutdown),
        other => return Err(ClientError::Rejected(format!("{other:?}"))),
    }

    loop {
        match read_json::<_, Response>(&mut stream, timeout).await? {
            Response::Frame { frame } => {
                on_frame(&frame);
                match frame {
                    Frame::Code(code) => return Ok(code),
                    Frame::End => return Ok(0),
                    Frame::Chunk(_) => {}
                }
            }
            other => return Err(ClientError::Rejected(format!("{other:?}"))),
        }
    }
}

/// Requests cancellation of `id`.
pub async fn cancel(
    addr: &str,
    key: Option<&str>,
    timeout: Duration,
    id: PetitionId,
) -> Result<(), ClientError> {
    let mut stream = connect(addr, key, timeout).await?;
    write_json(&mut stream, &Request::Cancel { id }, timeout).await?;
    match read_json::<_, Response>(&mut stream, timeout).await? {
        Response::Ok => Ok(()),
        Response::ManagerShutdown => Err(ClientError::ManagerShutdown),
        other => Err(ClientError::Rejected(format!("{other:?}"))),
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
