// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The IPC listener: one authenticated TCP endpoint exposing `submit` and
//! `cancel` (`spec.md` §4.5, `SPEC_FULL.md` §4.5). Every connection opens
//! with a `Hello` handshake; unlike the teacher's Unix+TCP dual listener
//! (which trusts local Unix peers unconditionally), Orcha is TCP-only, so
//! every connection is authenticated the same way.

use std::sync::Arc;
use std::time::Duration;

use orcha_engine::{Engine, Manager};
use orcha_wire::{read_json, write_json, Request, Response, WireError};
use tokio::net::{TcpListener, TcpStream};
use tracing::{debug, error, info, warn};

/// Protocol version reported in the `Hello` handshake response.
pub const PROTOCOL_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Shared daemon context for every connection handler.
pub struct ListenCtx<M: Manager + 'static> {
    pub engine: Arc<Engine<M>>,
    /// Pre-shared key. `None` means authentication is not enforced — callers
    /// are expected to have already logged the startup warning this implies
    /// (`spec.md` §6).
    pub key: Option<String>,
    pub ipc_timeout: Duration,
}

/// Accepts TCP connections and spawns a handler task for each
/// (`spec.md` §4.5).
pub struct Listener<M: Manager + 'static> {
    tcp: TcpListener,
    ctx: Arc<ListenCtx<M>>,
}

impl<M: Manager + 'static> Listener<M> {
    pub fn new(tcp: TcpListener, ctx: Arc<ListenCtx<M>>) -> Self {
        Self { tcp, ctx }
    }

    /// Runs the accept loop forever. The caller races this against its own
    /// shutdown signal (`spec.md` §5).
    pub async fn run(self) {
        loop {
            match self.tcp.accept().await {
                Ok((stream, addr)) => {
                    debug!(peer = %addr, "accepted connection");
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(stream, &ctx).await {
                            log_connection_error(e);
                        }
                    });
                }
                Err(e) => error!("accept error: {}", e),
            }
        }
    }
}

fn log_connection_error(e: WireError) {
    match e {
        WireError::ConnectionClosed => debug!("client disconnected"),
        WireError::Timeout => warn!("connection timed out"),
        other => error!("connection error: {}", other),
    }
}

/// Handles a single client connection end to end: the `Hello` handshake,
/// then exactly one `Submit` (streamed to completion) or `Cancel`.
async fn handle_connection<M: Manager + 'static>(
    mut stream: TcpStream,
    ctx: &ListenCtx<M>,
) -> Result<(), WireError> {
    let hello: Request = read_json(&mut stream, ctx.ipc_timeout).await?;
    let Request::Hello { key } = hello else {
        let response = Response::Error { message: "connection must start with Hello".to_string() };
        write_json(&mut stream, &response, ctx.ipc_timeout).await?;
        return Ok(());
    };

    if let Some(expected) = &ctx.key {
        if key.as_deref() != Some(expected.as_str()) {
            write_json(&mut stream, &Response::Unauthorized, ctx.ipc_timeout).await?;
            return Ok(());
        }
    }
    write_json(
        &mut stream,
        &Response::Hello { version: PROTOCOL_VERSION.to_string() },
        ctx.ipc_timeout,
    )
    .await?;

    let request: Request = read_json(&mut stream, ctx.ipc_timeout).await?;
    info!(request = ?request, "received request");
    match request {
        Request::Submit { message } => handle_submit(stream, ctx, message).await,
        Request::Cancel { id } => handle_cancel(stream, ctx, id).await,
        Request::Hello { .. } => {
            let response = Response::Error { message: "unexpected second Hello".to_string() };
            write_json(&mut stream, &response, ctx.ipc_timeout).await
        }
    }
}

async fn handle_submit<M: Manager + 'static>(
    mut stream: TcpStream,
    ctx: &ListenCtx<M>,
    message: orcha_core::Message,
) -> Result<(), WireError> {
    let id = message.id.clone();
    let mut frames = match ctx.engine.submit(message).await {
        Ok(frames) => frames,
        Err(_) => return write_json(&mut stream, &Response::ManagerShutdown, ctx.ipc_timeout).await,
    };

    write_json(&mut stream, &Response::Submitted { id }, ctx.ipc_timeout).await?;

    while let Some(frame) = frames.recv().await {
        let terminal = frame.is_terminal();
        write_json(&mut stream, &Response::Frame { frame }, ctx.ipc_timeout).await?;
        if terminal {
            break;
        }
    }
    Ok(())
}

async fn handle_cancel<M: Manager + 'static>(
    mut stream: TcpStream,
    ctx: &ListenCtx<M>,
    id: orcha_core::PetitionId,
) -> Result<(), WireError> {
    let response = match ctx.engine.cancel(id).await {
        Ok(()) => Response::Ok,
        Err(_) => Response::ManagerShutdown,
    };
    write_json(&mut stream, &response, ctx.ipc_timeout).await
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
