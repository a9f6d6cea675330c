// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Wires a [`Config`] and a [`Manager`] into a running server: binds the
//! TCP listener, starts the [`Engine`], and blocks until `SIGTERM`/`SIGINT`
//! initiates a graceful shutdown (`spec.md` §6, §9). Called by `orcha
//! serve`'s command handler so the bind-serve-drain sequence lives in one
//! place rather than in the CLI crate.

use std::sync::Arc;

use orcha_engine::{Engine, Manager};
use tokio::net::TcpListener;
use tracing::{info, warn};

use crate::config::Config;
use crate::listener::{ListenCtx, Listener};

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("failed to bind {addr}: {source}")]
    Bind { addr: String, #[source] source: std::io::Error },
}

/// Binds `config.socket_addr()`, starts the scheduler and the IPC listener,
/// and runs until a termination signal arrives, then drains the engine
/// (`spec.md` §5's shutdown sequence). Returns once shutdown has completed.
pub async fn serve<M: Manager + 'static>(
    config: Config,
    manager: Arc<M>,
) -> Result<(), RuntimeError> {
    if config.key.is_none() {
        warn!("no --key configured: authentication is not enforced");
    }

    let addr = config.socket_addr();
    let tcp = TcpListener::bind(&addr)
        .await
        .map_err(|source| RuntimeError::Bind { addr: addr.clone(), source })?;
    info!(%addr, "orcha listening");

    let engine = Arc::new(Engine::new(config.engine.clone(), manager));
    let ctx = Arc::new(ListenCtx {
        engine: Arc::clone(&engine),
        key: config.key.clone(),
        ipc_timeout: config.engine.queue_timeout,
    });
    let listener = tokio::spawn(Listener::new(tcp, ctx).run());

    wait_for_shutdown_signal().await;
    info!("shutdown signal received, draining");

    listener.abort();
    let _ = engine.shutdown().await;
    Ok(())
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (Ok(mut sigterm), Ok(mut sigint)) =
        (signal(SignalKind::terminate()), signal(SignalKind::interrupt()))
    else {
        // Signal handlers could not be installed; fall back to Ctrl-C only.
        let _ = tokio::signal::ctrl_c().await;
        return;
    };
    tokio::select! {
        _ = sigterm.recv() => {}
        _ = sigint.recv() => {}
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
