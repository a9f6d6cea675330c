// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `orcha run` / `r`: acts as a client of an already-running `orcha serve`.
//! Submits one message built from `--id`/`--extra` and streams the reply to
//! stdout until a terminal frame is observed (`spec.md` §6).

use std::collections::HashMap;
use std::io::Write;

use orcha_core::{Frame, Message};
use orcha_daemon::PluginRegistry;
use tracing::warn;

use crate::cli::Cli;
use crate::client;
use crate::exit_error::ExitError;

pub async fn run(
    cli: &Cli,
    registry: &PluginRegistry,
    plugin: &str,
    id: String,
    extra: Vec<(String, String)>,
) -> Result<i32, ExitError> {
    if registry.get(plugin).is_none() {
        warn!(plugin, available = ?registry.names(), "no plugin matched");
        return Err(ExitError::new(127, format!("no plugin named '{plugin}' is registered")));
    }

    let extras: HashMap<String, serde_json::Value> = extra
        .into_iter()
        .map(|(k, v)| (k, serde_json::from_str(&v).unwrap_or(serde_json::Value::String(v))))
        .collect();
    let message = Message::new(id).with_extras(extras);

    let addr = format!("{}:{}", cli.listen_address, cli.port);
    let timeout = orcha_daemon::env::queue_timeout();

    let stdout = std::io::stdout();
    let code = client::submit_and_stream(&addr, cli.key.as_deref(), timeout, message, |frame| {
        if let Frame::Chunk(bytes) = frame {
            let mut handle = stdout.lock();
            let _ = handle.write_all(bytes);
            let _ = handle.write_all(b"\n");
        }
    })
    .await
    .map_err(|e| ExitError::new(1, e.to_string()))?;

    Ok(code)
}
