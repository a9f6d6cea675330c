// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `orcha serve` / `s` / `srv`: looks the named plugin up in the in-process
//! registry, builds its manager, and runs the server until a termination
//! signal arrives (`spec.md` §6).

use std::collections::HashMap;
use std::sync::Arc;

use orcha_daemon::{Config, PluginConfig, PluginRegistry};
use tracing::warn;

use crate::cli::Cli;
use crate::exit_error::ExitError;

pub async fn run(
    cli: &Cli,
    registry: &PluginRegistry,
    plugin: &str,
    extra: Vec<(String, String)>,
) -> Result<(), ExitError> {
    let Some(plugin_impl) = registry.get(plugin) else {
        warn!(plugin, available = ?registry.names(), "no plugin matched; nothing to serve");
        return Err(ExitError::new(127, format!("no plugin named '{plugin}' is registered")));
    };

    let config = Config {
        engine: orcha_engine::EngineConfig {
            max_workers: cli.max_workers,
            look_ahead: cli.look_ahead_items,
            queue_timeout: orcha_daemon::env::queue_timeout(),
        },
        listen_address: cli.listen_address.clone(),
        port: cli.port,
        key: cli.key.clone(),
    };

    let plugin_config = PluginConfig { extras: extra.into_iter().collect::<HashMap<_, _>>() };
    let manager = Arc::from(plugin_impl.build_manager(&plugin_config));

    orcha_daemon::serve(config, manager).await.map_err(|e| ExitError::new(1, e.to_string()))
}
