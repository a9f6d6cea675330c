// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `orcha`: the command-line entry point (`spec.md` §6). Global flags plus
//! the `serve`/`s`/`srv` and `run`/`r` subcommands, each routed to a plugin
//! looked up by name in the in-process registry (`plugins.rs`).

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

mod cli;
mod client;
mod color;
mod commands;
mod exit_error;
mod plugins;

use clap::Parser;
use cli::{Cli, Command};
use exit_error::ExitError;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();
    let registry = plugins::builtin_registry();

    let result = dispatch(&cli, &registry).await;
    match result {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("orcha: {e}");
            std::process::exit(e.code);
        }
    }
}

async fn dispatch(cli: &Cli, registry: &orcha_daemon::PluginRegistry) -> Result<i32, ExitError> {
    match &cli.command {
        Command::Serve { plugin, extra } => {
            commands::serve::run(cli, registry, plugin, extra.clone()).await?;
            Ok(0)
        }
        Command::Run { plugin, id, extra } => {
            commands::run::run(cli, registry, plugin, id.clone(), extra.clone()).await
        }
    }
}
