// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `clap` argument definitions for the `orcha` binary (`spec.md` §6).

use clap::{Parser, Subcommand};

/// Parse a `key=value` extras argument (`--extra key=value`, repeatable).
///
/// Mirrors the teacher's `--var key=value` convention
/// (`oj-cli::commands::job::parse_key_value`).
pub fn parse_key_value(s: &str) -> Result<(String, String), String> {
    let pos = s.find('=').ok_or_else(|| format!("invalid input format '{s}': must be key=value"))?;
    Ok((s[..pos].to_string(), s[pos + 1..].to_string()))
}

#[derive(Debug, Parser)]
#[command(
    name = "orcha",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("BUILD_GIT_HASH"), ")"),
    about = "Orcha command line utility for handling services",
    styles = crate::color::styles(),
)]
pub struct Cli {
    /// Listen address of the service.
    #[arg(long, value_name = "ADDRESS", default_value = "127.0.0.1", global = true)]
    pub listen_address: String,

    /// Listen port of the service.
    #[arg(long, value_name = "N", default_value_t = 50000, global = true)]
    pub port: u16,

    /// Authentication key used for verifying clients. If not given, no
    /// authentication is enforced.
    #[arg(long, value_name = "KEY", global = true)]
    pub key: Option<String>,

    /// Maximum concurrent tasks that can be run simultaneously.
    #[arg(long = "max-workers", value_name = "N", global = true)]
    pub max_workers: Option<usize>,

    /// Amount of items to extract from the queue, allowing running a
    /// subsequent task earlier than the ones with higher priority.
    #[arg(long = "look-ahead-items", value_name = "N", default_value_t = 1, global = true)]
    pub look_ahead_items: usize,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Serves the given plugin acting as a service.
    #[command(visible_aliases = ["s", "srv"])]
    Serve {
        /// Name of the registered plugin to serve.
        plugin: String,

        /// Plugin configuration values (can be repeated: --extra key=value).
        #[arg(long = "extra", value_parser = parse_key_value)]
        extra: Vec<(String, String)>,
    },

    /// Runs the given plugin acting as a client: submits one message and
    /// streams its reply to stdout until a terminal frame is observed.
    #[command(visible_aliases = ["r"])]
    Run {
        /// Name of the registered plugin this message is meant for.
        plugin: String,

        /// Client-chosen petition id.
        #[arg(long)]
        id: String,

        /// Message extras (can be repeated: --extra key=value). Values are
        /// parsed as JSON when possible, otherwise carried as strings.
        #[arg(long = "extra", value_parser = parse_key_value)]
        extra: Vec<(String, String)>,
    },
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
