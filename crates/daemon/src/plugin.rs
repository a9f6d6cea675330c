// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The in-process half of plugin discovery (`spec.md` §6, `SPEC_FULL.md`
//! §6). Actual entry-point scanning of installed packages is the named-but-
//! unimplemented external collaborator `spec.md` §1 places out of core
//! scope; this module supplies the contract a discovery mechanism is
//! expected to satisfy, plus the lookup-by-name the CLI dispatches through.

use std::collections::HashMap;

use orcha_engine::Manager;

/// Configuration handed to a plugin when it builds its manager. Carries
/// nothing today beyond what the CLI already parsed into [`crate::Config`];
/// kept as its own type so a plugin's constructor signature doesn't need to
/// change if plugin-specific flags are added later.
#[derive(Debug, Clone, Default)]
pub struct PluginConfig {
    pub extras: HashMap<String, String>,
}

/// A discoverable unit of petition logic: the thing `--key orcha-framework`
/// entry points are expected to resolve to (`spec.md` §6).
pub trait Plugin: Send + Sync {
    fn name(&self) -> &str;

    fn build_manager(&self, config: &PluginConfig) -> Box<dyn Manager>;
}

/// The set of plugins known to this process, keyed by name. `serve`/`run`
/// look a plugin up by the name given on the command line, exiting `127`
/// when nothing matches (`spec.md` §6).
#[derive(Default)]
pub struct PluginRegistry {
    plugins: HashMap<String, Box<dyn Plugin>>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, plugin: Box<dyn Plugin>) {
        self.plugins.insert(plugin.name().to_string(), plugin);
    }

    pub fn get(&self, name: &str) -> Option<&dyn Plugin> {
        self.plugins.get(name).map(|p| p.as_ref())
    }

    pub fn names(&self) -> Vec<&str> {
        self.plugins.keys().map(String::as_str).collect()
    }
}
