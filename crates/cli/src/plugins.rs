// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The in-process plugin registry `orcha serve`/`orcha run` dispatch
//! through. Real entry-point discovery (`spec.md` §6) is an external
//! collaborator out of core scope; this binary seeds the registry with the
//! `hello-world` demo plugin so the CLI has at least one name to route to.

use orcha_daemon::demo::HelloPlugin;
use orcha_daemon::PluginRegistry;

/// Builds the registry known to this build of the `orcha` binary.
pub fn builtin_registry() -> PluginRegistry {
    let mut registry = PluginRegistry::new();
    registry.register(Box::new(HelloPlugin));
    registry
}
