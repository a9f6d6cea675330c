// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.
//!
//! `spec.md` §6 names exactly one environment variable; this expansion does
//! not add config surface beyond it (`SPEC_FULL.md` §6).

use std::time::Duration;

/// `QUEUE_TIMEOUT`: floating-point seconds for `submit`/`cancel-in` poll
/// timeouts. Defaults to 1.0s.
pub fn queue_timeout() -> Duration {
    std::env::var("QUEUE_TIMEOUT")
        .ok()
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|secs| secs.is_finite() && *secs >= 0.0)
        .map(Duration::from_secs_f64)
        .unwrap_or(Duration::from_secs(1))
}
