// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The user-overridable manager facade (`spec.md` §4.2).

use async_trait::async_trait;
use orcha_core::{ConditionFailed, Message, Petition, ReplyQueue};
use std::sync::Arc;

use crate::hooks::Hook;

/// Operations the scheduler calls on the user's plugin implementation.
///
/// Modeled with `async fn` so implementations may perform bounded async work
/// (e.g. spawning a child process in `convert_to_petition`). `on_start` and
/// `on_finish` are called while Admission/Finalizer hold the per-petition
/// lock (`spec.md` §4.2), so they should still be quick — but they may
/// suspend: the lock is a `tokio::sync::Mutex` (`crate::state::PetitionHandle`)
/// specifically so holding it across these calls does not block the thread
/// or poison the worker pool's `Send` bound.
#[async_trait]
pub trait Manager: Send + Sync {
    /// Pure, may fail. A `None` return means "reject this message silently."
    ///
    /// `reply` is the reply queue the IPC layer already created for this
    /// submission (`spec.md` §3's "per-request reply-queue"); implementors
    /// pass it straight into the `Petition` they build.
    async fn convert_to_petition(&self, message: Message, reply: ReplyQueue) -> Option<Petition>;

    /// Admission predicate. Must be quick and side-effect-free. Raising
    /// `Err(ConditionFailed)` is the *only* way to deny admission.
    async fn condition(&self, petition: &Petition) -> Result<(), ConditionFailed>;

    /// Called after admission, inside the per-petition lock. Returns whether
    /// the petition is healthy. Must be short.
    async fn on_start(&self, petition: &Petition) -> bool;

    /// Called exactly once per petition, even on failure paths. Must not
    /// panic.
    async fn on_finish(&self, petition: &Petition);

    /// The hook chain this manager contributes, already sorted by priority.
    fn hooks(&self) -> Vec<Arc<dyn Hook>> {
        Vec::new()
    }
}

#[cfg(test)]
#[path = "manager_tests.rs"]
mod tests;
