// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Finalizer: runs `on_finish` exactly once per petition, closes the reply
//! queue, and removes the petition from engine state (`spec.md` §4.4).
//!
//! Invoked from the worker-pool completion callback (normal/broken
//! completion) and from Cancel-Dispatch (cancelled completion) — never
//! called twice for the same petition, since both call sites remove the
//! petition from `petitions` immediately after this returns.

use std::sync::Arc;

use orcha_core::PetitionState;
use tracing::debug;

use crate::context::EngineCtx;
use crate::manager::Manager;
use crate::state::PetitionHandle;

/// Finalizes `handle`: promotes `RUNNING -> FINISHED` on ordinary
/// completion (leaving `CANCELLED`/`BROKEN` alone), runs the
/// `on_petition_finish` hook chain with early-exit if a hook itself marks
/// `DONE`, otherwise calls `manager.on_finish`, then removes the petition.
///
/// Holds the per-petition lock across the hook/manager calls, matching
/// `spec.md` §4.2's "called ... inside the per-petition lock" contract for
/// `on_start`/`on_finish`; both are documented as "must be short". This is
/// why `PetitionHandle` (`crate::state`) is a `tokio::sync::Mutex` rather
/// than `parking_lot`'s: its guard stays `Send` across the `.await`s below,
/// which the worker-pool's `Send`-bounded spawn requires.
pub(crate) async fn finalize<M: Manager + 'static>(ctx: &Arc<EngineCtx<M>>, handle: PetitionHandle) {
    let id = {
        let mut petition = handle.lock().await;
        if !petition.mark_finalized() {
            // Already finalized by a racing caller (e.g. the action's own
            // completion callback loses the race with Cancel-Dispatch).
            return;
        }
        if petition.state == PetitionState::Running {
            let _ = petition.transition(PetitionState::Finished);
        }
        petition.id.clone()
    };

    let mut guard = handle.lock().await;
    let hook_handled = ctx.hooks.petition_finish(&guard).await;
    if !hook_handled {
        ctx.manager.on_finish(&guard).await;
    }
    if !guard.state.is_terminal() {
        let _ = guard.transition(PetitionState::Done);
    }
    guard.reply.close();
    drop(guard);

    ctx.petitions.remove(&id);
    debug!(%id, "petition finalized");
}

#[cfg(test)]
#[path = "finalizer_tests.rs"]
mod tests;
