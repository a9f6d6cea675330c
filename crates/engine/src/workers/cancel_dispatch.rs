// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cancel-Dispatch: pops ids from `cancel-out` and, for every live
//! petition, submits a small worker-pool task that transitions it to
//! `CANCELLED`, invokes `terminate()`, and hands it to Finalizer
//! (`spec.md` §4.4).

use std::sync::Arc;

use orcha_core::{Frame, PetitionId, PetitionState};
use tracing::{debug, warn};

use crate::context::EngineCtx;
use crate::manager::Manager;
use crate::queues::CancelOutReceiver;
use crate::state::PetitionHandle;
use crate::workers::finalizer;

pub(crate) async fn run<M: Manager + 'static>(ctx: Arc<EngineCtx<M>>, mut cancel_out_rx: CancelOutReceiver) {
    loop {
        let Some(id) = cancel_out_rx.recv().await else {
            debug!("cancel-out channel closed");
            return;
        };

        match ctx.petitions.get(&id) {
            Some(handle) => {
                let pool_ctx = Arc::clone(&ctx);
                ctx.pool.spawn(async move {
                    cancel_one(pool_ctx, id, handle).await;
                });
            }
            None if ctx.petitions.contains(&id) => {
                // Still a placeholder: Intake hasn't converted it yet.
                // Mark it so Intake routes the real petition straight to
                // cancellation once conversion completes.
                ctx.petitions.mark_placeholder_state(&id, PetitionState::Cancelled);
                debug!(%id, "cancel recorded against an in-flight placeholder");
            }
            None => {
                warn!(%id, "cancel requested for an unknown petition id, dropping");
            }
        }
    }
}

/// Cancels a single live petition: asserts it is `RUNNING-ish`, transitions
/// it to `CANCELLED`, invokes `terminate()`, finalizes it, and pushes a
/// terminal sentinel onto its reply queue. Shared between the normal
/// Cancel-Dispatch loop above and `Engine::shutdown`'s "cancel every
/// remaining petition id" step (`spec.md` §5), which can no longer route
/// through `cancel-out` once Cancel-Dispatch has already joined.
pub(crate) async fn cancel_one<M: Manager + 'static>(ctx: Arc<EngineCtx<M>>, id: PetitionId, handle: PetitionHandle) {
    let was_running_ish = {
        let guard = handle.lock().await;
        guard.state.is_running_ish()
    };
    if !was_running_ish {
        debug!(%id, "cancel requested for a petition that already left RUNNING-ish, ignoring");
        return;
    }

    {
        let mut guard = handle.lock().await;
        if guard.transition(PetitionState::Cancelled).is_err() {
            return;
        }
    }

    let succeeded = {
        let guard = handle.lock().await;
        guard.terminate().await
    };
    if !succeeded {
        handle.lock().await.write(Frame::text("terminate() reported failure; petition may still be running"));
    }

    ctx.petitions.unmark_running(&id);
    handle.lock().await.reply.write(Frame::End);
    finalizer::finalize(&ctx, Arc::clone(&handle)).await;
}

#[cfg(test)]
#[path = "cancel_dispatch_tests.rs"]
mod tests;
