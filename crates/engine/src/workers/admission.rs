// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Admission: the check+dispatch step that moves a petition from
//! `ENQUEUED` to `RUNNING` (`spec.md` §4.4).

use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use orcha_core::PetitionState;
use rand::Rng;
use tracing::{debug, error, warn};

use crate::context::EngineCtx;
use crate::manager::Manager;
use crate::state::PetitionHandle;
use crate::workers::finalizer;

enum Verdict {
    Admitted,
    Denied,
    /// Routed to Finalizer already (condition-check hook error, `on_start`
    /// unhealthy, or an illegal transition raced by a concurrent cancel).
    Handled,
}

pub(crate) async fn run<M: Manager + 'static>(ctx: Arc<EngineCtx<M>>) {
    let mut last_tail: Option<String> = None;

    loop {
        if ctx.shutting_down.load(Ordering::Acquire) && ctx.queues.ready.is_empty() {
            debug!("admission drained, exiting");
            return;
        }

        ctx.queues.ready.wait_nonempty().await;

        let look_ahead = ctx.effective_look_ahead();
        let batch = ctx.queues.ready.pop_upto(look_ahead);
        if batch.is_empty() {
            continue;
        }

        let tail_id = match batch.last() {
            Some(h) => Some(h.lock().await.id.key()),
            None => None,
        };

        let mut admitted_any = false;
        let mut unsuccessful = Vec::new();

        for handle in batch {
            if handle.lock().await.is_empty_petition() {
                // Poison pill / "nothing admissible this round" marker:
                // stop processing immediately (`spec.md` §4.4, Admission).
                break;
            }

            match admit_one(&ctx, &handle).await {
                Verdict::Admitted => admitted_any = true,
                Verdict::Denied => unsuccessful.push(handle),
                Verdict::Handled => {}
            }
        }

        for handle in unsuccessful {
            let (priority, arrival_index) = mark_seen_and_maybe_starve(&ctx, &handle).await;
            ctx.queues.ready.push(priority, arrival_index, handle);
        }

        // Tight-spin guard: if nothing was admitted and the tail of the
        // queue is the same id as last round, the head is persistently
        // blocked; back off instead of spinning (`spec.md` §4.4).
        if !admitted_any && tail_id.is_some() && tail_id == last_tail {
            let millis = rand::thread_rng().gen_range(500..=5000);
            tokio::time::sleep(Duration::from_millis(millis)).await;
        }
        last_tail = tail_id;
    }
}

/// Bumps `seen_count` for a petition denied admission this round and, once
/// it reaches 1000, adds its id to `starving` — forcing the effective
/// look-ahead to 1 until it is eventually admitted (`spec.md` §4.4/§5, T4).
/// Returns the `(priority, arrival_index)` pair to re-push it with.
async fn mark_seen_and_maybe_starve<M: Manager + 'static>(
    ctx: &Arc<EngineCtx<M>>,
    handle: &PetitionHandle,
) -> (f64, u64) {
    let (priority, arrival_index, seen, id_key) = {
        let mut p = handle.lock().await;
        p.seen_count += 1;
        (p.priority, p.arrival_index, p.seen_count, p.id.key())
    };
    if seen >= 1000 {
        ctx.starving.lock().insert(id_key);
    }
    (priority, arrival_index)
}

/// Holds the petition lock across `manager`/hook awaits for the duration of
/// each check (`spec.md` §4.2's "called ... inside the per-petition lock").
/// The lock is a `tokio::sync::Mutex` (`crate::state::PetitionHandle`)
/// specifically so its guard may be held across an `.await` point inside a
/// task the worker pool spawns with a `Send` bound.
async fn admit_one<M: Manager + 'static>(ctx: &Arc<EngineCtx<M>>, handle: &PetitionHandle) -> Verdict {
    let id = handle.lock().await.id.clone();

    if handle.lock().await.state != PetitionState::Enqueued {
        // Raced with a concurrent cancel before Admission got to it.
        return Verdict::Handled;
    }

    let prior = {
        let guard = handle.lock().await;
        ctx.manager.condition(&guard).await
    };

    let checked = {
        let guard = handle.lock().await;
        ctx.hooks.condition_check(&guard, prior).await
    };

    match checked {
        Ok(Ok(())) => {}
        Ok(Err(failure)) => {
            ctx.hooks.condition_fail(&failure).await;
            debug!(%id, condition = %failure.condition, reason = %failure.reason, "admission denied");
            return Verdict::Denied;
        }
        Err(e) => {
            error!(%id, error = %e, "on_condition_check hook failed, breaking petition");
            break_petition(ctx, handle).await;
            return Verdict::Handled;
        }
    }

    let mut guard = handle.lock().await;
    if guard.transition(PetitionState::Running).is_err() {
        drop(guard);
        warn!(%id, "petition could not enter RUNNING (raced with a cancel), dropping from this round");
        return Verdict::Handled;
    }
    let hook_started = ctx.hooks.petition_start(&guard).await;
    let healthy = if hook_started { true } else { ctx.manager.on_start(&guard).await };
    drop(guard);

    if !healthy {
        error!(%id, "on_start reported an unhealthy petition, breaking");
        break_petition(ctx, handle).await;
        return Verdict::Handled;
    }

    ctx.starving.lock().remove(&id.key());
    ctx.petitions.mark_running(&id);

    let pool_ctx = Arc::clone(ctx);
    let pool_handle = Arc::clone(handle);
    ctx.pool.spawn(async move {
        run_action(pool_ctx, pool_handle).await;
    });

    Verdict::Admitted
}

async fn break_petition<M: Manager + 'static>(ctx: &Arc<EngineCtx<M>>, handle: &PetitionHandle) {
    {
        let mut guard = handle.lock().await;
        let _ = guard.transition(PetitionState::Broken);
    }
    finalizer::finalize(ctx, Arc::clone(handle)).await;
}

/// Runs the petition's action on the worker pool and routes the result to
/// Finalizer. Any error from the action sets `BROKEN`; success leaves the
/// petition `RUNNING` for Finalizer to promote to `FINISHED`.
async fn run_action<M: Manager + 'static>(ctx: Arc<EngineCtx<M>>, handle: PetitionHandle) {
    let id = handle.lock().await.id.clone();
    let (action, reply) = {
        let guard = handle.lock().await;
        (guard.action(), guard.reply.clone())
    };

    let result = action.run(&reply).await;

    {
        let mut guard = handle.lock().await;
        match result {
            Ok(code) => {
                if guard.state == PetitionState::Running {
                    guard.finish(code);
                }
            }
            Err(e) => {
                error!(%id, error = %e, "petition action failed");
                if guard.state.is_running_ish() {
                    let _ = guard.transition(PetitionState::Broken);
                }
            }
        }
    }

    ctx.petitions.unmark_running(&id);
    finalizer::finalize(&ctx, handle).await;
}

#[cfg(test)]
#[path = "admission_tests.rs"]
mod tests;
