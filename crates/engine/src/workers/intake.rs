// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Intake: converts inbound messages into petitions (`spec.md` §4.4).

use std::sync::atomic::Ordering;
use std::sync::Arc;

use orcha_core::{Petition, PetitionId, PetitionState};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::context::EngineCtx;
use crate::manager::Manager;
use crate::queues::SubmitReceiver;

pub(crate) async fn run<M: Manager + 'static>(ctx: Arc<EngineCtx<M>>, mut submit_rx: SubmitReceiver) {
    loop {
        let received = tokio::time::timeout(ctx.config.queue_timeout, submit_rx.recv()).await;
        let submission = match received {
            Ok(Some(None)) => {
                debug!("intake received shutdown sentinel");
                return;
            }
            Ok(Some(Some(submission))) => submission,
            Ok(None) => {
                debug!("submit channel closed");
                return;
            }
            Err(_) => continue, // poll timeout, re-check shutdown flag
        };

        if ctx.shutting_down.load(Ordering::Acquire) {
            debug!(id = %submission.message.id, "dropping submission received during shutdown");
            continue;
        }

        let id = submission.message.id.clone();
        if !ctx.petitions.insert_placeholder(&id) {
            warn!(%id, "duplicate petition id submitted, dropping");
            continue;
        }

        let message = submission.message;
        let reply = submission.reply;
        let converted = match ctx.hooks.preconvert(&message, &reply).await {
            Some(petition) => Some(petition),
            None => ctx.manager.convert_to_petition(message, reply).await,
        };

        let Some(mut petition) = converted else {
            ctx.petitions.remove_placeholder(&id);
            continue;
        };

        petition.arrival_index = ctx.queues.arrivals.next();
        ctx.hooks.petition_create(&petition).await;

        route_converted(&ctx, id, petition).await;
    }
}

async fn route_converted<M: Manager + 'static>(ctx: &Arc<EngineCtx<M>>, id: PetitionId, mut petition: Petition) {
    if petition.transition(PetitionState::Enqueued).is_err() {
        warn!(%id, "petition could not enter ENQUEUED, dropping");
        ctx.petitions.remove_placeholder(&id);
        return;
    }

    let priority = petition.priority;
    let arrival_index = petition.arrival_index;
    let handle = Arc::new(Mutex::new(petition));

    let preserved = ctx.petitions.promote(&id, Arc::clone(&handle));
    let early_terminal = match preserved {
        Some(PetitionState::Cancelled) => Some(PetitionState::Cancelled),
        Some(PetitionState::Broken) => Some(PetitionState::Broken),
        _ => None,
    };

    match early_terminal {
        Some(target) => {
            let ok = handle.lock().await.transition(target).is_ok();
            if ok {
                debug!(%id, ?target, "routing early-cancelled petition directly to finalization");
                crate::workers::finalizer::finalize(ctx, Arc::clone(&handle)).await;
            }
        }
        None => {
            ctx.queues.ready.push(priority, arrival_index, handle);
        }
    }
}

#[cfg(test)]
#[path = "intake_tests.rs"]
mod tests;
