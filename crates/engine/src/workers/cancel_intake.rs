// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cancel-Intake: blocks on `cancel-in`, forwarding every id to
//! `cancel-out` (`spec.md` §4.4).

use std::sync::Arc;

use tracing::debug;

use crate::context::EngineCtx;
use crate::manager::Manager;
use crate::queues::CancelInReceiver;

pub(crate) async fn run<M: Manager + 'static>(ctx: Arc<EngineCtx<M>>, mut cancel_in_rx: CancelInReceiver) {
    loop {
        let received = tokio::time::timeout(ctx.config.queue_timeout, cancel_in_rx.recv()).await;
        let id = match received {
            Ok(Some(None)) => {
                debug!("cancel-intake received shutdown sentinel");
                return;
            }
            Ok(Some(Some(id))) => id,
            Ok(None) => {
                debug!("cancel-in channel closed");
                return;
            }
            Err(_) => continue, // poll timeout; re-check for the sentinel next iteration
        };

        ctx.queues.cancel_out.push(id);
    }
}

#[cfg(test)]
#[path = "cancel_intake_tests.rs"]
mod tests;
