// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `Engine`: the single value `main` owns, wiring the four queues and five
//! workers together (`spec.md` §9, "Singleton Processor" — modeled
//! explicitly as one value rather than a first-call-wins singleton).

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use orcha_core::{Frame, Message, OrchaError, Petition, PetitionId, ReplyQueue, PLACEHOLDER_PRIORITY};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::context::EngineCtx;
use crate::hooks::HookChain;
use crate::manager::Manager;
use crate::queues::{Queues, Submission};
use crate::state::PetitionsMap;
use crate::worker_pool::WorkerPool;
use crate::workers;

/// How long to wait for each long-lived worker task to join during
/// shutdown before giving up on it (`spec.md` §5).
const WORKER_JOIN_TIMEOUT: Duration = Duration::from_secs(5);

/// How long to wait for outstanding worker-pool tasks to drain during
/// shutdown (`spec.md` §5).
const POOL_DRAIN_TIMEOUT: Duration = Duration::from_secs(30);

struct Tasks {
    intake: JoinHandle<()>,
    admission: JoinHandle<()>,
    cancel_intake: JoinHandle<()>,
    cancel_dispatch: JoinHandle<()>,
}

/// The scheduler core: owns the four queues, the five workers, and the
/// bounded worker pool (`spec.md` §4.4). Constructed once by `main` and
/// shared by reference (`Arc<Engine<M>>`) with the IPC listener.
pub struct Engine<M: Manager + 'static> {
    ctx: Arc<EngineCtx<M>>,
    tasks: Mutex<Option<Tasks>>,
}

impl<M: Manager + 'static> Engine<M> {
    /// Builds the engine and immediately spawns its five worker tasks.
    pub fn new(config: EngineConfig, manager: Arc<M>) -> Self {
        let (queues, receivers) = Queues::new();
        let hooks = HookChain::new(manager.hooks());
        let max_workers = config.resolved_max_workers();

        let ctx = Arc::new(EngineCtx {
            config,
            manager,
            hooks,
            petitions: PetitionsMap::default(),
            queues,
            pool: WorkerPool::new(max_workers),
            shutting_down: AtomicBool::new(false),
            starving: Mutex::new(HashSet::new()),
        });

        let intake = tokio::spawn(workers::intake::run(Arc::clone(&ctx), receivers.submit_rx));
        let admission = tokio::spawn(workers::admission::run(Arc::clone(&ctx)));
        let cancel_intake =
            tokio::spawn(workers::cancel_intake::run(Arc::clone(&ctx), receivers.cancel_in_rx));
        let cancel_dispatch =
            tokio::spawn(workers::cancel_dispatch::run(Arc::clone(&ctx), receivers.cancel_out_rx));

        Self {
            ctx,
            tasks: Mutex::new(Some(Tasks { intake, admission, cancel_intake, cancel_dispatch })),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.ctx.config
    }

    /// `submit(message) -> reply-queue-proxy` (`spec.md` §4.5): enqueues
    /// `message` with a freshly created reply queue and returns the
    /// receiver half the IPC layer streams out to the client.
    pub async fn submit(&self, message: Message) -> Result<mpsc::UnboundedReceiver<Frame>, OrchaError> {
        if self.ctx.shutting_down.load(Ordering::Acquire) {
            return Err(OrchaError::ManagerShutdown);
        }
        let (reply, frames) = ReplyQueue::channel();
        self.ctx
            .queues
            .submit_tx
            .send(Some(Submission { message, reply }))
            .await
            .map_err(|_| OrchaError::ManagerShutdown)?;
        Ok(frames)
    }

    /// `cancel(id) -> none` (`spec.md` §4.5).
    pub async fn cancel(&self, id: PetitionId) -> Result<(), OrchaError> {
        if self.ctx.shutting_down.load(Ordering::Acquire) {
            return Err(OrchaError::ManagerShutdown);
        }
        self.ctx
            .queues
            .cancel_in_tx
            .send(Some(id))
            .await
            .map_err(|_| OrchaError::ManagerShutdown)?;
        Ok(())
    }

    pub fn running_count(&self) -> usize {
        self.ctx.petitions.running_count()
    }

    pub fn petition_count(&self) -> usize {
        self.ctx.petitions.len()
    }

    pub fn is_shutting_down(&self) -> bool {
        self.ctx.shutting_down.load(Ordering::Acquire)
    }

    /// Drains the engine per `spec.md` §5: sets `shutting_down`, sentinels
    /// `submit`/`cancel-in`, joins the four long-lived workers within a
    /// bounded timeout each, directly cancels whatever petitions remain
    /// (Cancel-Dispatch has already exited by this point), then drains the
    /// worker pool. Idempotent — a second call returns
    /// [`OrchaError::AlreadyShuttingDown`] (`spec.md` §7's "EEXIST").
    pub async fn shutdown(&self) -> Result<(), OrchaError> {
        let Some(tasks) = self.tasks.lock().take() else {
            return Err(OrchaError::AlreadyShuttingDown);
        };

        info!("engine shutdown starting");
        self.ctx.shutting_down.store(true, Ordering::Release);
        self.ctx.hooks.manager_shutdown().await;

        let _ = self.ctx.queues.submit_tx.send(None).await;
        let _ = self.ctx.queues.cancel_in_tx.send(None).await;
        // Admission blocks on `ready` being non-empty; wake it with the
        // poison pill so it re-checks `shutting_down` promptly.
        let arrival = self.ctx.queues.arrivals.next();
        self.ctx.queues.ready.push(
            PLACEHOLDER_PRIORITY,
            arrival,
            Arc::new(tokio::sync::Mutex::new(Petition::empty())),
        );

        if tokio::time::timeout(WORKER_JOIN_TIMEOUT, tasks.intake).await.is_err() {
            warn!("intake did not join within the shutdown timeout");
        }
        if tokio::time::timeout(WORKER_JOIN_TIMEOUT, tasks.admission).await.is_err() {
            warn!("admission did not join within the shutdown timeout");
        }
        if tokio::time::timeout(WORKER_JOIN_TIMEOUT, tasks.cancel_intake).await.is_err() {
            warn!("cancel-intake did not join within the shutdown timeout");
        }
        if tokio::time::timeout(WORKER_JOIN_TIMEOUT, tasks.cancel_dispatch).await.is_err() {
            warn!("cancel-dispatch did not join within the shutdown timeout");
        }

        for id in self.ctx.petitions.all_ids() {
            if let Some(handle) = self.ctx.petitions.get(&id) {
                let running_ish = handle.lock().await.state.is_running_ish();
                if running_ish {
                    workers::cancel_dispatch::cancel_one(Arc::clone(&self.ctx), id, handle).await;
                }
            }
        }

        self.ctx.pool.drain(self.ctx.config.resolved_max_workers(), POOL_DRAIN_TIMEOUT).await;
        info!("engine shutdown complete");
        Ok(())
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
