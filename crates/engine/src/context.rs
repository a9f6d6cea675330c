// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared state every scheduler worker task holds an `Arc` to.

use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::EngineConfig;
use crate::hooks::HookChain;
use crate::manager::Manager;
use crate::queues::Queues;
use crate::state::PetitionsMap;
use crate::worker_pool::WorkerPool;

/// Everything Intake, Admission, Finalizer, Cancel-Intake, and
/// Cancel-Dispatch need, shared by `Arc` across the five worker tasks
/// (`spec.md` §4.4).
pub(crate) struct EngineCtx<M: Manager> {
    pub config: EngineConfig,
    pub manager: Arc<M>,
    pub hooks: HookChain,
    pub petitions: PetitionsMap,
    pub queues: Queues,
    pub pool: WorkerPool,
    /// Set once shutdown begins; checked by Intake/Cancel-Intake between
    /// polls and by Admission once `ready` drains (`spec.md` §5).
    pub shutting_down: AtomicBool,
    /// Ids whose `seen_count` has reached 1000 (`spec.md` §4.4, starvation
    /// rule). Non-empty forces the effective look-ahead to 1.
    pub starving: Mutex<HashSet<String>>,
}

impl<M: Manager> EngineCtx<M> {
    /// The configured look-ahead, clamped to 1 while any petition is
    /// starving (`spec.md` §9, Q3 — recomputed each round rather than
    /// saving/restoring a mutable "old" value).
    pub fn effective_look_ahead(&self) -> usize {
        if self.starving.lock().is_empty() {
            self.config.look_ahead.max(1)
        } else {
            1
        }
    }
}
