// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test doubles for the worker unit tests in this crate.

#![cfg(test)]
#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use async_trait::async_trait;
use orcha_core::{ConditionFailed, Message, Petition, ReplyQueue};
use parking_lot::Mutex;

use crate::config::EngineConfig;
use crate::context::EngineCtx;
use crate::hooks::{Hook, HookChain};
use crate::manager::Manager;
use crate::queues::{QueueReceivers, Queues};
use crate::state::PetitionsMap;
use crate::worker_pool::WorkerPool;

/// A fully-configurable [`Manager`] double. Every hook defaults to the
/// permissive behavior (accept everything, admit immediately, report
/// healthy). Override individual closures per test.
pub(crate) struct TestManager {
    pub convert: Box<dyn Fn(Message, ReplyQueue) -> Option<Petition> + Send + Sync>,
    pub condition: Box<dyn Fn(&Petition) -> Result<(), ConditionFailed> + Send + Sync>,
    pub on_start: Box<dyn Fn(&Petition) -> bool + Send + Sync>,
    pub on_finish: Box<dyn Fn(&Petition) + Send + Sync>,
    pub hooks: Vec<Arc<dyn Hook>>,
}

impl Default for TestManager {
    fn default() -> Self {
        Self {
            convert: Box::new(|_message, _reply| None),
            condition: Box::new(|_petition| Ok(())),
            on_start: Box::new(|_petition| true),
            on_finish: Box::new(|_petition| {}),
            hooks: Vec::new(),
        }
    }
}

#[async_trait]
impl Manager for TestManager {
    async fn convert_to_petition(&self, message: Message, reply: ReplyQueue) -> Option<Petition> {
        (self.convert)(message, reply)
    }

    async fn condition(&self, petition: &Petition) -> Result<(), ConditionFailed> {
        (self.condition)(petition)
    }

    async fn on_start(&self, petition: &Petition) -> bool {
        (self.on_start)(petition)
    }

    async fn on_finish(&self, petition: &Petition) {
        (self.on_finish)(petition)
    }

    fn hooks(&self) -> Vec<Arc<dyn Hook>> {
        self.hooks.clone()
    }
}

/// Builds an [`EngineCtx`] plus its queue receivers without spawning any
/// worker tasks, so a test can drive exactly one worker function directly.
pub(crate) fn test_ctx(manager: TestManager, config: EngineConfig) -> (Arc<EngineCtx<TestManager>>, QueueReceivers) {
    let (queues, receivers) = Queues::new();
    let hooks = HookChain::new(manager.hooks());
    let max_workers = config.resolved_max_workers();
    let ctx = Arc::new(EngineCtx {
        config,
        manager: Arc::new(manager),
        hooks,
        petitions: PetitionsMap::default(),
        queues,
        pool: WorkerPool::new(max_workers),
        shutting_down: AtomicBool::new(false),
        starving: Mutex::new(HashSet::new()),
    });
    (ctx, receivers)
}

pub(crate) fn test_config() -> EngineConfig {
    EngineConfig { max_workers: Some(2), look_ahead: 1, queue_timeout: std::time::Duration::from_millis(50) }
}
