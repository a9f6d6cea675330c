// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `hello-world` demo plugin.
//!
//! `spec.md` places concrete petition-logic plugins (Docker, resource
//! limits, etc.) out of core scope, but `orcha serve`/`orcha run` still need
//! *something* to dispatch to by name (`spec.md` §6). This module is the
//! Rust counterpart of the original Python framework's own
//! `samples/hello_orcha.py` demo plugin (`original_source/`): it counts to
//! `counter`, sleeping `sleep_time` seconds between each line, and is the
//! plugin exercised by `spec.md` §8's end-to-end scenario E1.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use orcha_core::{ConditionFailed, Frame, Message, OrchaError, Petition, PetitionAction, ReplyQueue};
use serde_json::Value;

use crate::plugin::{Plugin, PluginConfig};
use orcha_engine::Manager;

/// `hello-world`'s action: prints `"Hello World! {i}"` for `i` in
/// `0..counter`, sleeping `sleep_time` between lines. Cooperative
/// cancellation checks `cancelled` between iterations, matching the
/// original's `Process.terminate()` cooperative-kill pattern without
/// actually spawning an OS process.
struct HelloAction {
    counter: u64,
    sleep_time: Duration,
    cancelled: Arc<AtomicBool>,
}

#[async_trait]
impl PetitionAction for HelloAction {
    async fn run(&self, reply: &ReplyQueue) -> Result<i32, OrchaError> {
        for i in 0..self.counter {
            if self.cancelled.load(Ordering::Acquire) {
                return Ok(1);
            }
            reply.write(Frame::text(format!("Hello World! {i}")));
            if !self.sleep_time.is_zero() {
                tokio::time::sleep(self.sleep_time).await;
            }
        }
        Ok(0)
    }

    async fn terminate(&self) -> bool {
        self.cancelled.store(true, Ordering::Release);
        true
    }
}

/// `hello-world`'s manager: admits everything, converts `extras.counter`
/// (default 1) and `extras.sleep_time` (seconds, default 0) into a
/// [`HelloAction`]. Mirrors `MyManager`/`MyPetition` in
/// `original_source/samples/hello_orcha.py`.
pub struct HelloManager;

#[async_trait]
impl Manager for HelloManager {
    async fn convert_to_petition(&self, message: Message, reply: ReplyQueue) -> Option<Petition> {
        let counter = message.extras.get("counter").and_then(Value::as_u64).unwrap_or(1);
        let sleep_time = message.extras.get("sleep_time").and_then(Value::as_f64).unwrap_or(0.0);
        let priority = message.extras.get("priority").and_then(Value::as_f64).unwrap_or(0.0);

        let action = Arc::new(HelloAction {
            counter,
            sleep_time: Duration::from_secs_f64(sleep_time.max(0.0)),
            cancelled: Arc::new(AtomicBool::new(false)),
        });

        Some(Petition::new(message.id, priority, reply, Value::Null, action, 0))
    }

    async fn condition(&self, _petition: &Petition) -> Result<(), ConditionFailed> {
        Ok(())
    }

    async fn on_start(&self, _petition: &Petition) -> bool {
        true
    }

    async fn on_finish(&self, _petition: &Petition) {}
}

pub struct HelloPlugin;

impl Plugin for HelloPlugin {
    fn name(&self) -> &str {
        "hello-world"
    }

    fn build_manager(&self, _config: &PluginConfig) -> Box<dyn Manager> {
        Box::new(HelloManager)
    }
}
