// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The hook chain (Pluggables): an ordered list of user hooks invoked at
//! fixed extension points (`spec.md` §4.3).
//!
//! Each extension point has a default no-op implementation — the
//! "capability set" design replacing the Python original's dynamic
//! attribute probing (`spec.md` §9). A hook that doesn't care about a point
//! simply never overrides it; the chain runs the free default.

use async_trait::async_trait;
use orcha_core::{ConditionFailed, Message, OrchaError, Petition, ReplyQueue};
use std::sync::Arc;
use tracing::warn;

/// A hook ordered in the chain by ascending `priority` (lower runs first),
/// mirroring the Python `Pluggable.__lt__` convention.
#[async_trait]
pub trait Hook: Send + Sync {
    fn priority(&self) -> f64 {
        0.0
    }

    async fn on_manager_start(&self) -> Result<(), OrchaError> {
        Ok(())
    }

    async fn on_manager_shutdown(&self) -> Result<(), OrchaError> {
        Ok(())
    }

    /// If any hook in the chain returns `Some`, `convert_to_petition` is
    /// bypassed for this message. `reply` is the same reply queue
    /// `convert_to_petition` would have received.
    async fn on_message_preconvert(
        &self,
        _message: &Message,
        _reply: &ReplyQueue,
    ) -> Result<Option<Petition>, OrchaError> {
        Ok(None)
    }

    async fn on_petition_create(&self, _petition: &Petition) -> Result<(), OrchaError> {
        Ok(())
    }

    /// May transform or veto the prior result. Returning `Some` is
    /// equivalent to the condition itself raising that failure.
    async fn on_condition_check(
        &self,
        _petition: &Petition,
        _prior: &Result<(), ConditionFailed>,
    ) -> Result<Option<ConditionFailed>, OrchaError> {
        Ok(None)
    }

    async fn on_condition_fail(&self, _failure: &ConditionFailed) -> Result<(), OrchaError> {
        Ok(())
    }

    /// Returns `true` if this hook itself started (or finished) the
    /// petition, in which case the manager's own `on_start`/`on_finish` is
    /// skipped for it.
    async fn on_petition_start(&self, _petition: &Petition) -> Result<bool, OrchaError> {
        Ok(false)
    }

    async fn on_petition_finish(&self, _petition: &Petition) -> Result<bool, OrchaError> {
        Ok(false)
    }
}

/// An ordered, priority-sorted collection of [`Hook`]s, shared across the
/// scheduler's workers.
#[derive(Clone, Default)]
pub struct HookChain {
    hooks: Vec<Arc<dyn Hook>>,
}

impl HookChain {
    pub fn new(mut hooks: Vec<Arc<dyn Hook>>) -> Self {
        hooks.sort_by(|a, b| a.priority().partial_cmp(&b.priority()).unwrap_or(std::cmp::Ordering::Equal));
        Self { hooks }
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// `on_message_preconvert`: first non-`None` hook result wins.
    pub async fn preconvert(&self, message: &Message, reply: &ReplyQueue) -> Option<Petition> {
        for hook in &self.hooks {
            match hook.on_message_preconvert(message, reply).await {
                Ok(Some(petition)) => return Some(petition),
                Ok(None) => {}
                Err(e) => warn!(error = %e, "on_message_preconvert hook failed, skipping"),
            }
        }
        None
    }

    pub async fn petition_create(&self, petition: &Petition) {
        for hook in &self.hooks {
            if let Err(e) = hook.on_petition_create(petition).await {
                warn!(error = %e, "on_petition_create hook failed, skipping");
            }
        }
    }

    /// Runs the `on_condition_check` chain over `prior`. A hook-raised
    /// `ConditionFailed` propagates to the caller as the inner `Err`; any
    /// other hook error aborts admission outright (`spec.md` §4.3, §7) and
    /// is returned as the outer `Err` rather than swallowed.
    pub async fn condition_check(
        &self,
        petition: &Petition,
        prior: Result<(), ConditionFailed>,
    ) -> Result<Result<(), ConditionFailed>, OrchaError> {
        let mut current = prior;
        for hook in &self.hooks {
            match hook.on_condition_check(petition, &current).await {
                Ok(Some(failure)) => current = Err(failure),
                Ok(None) => {}
                Err(e) => return Err(e),
            }
        }
        Ok(current)
    }

    pub async fn condition_fail(&self, failure: &ConditionFailed) {
        for hook in &self.hooks {
            if let Err(e) = hook.on_condition_fail(failure).await {
                warn!(error = %e, "on_condition_fail hook failed, skipping");
            }
        }
    }

    /// Returns `true` if a hook itself started the petition (manager's own
    /// `on_start` is then skipped).
    pub async fn petition_start(&self, petition: &Petition) -> bool {
        for hook in &self.hooks {
            match hook.on_petition_start(petition).await {
                Ok(true) => return true,
                Ok(false) => {}
                Err(e) => warn!(error = %e, "on_petition_start hook failed, skipping"),
            }
        }
        false
    }

    pub async fn petition_finish(&self, petition: &Petition) -> bool {
        for hook in &self.hooks {
            match hook.on_petition_finish(petition).await {
                Ok(true) => return true,
                Ok(false) => {}
                Err(e) => warn!(error = %e, "on_petition_finish hook failed, skipping"),
            }
        }
        false
    }

    pub async fn manager_start(&self) {
        for hook in &self.hooks {
            if let Err(e) = hook.on_manager_start().await {
                warn!(error = %e, "on_manager_start hook failed, skipping");
            }
        }
    }

    pub async fn manager_shutdown(&self) {
        for hook in &self.hooks {
            if let Err(e) = hook.on_manager_shutdown().await {
                warn!(error = %e, "on_manager_shutdown hook failed, skipping");
            }
        }
    }
}

#[cfg(test)]
#[path = "hooks_tests.rs"]
mod tests;
