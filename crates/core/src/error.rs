// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error kinds recognized by the core scheduling/lifecycle engine.

use crate::petition::PetitionState;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// The admission condition was not met.
///
/// Carries the same information the Python original did: a `condition` name,
/// a human `reason`, and an optional bag of environmental context that was
/// available when the condition was evaluated. Raising this is "the *only*
/// way to deny admission" (`spec.md` §4.2).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionFailed {
    pub condition: String,
    pub reason: String,
    pub environment: Option<HashMap<String, Value>>,
}

impl ConditionFailed {
    pub fn new(condition: impl Into<String>, reason: impl Into<String>) -> Self {
        Self { condition: condition.into(), reason: reason.into(), environment: None }
    }

    pub fn with_environment(mut self, environment: HashMap<String, Value>) -> Self {
        self.environment = Some(environment);
        self
    }
}

impl std::fmt::Display for ConditionFailed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "the condition \"{}\" was not met: {}", self.condition, self.reason)?;
        if let Some(env) = &self.environment {
            write!(f, " (environmental information={env:?})")?;
        }
        Ok(())
    }
}

impl std::error::Error for ConditionFailed {}

/// Top-level error kinds the engine recognizes (`spec.md` §7).
#[derive(Debug, Error)]
pub enum OrchaError {
    /// Submission or cancellation arrived after the server began draining.
    #[error("manager is shutting down")]
    ManagerShutdown,

    /// Shutdown was requested a second time; shutdown is idempotent.
    #[error("shutdown already in progress")]
    AlreadyShuttingDown,

    /// The pre-shared key handshake failed.
    #[error("authentication failed")]
    AuthenticationError,

    /// A state transition not present in the `PetitionState` table was attempted.
    /// Always a programmer error.
    #[error("invalid state transition: {from:?} -> {to:?}")]
    InvalidState { from: PetitionState, to: PetitionState },

    /// Admission was denied.
    #[error(transparent)]
    ConditionFailed(#[from] ConditionFailed),

    /// An unhandled exception in user code (hook, `convert_to_petition`,
    /// `on_start`, `on_finish`, `terminate`, or the petition's own action).
    #[error("runtime error: {0}")]
    Runtime(String),
}
