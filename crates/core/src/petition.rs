// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The petition data object and its state machine.

use crate::error::OrchaError;
use crate::id::PetitionId;
use crate::message::{Frame, ReplyQueue};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::Arc;

/// Legal petition states and the table in `transition`.
///
/// Initial state is [`PetitionState::Pending`]; [`PetitionState::Done`] and
/// [`PetitionState::Broken`] are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PetitionState {
    Pending,
    Enqueued,
    Running,
    Finished,
    Cancelled,
    Done,
    Broken,
}

impl PetitionState {
    /// `STOPPED = {PENDING, FINISHED, BROKEN}`.
    pub fn is_stopped(self) -> bool {
        matches!(self, PetitionState::Pending | PetitionState::Finished | PetitionState::Broken)
    }

    /// `RUNNING-ish = {ENQUEUED, RUNNING}`.
    pub fn is_running_ish(self) -> bool {
        matches!(self, PetitionState::Enqueued | PetitionState::Running)
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, PetitionState::Done | PetitionState::Broken)
    }

    /// Whether `self -> next` appears in the table in `spec.md` §3.
    fn allows(self, next: PetitionState) -> bool {
        use PetitionState::*;
        matches!(
            (self, next),
            (Pending, Enqueued)
                | (Pending, Broken)
                | (Enqueued, Running)
                | (Enqueued, Cancelled)
                | (Enqueued, Broken)
                | (Running, Finished)
                | (Running, Cancelled)
                | (Running, Broken)
                | (Finished, Done)
                | (Finished, Broken)
                | (Cancelled, Done)
                | (Cancelled, Broken)
        )
    }
}

/// The user-supplied unit of work a petition carries.
///
/// `run` streams output into the petition's reply queue as it executes and
/// returns the final return code. `terminate` is the single cooperative
/// cancellation hook; the engine calls it at most once per petition,
/// enforced by [`Petition::terminate`]'s guard rather than trusting the
/// implementor.
#[async_trait]
pub trait PetitionAction: Send + Sync {
    async fn run(&self, reply: &ReplyQueue) -> Result<i32, OrchaError>;

    /// Returns whether termination succeeded.
    async fn terminate(&self) -> bool;
}

/// An action that does nothing and cannot be terminated usefully. Backs
/// [`Petition::empty`]'s poison-pill semantics.
pub struct NoopAction;

#[async_trait]
impl PetitionAction for NoopAction {
    async fn run(&self, _reply: &ReplyQueue) -> Result<i32, OrchaError> {
        Ok(0)
    }

    async fn terminate(&self) -> bool {
        true
    }
}

/// Priority reserved for internal placeholders and the poison pill.
pub const PLACEHOLDER_PRIORITY: f64 = f64::INFINITY;

/// The server-side counterpart of a client [`crate::message::Message`].
///
/// `Placeholder` and `EmptyPetition` from `spec.md` §4.1 are both
/// constructors of this single type (REDESIGN R1 in `DESIGN.md`) so the
/// scheduler's `ready` priority queue stays monomorphic over one `Petition`.
pub struct Petition {
    pub id: PetitionId,
    pub priority: f64,
    pub reply: ReplyQueue,
    pub payload: Value,
    pub state: PetitionState,
    pub seen_count: u32,
    pub arrival_index: u64,
    /// User-defined fields set during the run (e.g. the PID of a spawned
    /// child), opaque to the engine.
    pub extra: HashMap<String, Value>,
    action: Arc<dyn PetitionAction>,
    terminated: AtomicBool,
    finalized: AtomicBool,
    /// `true` for the two built-in variants from `spec.md` §4.1: a
    /// placeholder carries only an id; an empty petition is the poison pill.
    is_sentinel: bool,
}

impl Petition {
    pub fn new(
        id: PetitionId,
        priority: f64,
        reply: ReplyQueue,
        payload: Value,
        action: Arc<dyn PetitionAction>,
        arrival_index: u64,
    ) -> Self {
        Self {
            id,
            priority,
            reply,
            payload,
            state: PetitionState::Pending,
            seen_count: 0,
            arrival_index,
            extra: HashMap::new(),
            action,
            terminated: AtomicBool::new(false),
            finalized: AtomicBool::new(false),
            is_sentinel: false,
        }
    }

    /// Placeholder: carries only an id, used by Intake to mark "seen this
    /// id" before the real petition exists so a concurrent cancel is not
    /// lost.
    pub fn placeholder(id: PetitionId) -> Self {
        let (reply, _rx) = ReplyQueue::channel();
        Self {
            id,
            priority: PLACEHOLDER_PRIORITY,
            reply,
            payload: Value::Null,
            state: PetitionState::Pending,
            seen_count: 0,
            arrival_index: 0,
            extra: HashMap::new(),
            action: Arc::new(NoopAction),
            terminated: AtomicBool::new(false),
            finalized: AtomicBool::new(false),
            is_sentinel: true,
        }
    }

    /// The poison pill: `priority = +inf`, reserved id, inert action.
    /// Used for orderly shutdown and as the "no real work dequeued this
    /// round" signal.
    pub fn empty() -> Self {
        let (reply, _rx) = ReplyQueue::channel();
        Self {
            id: PetitionId::from(PetitionId::EMPTY_ID),
            priority: PLACEHOLDER_PRIORITY,
            reply,
            payload: Value::Null,
            state: PetitionState::Pending,
            seen_count: 0,
            arrival_index: 0,
            extra: HashMap::new(),
            action: Arc::new(NoopAction),
            terminated: AtomicBool::new(false),
            finalized: AtomicBool::new(false),
            is_sentinel: true,
        }
    }

    pub fn is_empty_petition(&self) -> bool {
        self.is_sentinel && self.id.key() == PetitionId::EMPTY_ID
    }

    pub fn action(&self) -> Arc<dyn PetitionAction> {
        Arc::clone(&self.action)
    }

    /// Enforces the table in `spec.md` §3; any other pair is a programmer
    /// error.
    pub fn transition(&mut self, next: PetitionState) -> Result<(), OrchaError> {
        if !self.state.allows(next) {
            return Err(OrchaError::InvalidState { from: self.state, to: next });
        }
        self.state = next;
        Ok(())
    }

    /// Pushes a frame onto the reply queue, swallowing "queue closed"
    /// (I5 is enforced inside `ReplyQueue` itself).
    pub fn write(&self, frame: Frame) {
        self.reply.write(frame);
    }

    /// Writes the final return code and closes the reply queue.
    pub fn finish(&self, code: i32) {
        self.reply.finish(code);
    }

    /// Calls the user's `terminate`, guaranteed at most once per petition.
    /// Subsequent calls return `false` without invoking user code again.
    pub async fn terminate(&self) -> bool {
        if self.terminated.swap(true, AtomicOrdering::AcqRel) {
            return false;
        }
        self.action.terminate().await
    }

    /// Claims finalization for this petition. Returns `true` on the first
    /// call; subsequent calls (e.g. a cancelled petition's action task
    /// racing Cancel-Dispatch's own finalization) return `false` so
    /// `on_finish` runs at most once.
    pub fn mark_finalized(&self) -> bool {
        !self.finalized.swap(true, AtomicOrdering::AcqRel)
    }
}

impl std::fmt::Display for Petition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.id, self.priority)
    }
}

impl PartialEq for Petition {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Petition {}

impl std::hash::Hash for Petition {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for Petition {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Petition {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .partial_cmp(&other.priority)
            .unwrap_or(Ordering::Equal)
            .then_with(|| self.arrival_index.cmp(&other.arrival_index))
    }
}

#[cfg(test)]
#[path = "petition_tests.rs"]
mod tests;
