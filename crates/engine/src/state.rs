// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The engine's `petitions` map (invariant I1) and the running-id set
//! (invariant I3).

use orcha_core::{Petition, PetitionId, PetitionState};
use parking_lot::Mutex;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::Mutex as AsyncMutex;

/// A shared, lockable petition. Every worker that mutates `state` does so
/// while holding this lock (I2). Unlike the maps below, this lock is
/// sometimes held across hook/manager `.await` points (`on_start`,
/// `on_finish`, `terminate`, the hook chain) per `spec.md` §4.2's "called
/// ... inside the per-petition lock" contract, so it is a
/// `tokio::sync::Mutex` rather than `parking_lot`'s — `parking_lot` guards
/// are `!Send` and cannot be held across an await point inside a task the
/// worker pool spawns with a `Send` bound.
pub type PetitionHandle = Arc<AsyncMutex<Petition>>;

/// One entry in the `petitions` map.
///
/// Intake inserts a [`Slot::Placeholder`] *before* running any user code, so
/// a concurrent cancel for the same id is not lost (`spec.md` §4.4,
/// Intake). It is replaced by [`Slot::Full`] once `convert_to_petition`
/// succeeds.
enum Slot {
    Placeholder(PetitionState),
    Full(PetitionHandle),
}

/// `Mutex<HashMap<id, Slot>>` behind `Engine::petitions` (I1).
#[derive(Default)]
pub struct PetitionsMap {
    inner: Mutex<HashMap<String, Slot>>,
    running: Mutex<HashSet<String>>,
}

impl PetitionsMap {
    /// Inserts a placeholder for `id`, returning `false` if one (or a full
    /// petition) already exists for that id.
    pub fn insert_placeholder(&self, id: &PetitionId) -> bool {
        let mut map = self.inner.lock();
        if map.contains_key(&id.key()) {
            return false;
        }
        map.insert(id.key(), Slot::Placeholder(PetitionState::Pending));
        true
    }

    /// Replaces a placeholder with the real petition, carrying over any
    /// state an early cancel already set on the placeholder. Returns that
    /// preserved state, if any.
    pub fn promote(&self, id: &PetitionId, handle: PetitionHandle) -> Option<PetitionState> {
        let mut map = self.inner.lock();
        let preserved = match map.remove(&id.key()) {
            Some(Slot::Placeholder(state)) => Some(state),
            Some(Slot::Full(_)) | None => None,
        };
        map.insert(id.key(), Slot::Full(handle));
        preserved
    }

    /// Sets the state recorded against a placeholder (used when a cancel
    /// arrives before Intake has finished converting the message).
    pub fn mark_placeholder_state(&self, id: &PetitionId, state: PetitionState) {
        if let Some(Slot::Placeholder(existing)) = self.inner.lock().get_mut(&id.key()) {
            *existing = state;
        }
    }

    pub fn remove_placeholder(&self, id: &PetitionId) {
        let mut map = self.inner.lock();
        if matches!(map.get(&id.key()), Some(Slot::Placeholder(_))) {
            map.remove(&id.key());
        }
    }

    pub fn get(&self, id: &PetitionId) -> Option<PetitionHandle> {
        match self.inner.lock().get(&id.key())? {
            Slot::Full(handle) => Some(Arc::clone(handle)),
            Slot::Placeholder(_) => None,
        }
    }

    pub fn contains(&self, id: &PetitionId) -> bool {
        self.inner.lock().contains_key(&id.key())
    }

    pub fn remove(&self, id: &PetitionId) {
        self.inner.lock().remove(&id.key());
        self.running.lock().remove(&id.key());
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn mark_running(&self, id: &PetitionId) {
        self.running.lock().insert(id.key());
    }

    pub fn unmark_running(&self, id: &PetitionId) {
        self.running.lock().remove(&id.key());
    }

    pub fn running_count(&self) -> usize {
        self.running.lock().len()
    }

    pub fn all_ids(&self) -> Vec<PetitionId> {
        self.inner.lock().keys().map(|k| PetitionId::from(k.as_str())).collect()
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
