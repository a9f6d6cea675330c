// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The client-chosen petition identifier.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Returns a string slice truncated to at most `n` characters.
pub fn short(s: &str, n: usize) -> &str {
    if s.len() <= n {
        s
    } else {
        &s[..n]
    }
}

/// A client-chosen petition identifier.
///
/// `Message.id` is "string or integer, client-chosen; treated as opaque."
/// Equality, ordering, and hashing are defined on the *stringified* form so
/// `Str("1")` and `Int(1)` compare equal, matching "id stringified on
/// compare" in the data model (`spec.md` §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PetitionId {
    Str(String),
    Int(i64),
}

impl PetitionId {
    /// The reserved id used by [`crate::petition::Petition::empty`].
    pub const EMPTY_ID: &'static str = "__empty__";

    /// Stringified form used for comparison, hashing, and map keys.
    pub fn key(&self) -> String {
        match self {
            PetitionId::Str(s) => s.clone(),
            PetitionId::Int(i) => i.to_string(),
        }
    }
}

impl fmt::Display for PetitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PetitionId::Str(s) => write!(f, "{s}"),
            PetitionId::Int(i) => write!(f, "{i}"),
        }
    }
}

impl PartialEq for PetitionId {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for PetitionId {}

impl Hash for PetitionId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for PetitionId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for PetitionId {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl From<&str> for PetitionId {
    fn from(s: &str) -> Self {
        PetitionId::Str(s.to_string())
    }
}

impl From<String> for PetitionId {
    fn from(s: String) -> Self {
        PetitionId::Str(s)
    }
}

impl From<i64> for PetitionId {
    fn from(i: i64) -> Self {
        PetitionId::Int(i)
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
