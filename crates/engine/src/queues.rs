// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The four queues the scheduler core is built around (`spec.md` §4.4):
//! `submit`, `cancel-in` (cross-process, mpsc-backed), `ready` (in-process
//! priority queue), and `cancel-out` (in-process FIFO).

use orcha_core::{Message, PetitionId, ReplyQueue};
use parking_lot::Mutex;
use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::Arc;
use tokio::sync::{mpsc, Notify};

use crate::state::PetitionHandle;

/// A message paired with the reply queue the IPC layer created for it
/// (`spec.md` §3: "the server attaches an envelope containing the
/// per-request reply-queue"). This is the unit of work carried on
/// `submit`; `Manager::convert_to_petition` receives both halves so the
/// `Petition` it builds shares the same reply queue the client is already
/// reading from.
pub struct Submission {
    pub message: Message,
    pub reply: ReplyQueue,
}

/// A `None` sentinel terminates `submit`/`cancel-in` at shutdown.
pub type SubmitSender = mpsc::Sender<Option<Submission>>;
pub type SubmitReceiver = mpsc::Receiver<Option<Submission>>;
pub type CancelInSender = mpsc::Sender<Option<PetitionId>>;
pub type CancelInReceiver = mpsc::Receiver<Option<PetitionId>>;

/// Monotonic counter assigning each petition its FIFO tiebreak
/// (`spec.md` §3's "arrival-index").
#[derive(Default)]
pub struct ArrivalCounter(AtomicU64);

impl ArrivalCounter {
    pub fn next(&self) -> u64 {
        self.0.fetch_add(1, AtomicOrdering::Relaxed)
    }
}

struct ReadyEntry {
    priority: f64,
    arrival_index: u64,
    handle: PetitionHandle,
}

impl PartialEq for ReadyEntry {
    fn eq(&self, other: &Self) -> bool {
        self.priority == other.priority && self.arrival_index == other.arrival_index
    }
}
impl Eq for ReadyEntry {}

impl PartialOrd for ReadyEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// `BinaryHeap` is a max-heap; reverse the natural `(priority, arrival)`
/// ordering so `pop()` returns the *lowest* priority (earliest) petition.
impl Ord for ReadyEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .partial_cmp(&self.priority)
            .unwrap_or(Ordering::Equal)
            .then_with(|| other.arrival_index.cmp(&self.arrival_index))
    }
}

/// In-process priority queue of petitions by `(priority, FIFO-tiebreak)`.
/// No two petitions with the same id are ever simultaneously present (I4),
/// enforced by callers via [`crate::state::PetitionsMap`].
#[derive(Default)]
pub struct ReadyQueue {
    heap: Mutex<BinaryHeap<ReadyEntry>>,
    notify: Notify,
}

impl ReadyQueue {
    pub fn push(&self, priority: f64, arrival_index: u64, handle: PetitionHandle) {
        self.heap.lock().push(ReadyEntry { priority, arrival_index, handle });
        self.notify.notify_one();
    }

    /// Pops up to `max` petitions, never more than currently queued.
    pub fn pop_upto(&self, max: usize) -> Vec<PetitionHandle> {
        let mut heap = self.heap.lock();
        let n = max.min(heap.len());
        (0..n).filter_map(|_| heap.pop().map(|e| e.handle)).collect()
    }

    pub fn len(&self) -> usize {
        self.heap.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Blocks (cooperatively) until the queue has at least one entry, or
    /// returns immediately if it already does.
    pub async fn wait_nonempty(&self) {
        if !self.is_empty() {
            return;
        }
        self.notify.notified().await;
    }
}

/// In-process FIFO of ids to be cancelled.
#[derive(Clone)]
pub struct CancelOutQueue {
    sender: mpsc::UnboundedSender<PetitionId>,
}

pub struct CancelOutReceiver(mpsc::UnboundedReceiver<PetitionId>);

impl CancelOutQueue {
    pub fn channel() -> (Self, CancelOutReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, CancelOutReceiver(receiver))
    }

    pub fn push(&self, id: PetitionId) {
        let _ = self.sender.send(id);
    }
}

impl CancelOutReceiver {
    pub async fn recv(&mut self) -> Option<PetitionId> {
        self.0.recv().await
    }
}

/// The producer-side handles shared with the IPC layer, plus the in-process
/// `ready`/`cancel-out` structures. The corresponding receiver halves are
/// returned separately by [`Queues::new`] and moved into the worker tasks
/// exactly once at startup — ownership, not a runtime "already taken"
/// check, is what prevents a second consumer.
pub struct Queues {
    pub submit_tx: SubmitSender,
    pub cancel_in_tx: CancelInSender,
    pub ready: Arc<ReadyQueue>,
    pub cancel_out: CancelOutQueue,
    pub arrivals: ArrivalCounter,
}

/// The receiver halves, each owned by exactly one worker task.
pub struct QueueReceivers {
    pub submit_rx: SubmitReceiver,
    pub cancel_in_rx: CancelInReceiver,
    pub cancel_out_rx: CancelOutReceiver,
}

impl Queues {
    pub fn new() -> (Self, QueueReceivers) {
        let (submit_tx, submit_rx) = mpsc::channel(1024);
        let (cancel_in_tx, cancel_in_rx) = mpsc::channel(1024);
        let (cancel_out, cancel_out_rx) = CancelOutQueue::channel();
        (
            Self {
                submit_tx,
                cancel_in_tx,
                ready: Arc::new(ReadyQueue::default()),
                cancel_out,
                arrivals: ArrivalCounter::default(),
            },
            QueueReceivers { submit_rx, cancel_in_rx, cancel_out_rx },
        )
    }
}

#[cfg(test)]
#[path = "queues_tests.rs"]
mod tests;
