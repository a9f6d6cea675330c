// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

fn petition(id: &str, priority: f64, arrival_index: u64) -> Petition {
    let (reply, _rx) = ReplyQueue::channel();
    Petition::new(PetitionId::from(id), priority, reply, Value::Null, Arc::new(NoopAction), arrival_index)
}

#[parameterized(
    pending_to_enqueued = { PetitionState::Pending, PetitionState::Enqueued, true },
    pending_to_broken = { PetitionState::Pending, PetitionState::Broken, true },
    pending_to_running = { PetitionState::Pending, PetitionState::Running, false },
    enqueued_to_running = { PetitionState::Enqueued, PetitionState::Running, true },
    enqueued_to_cancelled = { PetitionState::Enqueued, PetitionState::Cancelled, true },
    running_to_finished = { PetitionState::Running, PetitionState::Finished, true },
    running_to_pending = { PetitionState::Running, PetitionState::Pending, false },
    finished_to_done = { PetitionState::Finished, PetitionState::Done, true },
    cancelled_to_done = { PetitionState::Cancelled, PetitionState::Done, true },
    done_to_anything = { PetitionState::Done, PetitionState::Pending, false },
    broken_to_anything = { PetitionState::Broken, PetitionState::Pending, false },
)]
fn transition_table(from: PetitionState, to: PetitionState, allowed: bool) {
    let mut p = petition("x", 1.0, 0);
    p.state = from;
    let result = p.transition(to);
    assert_eq!(result.is_ok(), allowed);
    if !allowed {
        assert!(matches!(result.unwrap_err(), OrchaError::InvalidState { .. }));
    }
}

#[test]
fn stopped_and_running_ish_sets() {
    assert!(PetitionState::Pending.is_stopped());
    assert!(PetitionState::Finished.is_stopped());
    assert!(PetitionState::Broken.is_stopped());
    assert!(!PetitionState::Running.is_stopped());

    assert!(PetitionState::Enqueued.is_running_ish());
    assert!(PetitionState::Running.is_running_ish());
    assert!(!PetitionState::Pending.is_running_ish());
}

#[test]
fn done_and_broken_are_terminal() {
    assert!(PetitionState::Done.is_terminal());
    assert!(PetitionState::Broken.is_terminal());
    assert!(!PetitionState::Cancelled.is_terminal());
}

#[test]
fn ordering_is_by_priority_then_arrival() {
    let lower_priority = petition("a", 1.0, 5);
    let higher_priority = petition("b", 2.0, 0);
    assert!(lower_priority < higher_priority);

    let first = petition("c", 1.0, 0);
    let second = petition("d", 1.0, 1);
    assert!(first < second);
}

#[test]
fn equality_is_on_id_not_priority_or_arrival() {
    let a = petition("same", 1.0, 0);
    let b = petition("same", 99.0, 42);
    assert_eq!(a, b);
}

#[test]
fn empty_petition_has_placeholder_priority_and_reserved_id() {
    let empty = Petition::empty();
    assert_eq!(empty.priority, PLACEHOLDER_PRIORITY);
    assert!(empty.is_empty_petition());
}

#[test]
fn placeholder_carries_only_id() {
    let ph = Petition::placeholder(PetitionId::from("x"));
    assert_eq!(ph.id, PetitionId::from("x"));
    assert_eq!(ph.state, PetitionState::Pending);
}

#[tokio::test]
async fn terminate_is_invoked_at_most_once() {
    let p = petition("x", 1.0, 0);
    assert!(p.terminate().await);
    assert!(!p.terminate().await);
}

#[test]
fn display_renders_id_at_priority() {
    let p = petition("job-1", 5.0, 0);
    assert_eq!(p.to_string(), "job-1@5");
}

fn arb_petition_state() -> impl proptest::prelude::Strategy<Value = PetitionState> {
    use proptest::prelude::*;
    prop_oneof![
        Just(PetitionState::Pending),
        Just(PetitionState::Enqueued),
        Just(PetitionState::Running),
        Just(PetitionState::Finished),
        Just(PetitionState::Cancelled),
        Just(PetitionState::Done),
        Just(PetitionState::Broken),
    ]
}

/// Only the eleven pairs in the `spec.md` §3 table are legal; every other
/// `(from, to)` combination over the seven states must reject with
/// `InvalidStateError` (T5).
fn is_in_spec_table(from: PetitionState, to: PetitionState) -> bool {
    use PetitionState::*;
    matches!(
        (from, to),
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

proptest::proptest! {
    #[test]
    fn transition_matches_the_spec_table_for_every_pair(from in arb_petition_state(), to in arb_petition_state()) {
        let mut p = petition("x", 1.0, 0);
        p.state = from;
        let result = p.transition(to);
        proptest::prop_assert_eq!(result.is_ok(), is_in_spec_table(from, to));
        if !is_in_spec_table(from, to) {
            proptest::prop_assert!(matches!(result.unwrap_err(), OrchaError::InvalidState { .. }));
        }
    }

    /// Ordering is total on `(priority, arrival-index)` regardless of id
    /// (`spec.md` §3).
    #[test]
    fn ordering_is_consistent_with_priority_and_arrival(
        priority_a in -1000.0f64..1000.0,
        priority_b in -1000.0f64..1000.0,
        arrival_a in 0u64..1000,
        arrival_b in 0u64..1000,
    ) {
        let a = petition("a", priority_a, arrival_a);
        let b = petition("b", priority_b, arrival_b);
        let expected = priority_a
            .partial_cmp(&priority_b)
            .unwrap()
            .then(arrival_a.cmp(&arrival_b));
        proptest::prop_assert_eq!(a.cmp(&b), expected);
    }
}
