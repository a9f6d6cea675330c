use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use orcha_core::{Message, NoopAction, Petition, PetitionState, ReplyQueue};
use serde_json::Value;

use super::*;
use crate::queues::Submission;
use crate::test_support::{test_config, test_ctx, TestManager};

fn petition_for(id: &orcha_core::PetitionId, reply: ReplyQueue) -> Petition {
    Petition::new(id.clone(), 1.0, reply, Value::Null, Arc::new(NoopAction), 0)
}

#[tokio::test]
async fn converts_and_enqueues_a_petition() {
    let manager = TestManager {
        convert: Box::new(|message, reply| Some(petition_for(&message.id, reply))),
        ..Default::default()
    };
    let (ctx, rx) = test_ctx(manager, test_config());

    let submit_tx = ctx.queues.submit_tx.clone();
    let handle = tokio::spawn(run(Arc::clone(&ctx), rx.submit_rx));

    let (reply, _frames) = ReplyQueue::channel();
    submit_tx.send(Some(Submission { message: Message::new("a"), reply })).await.unwrap();
    submit_tx.send(None).await.unwrap();
    handle.await.unwrap();

    assert_eq!(ctx.petitions.len(), 1);
    assert_eq!(ctx.queues.ready.len(), 1);
}

#[tokio::test]
async fn duplicate_id_is_dropped_without_reconverting() {
    let calls = Arc::new(AtomicUsize::new(0));
    let calls_in_closure = Arc::clone(&calls);
    let manager = TestManager {
        convert: Box::new(move |message, reply| {
            calls_in_closure.fetch_add(1, Ordering::SeqCst);
            Some(petition_for(&message.id, reply))
        }),
        ..Default::default()
    };
    let (ctx, rx) = test_ctx(manager, test_config());
    let submit_tx = ctx.queues.submit_tx.clone();
    let handle = tokio::spawn(run(Arc::clone(&ctx), rx.submit_rx));

    let (reply1, _f1) = ReplyQueue::channel();
    let (reply2, _f2) = ReplyQueue::channel();
    submit_tx.send(Some(Submission { message: Message::new("dup"), reply: reply1 })).await.unwrap();
    submit_tx.send(Some(Submission { message: Message::new("dup"), reply: reply2 })).await.unwrap();
    submit_tx.send(None).await.unwrap();
    handle.await.unwrap();

    assert_eq!(ctx.petitions.len(), 1);
    // The second submission for the same id is rejected by the placeholder
    // insert before conversion is ever attempted.
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn rejected_conversion_clears_the_placeholder() {
    let manager = TestManager { convert: Box::new(|_m, _r| None), ..Default::default() };
    let (ctx, rx) = test_ctx(manager, test_config());
    let submit_tx = ctx.queues.submit_tx.clone();
    let handle = tokio::spawn(run(Arc::clone(&ctx), rx.submit_rx));

    let (reply, _frames) = ReplyQueue::channel();
    submit_tx.send(Some(Submission { message: Message::new("rejected"), reply })).await.unwrap();
    submit_tx.send(None).await.unwrap();
    handle.await.unwrap();

    assert!(ctx.petitions.is_empty());
    assert!(ctx.queues.ready.is_empty());
}

#[tokio::test]
async fn route_converted_sends_an_already_cancelled_petition_straight_to_finalization() {
    let manager = TestManager::default();
    let (ctx, _rx) = test_ctx(manager, test_config());

    let id = orcha_core::PetitionId::from("early-cancel");
    let (reply, _frames) = ReplyQueue::channel();
    assert!(ctx.petitions.insert_placeholder(&id));
    ctx.petitions.mark_placeholder_state(&id, PetitionState::Cancelled);

    let petition = petition_for(&id, reply);
    route_converted(&ctx, id.clone(), petition).await;

    // finalizer::finalize removes the petition once it reaches a terminal state.
    assert!(!ctx.petitions.contains(&id));
    assert!(ctx.queues.ready.is_empty());
}
