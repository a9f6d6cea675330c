use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use orcha_core::{ConditionFailed, NoopAction, OrchaError, Petition, PetitionAction, PetitionId, PetitionState, ReplyQueue};
use serde_json::Value;
use tokio::sync::Mutex;

use super::*;
use crate::hooks::Hook;
use crate::test_support::{test_config, test_ctx, TestManager};

fn enqueued_handle(id: &str) -> (PetitionHandle, ReplyQueue) {
    let petition_id = PetitionId::from(id);
    let (reply, _frames) = ReplyQueue::channel();
    let mut petition = Petition::new(petition_id, 1.0, reply.clone(), Value::Null, Arc::new(NoopAction), 0);
    petition.transition(PetitionState::Enqueued).unwrap();
    (Arc::new(Mutex::new(petition)), reply)
}

#[tokio::test]
async fn condition_failure_requeues_and_increments_seen_count() {
    let manager = TestManager {
        condition: Box::new(|_p| Err(ConditionFailed { condition: "always".into(), reason: "no".into(), environment: None })),
        ..Default::default()
    };
    let (ctx, _rx) = test_ctx(manager, test_config());
    let (handle, _reply) = enqueued_handle("denied");

    let verdict = admit_one(&ctx, &handle).await;
    assert!(matches!(verdict, Verdict::Denied));
    assert_eq!(handle.lock().await.seen_count, 0); // run() bumps seen_count, not admit_one
    assert_eq!(handle.lock().await.state, PetitionState::Enqueued);
}

#[tokio::test]
async fn healthy_admission_runs_the_action_and_finalizes() {
    let ran = Arc::new(AtomicBool::new(false));
    let ran_in_action = Arc::clone(&ran);

    struct RecordingAction {
        ran: Arc<AtomicBool>,
    }
    #[async_trait]
    impl PetitionAction for RecordingAction {
        async fn run(&self, _reply: &ReplyQueue) -> Result<i32, OrchaError> {
            self.ran.store(true, Ordering::SeqCst);
            Ok(0)
        }
        async fn terminate(&self) -> bool {
            true
        }
    }

    let manager = TestManager::default();
    let (ctx, _rx) = test_ctx(manager, test_config());

    let petition_id = PetitionId::from("ok");
    let (reply, _frames) = ReplyQueue::channel();
    let mut petition = Petition::new(
        petition_id.clone(),
        1.0,
        reply,
        Value::Null,
        Arc::new(RecordingAction { ran: ran_in_action }),
        0,
    );
    petition.transition(PetitionState::Enqueued).unwrap();
    let handle: PetitionHandle = Arc::new(Mutex::new(petition));
    ctx.petitions.insert_placeholder(&petition_id);
    ctx.petitions.promote(&petition_id, Arc::clone(&handle));

    let verdict = admit_one(&ctx, &handle).await;
    assert!(matches!(verdict, Verdict::Admitted));
    assert_eq!(handle.lock().await.state, PetitionState::Running);

    ctx.pool.drain(ctx.config.resolved_max_workers(), Duration::from_secs(1)).await;

    assert!(ran.load(Ordering::SeqCst));
    assert!(!ctx.petitions.contains(&petition_id));
}

#[tokio::test]
async fn unhealthy_on_start_breaks_the_petition() {
    let manager = TestManager { on_start: Box::new(|_p| false), ..Default::default() };
    let (ctx, _rx) = test_ctx(manager, test_config());
    let (handle, _reply) = enqueued_handle("unhealthy");
    ctx.petitions.insert_placeholder(&PetitionId::from("unhealthy"));
    ctx.petitions.promote(&PetitionId::from("unhealthy"), Arc::clone(&handle));

    let verdict = admit_one(&ctx, &handle).await;
    assert!(matches!(verdict, Verdict::Handled));
    assert_eq!(handle.lock().await.state, PetitionState::Broken);
}

#[tokio::test]
async fn a_petition_not_in_enqueued_is_skipped() {
    let manager = TestManager::default();
    let (ctx, _rx) = test_ctx(manager, test_config());
    let (handle, _reply) = enqueued_handle("raced");
    handle.lock().await.transition(PetitionState::Cancelled).unwrap();

    let verdict = admit_one(&ctx, &handle).await;
    assert!(matches!(verdict, Verdict::Handled));
    assert_eq!(handle.lock().await.state, PetitionState::Cancelled);
}

#[tokio::test]
async fn a_hard_condition_check_hook_error_breaks_the_petition() {
    struct ExplodingHook;
    #[async_trait]
    impl Hook for ExplodingHook {
        async fn on_condition_check(
            &self,
            _petition: &Petition,
            _prior: &Result<(), ConditionFailed>,
        ) -> Result<Option<ConditionFailed>, OrchaError> {
            Err(OrchaError::Runtime("boom".into()))
        }
    }

    let manager = TestManager { hooks: vec![Arc::new(ExplodingHook)], ..Default::default() };
    let (ctx, _rx) = test_ctx(manager, test_config());
    let petition_id = PetitionId::from("exploding");
    let (handle, _reply) = enqueued_handle("exploding");
    ctx.petitions.insert_placeholder(&petition_id);
    ctx.petitions.promote(&petition_id, Arc::clone(&handle));

    let verdict = admit_one(&ctx, &handle).await;
    assert!(matches!(verdict, Verdict::Handled));
    assert!(!ctx.petitions.contains(&petition_id));
}

#[tokio::test]
async fn seen_count_reaching_1000_forces_look_ahead_to_one() {
    let manager = TestManager::default();
    let (ctx, _rx) = test_ctx(manager, test_config());
    let (handle, _reply) = enqueued_handle("starving");

    assert_eq!(ctx.effective_look_ahead(), ctx.config.look_ahead.max(1));

    for _ in 0..999 {
        mark_seen_and_maybe_starve(&ctx, &handle).await;
    }
    assert!(ctx.starving.lock().is_empty());
    assert_eq!(ctx.effective_look_ahead(), ctx.config.look_ahead.max(1));

    mark_seen_and_maybe_starve(&ctx, &handle).await;
    assert_eq!(handle.lock().await.seen_count, 1000);
    let id_key = handle.lock().await.id.key();
    assert!(ctx.starving.lock().contains(&id_key));
    assert_eq!(ctx.effective_look_ahead(), 1);
}

#[tokio::test]
async fn admitting_a_petition_clears_it_from_the_starving_set() {
    let manager = TestManager::default();
    let (ctx, _rx) = test_ctx(manager, test_config());
    let petition_id = PetitionId::from("was-starving");
    let (handle, _reply) = enqueued_handle("was-starving");
    ctx.petitions.insert_placeholder(&petition_id);
    ctx.petitions.promote(&petition_id, Arc::clone(&handle));
    ctx.starving.lock().insert(petition_id.key());

    let verdict = admit_one(&ctx, &handle).await;
    assert!(matches!(verdict, Verdict::Admitted));
    assert!(!ctx.starving.lock().contains(&petition_id.key()));

    ctx.pool.drain(ctx.config.resolved_max_workers(), Duration::from_secs(1)).await;
}

#[tokio::test]
async fn run_exits_once_shutting_down_and_ready_is_drained() {
    let manager = TestManager::default();
    let (ctx, _rx) = test_ctx(manager, test_config());
    ctx.shutting_down.store(true, Ordering::Release);

    let task = tokio::spawn(run(Arc::clone(&ctx)));
    tokio::time::timeout(Duration::from_secs(1), task).await.unwrap().unwrap();
}
