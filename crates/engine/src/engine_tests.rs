use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use orcha_core::{ConditionFailed, Message, OrchaError, Petition, PetitionId, ReplyQueue};

use super::*;

struct EchoManager {
    started: Arc<AtomicUsize>,
    finished: Arc<AtomicUsize>,
}

struct EchoAction;

#[async_trait]
impl orcha_core::PetitionAction for EchoAction {
    async fn run(&self, reply: &ReplyQueue) -> Result<i32, OrchaError> {
        reply.write(orcha_core::Frame::text("hello"));
        Ok(0)
    }
    async fn terminate(&self) -> bool {
        true
    }
}

#[async_trait]
impl Manager for EchoManager {
    async fn convert_to_petition(&self, message: Message, reply: ReplyQueue) -> Option<Petition> {
        Some(Petition::new(message.id, 1.0, reply, serde_json::Value::Null, Arc::new(EchoAction), 0))
    }

    async fn condition(&self, _petition: &Petition) -> Result<(), ConditionFailed> {
        Ok(())
    }

    async fn on_start(&self, _petition: &Petition) -> bool {
        self.started.fetch_add(1, Ordering::SeqCst);
        true
    }

    async fn on_finish(&self, _petition: &Petition) {
        self.finished.fetch_add(1, Ordering::SeqCst);
    }
}

fn test_config() -> EngineConfig {
    EngineConfig { max_workers: Some(2), look_ahead: 1, queue_timeout: Duration::from_millis(50) }
}

#[tokio::test]
async fn submit_runs_a_petition_to_completion_and_streams_frames() {
    let started = Arc::new(AtomicUsize::new(0));
    let finished = Arc::new(AtomicUsize::new(0));
    let manager = Arc::new(EchoManager { started: Arc::clone(&started), finished: Arc::clone(&finished) });
    let engine = Engine::new(test_config(), manager);

    let mut frames = engine.submit(Message::new("p1")).await.unwrap();

    let first = frames.recv().await.unwrap();
    assert_eq!(first, orcha_core::Frame::text("hello"));
    let second = frames.recv().await.unwrap();
    assert_eq!(second, orcha_core::Frame::Code(0));
    assert_eq!(frames.recv().await, None);

    // Give Finalizer a moment to run after the terminal frame is observed.
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(started.load(Ordering::SeqCst), 1);
    assert_eq!(finished.load(Ordering::SeqCst), 1);
    assert_eq!(engine.petition_count(), 0);

    engine.shutdown().await.unwrap();
}

#[tokio::test]
async fn cancel_stops_a_running_petition() {
    struct BlockingAction {
        cancelled: Arc<std::sync::atomic::AtomicBool>,
    }
    #[async_trait]
    impl orcha_core::PetitionAction for BlockingAction {
        async fn run(&self, _reply: &ReplyQueue) -> Result<i32, OrchaError> {
            while !self.cancelled.load(Ordering::SeqCst) {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
            Ok(0)
        }
        async fn terminate(&self) -> bool {
            self.cancelled.store(true, Ordering::SeqCst);
            true
        }
    }

    struct BlockingManager {
        cancelled: Arc<std::sync::atomic::AtomicBool>,
    }
    #[async_trait]
    impl Manager for BlockingManager {
        async fn convert_to_petition(&self, message: Message, reply: ReplyQueue) -> Option<Petition> {
            let action = Arc::new(BlockingAction { cancelled: Arc::clone(&self.cancelled) });
            Some(Petition::new(message.id, 1.0, reply, serde_json::Value::Null, action, 0))
        }
        async fn condition(&self, _petition: &Petition) -> Result<(), ConditionFailed> {
            Ok(())
        }
        async fn on_start(&self, _petition: &Petition) -> bool {
            true
        }
        async fn on_finish(&self, _petition: &Petition) {}
    }

    let engine = Engine::new(
        test_config(),
        Arc::new(BlockingManager { cancelled: Arc::new(std::sync::atomic::AtomicBool::new(false)) }),
    );
    let mut frames = engine.submit(Message::new("blocked")).await.unwrap();

    // Give Admission a moment to move it into RUNNING before cancelling.
    tokio::time::sleep(Duration::from_millis(50)).await;
    engine.cancel(PetitionId::from("blocked")).await.unwrap();

    let terminal = tokio::time::timeout(Duration::from_secs(1), frames.recv()).await.unwrap();
    assert_eq!(terminal, Some(orcha_core::Frame::End));

    engine.shutdown().await.unwrap();
}

#[tokio::test]
async fn shutdown_is_idempotent() {
    let manager = Arc::new(EchoManager { started: Arc::new(AtomicUsize::new(0)), finished: Arc::new(AtomicUsize::new(0)) });
    let engine = Engine::new(test_config(), manager);

    engine.shutdown().await.unwrap();
    let second = engine.shutdown().await;
    assert!(matches!(second, Err(OrchaError::AlreadyShuttingDown)));
}

#[tokio::test]
async fn submit_after_shutdown_is_rejected() {
    let manager = Arc::new(EchoManager { started: Arc::new(AtomicUsize::new(0)), finished: Arc::new(AtomicUsize::new(0)) });
    let engine = Engine::new(test_config(), manager);
    engine.shutdown().await.unwrap();

    let result = engine.submit(Message::new("too-late")).await;
    assert!(matches!(result, Err(OrchaError::ManagerShutdown)));
}
