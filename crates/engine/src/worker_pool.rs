// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The bounded worker pool: `tokio::spawn` gated by a `Semaphore`
//! (`spec.md` §4.4, "Worker pool"). Submissions happen only from Admission
//! and Cancel-Dispatch; no task blocks on another task of the same pool.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::error;

pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
}

impl WorkerPool {
    pub fn new(max_workers: usize) -> Self {
        Self { semaphore: Arc::new(Semaphore::new(max_workers.max(1))) }
    }

    /// Acquires a permit and spawns `task`. The permit is held for the
    /// duration of the task and released on completion (including panics).
    pub fn spawn<F>(&self, task: F) -> JoinHandle<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let semaphore = Arc::clone(&self.semaphore);
        tokio::spawn(async move {
            let permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => return,
            };
            task.await;
            drop(permit);
        })
    }

    /// Waits up to `timeout` for every outstanding permit to be released,
    /// i.e. all spawned tasks to finish. Used during shutdown draining
    /// (`spec.md` §5's "30s per pending worker-pool task").
    pub async fn drain(&self, max_workers: usize, timeout: std::time::Duration) {
        let acquire_all = self.semaphore.acquire_many_owned(max_workers as u32);
        match tokio::time::timeout(timeout, acquire_all).await {
            Ok(Ok(_permits)) => {}
            Ok(Err(_)) => {}
            Err(_) => error!("worker pool did not drain within {:?}", timeout),
        }
    }
}
