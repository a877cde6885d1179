//! Bounded worker pool for ingest tasks
//!
//! Jobs wait in a FIFO backlog of fixed size and are picked up by a fixed
//! number of workers. A job that panics is logged and the worker moves on to
//! the next one.

use crate::config::WhenFull;
use futures::future::{join_all, BoxFuture};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

type Job = BoxFuture<'static, ()>;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitError {
    #[error("Task queue backlog is full")]
    Full,

    #[error("Task queue is shut down")]
    Closed,
}

pub struct TaskQueue {
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
    when_full: WhenFull,
}

impl TaskQueue {
    /// Spawn `workers` workers on the current runtime
    pub fn new(workers: usize, backlog: usize, when_full: WhenFull) -> Self {
        let (sender, receiver) = mpsc::channel::<Job>(backlog.max(1));
        let receiver = Arc::new(tokio::sync::Mutex::new(receiver));

        let handles = (0..workers.max(1))
            .map(|id| tokio::spawn(worker(id, Arc::clone(&receiver))))
            .collect();
        info!(workers, backlog, ?when_full, "Task queue started");

        Self {
            sender: Mutex::new(Some(sender)),
            workers: Mutex::new(handles),
            when_full,
        }
    }

    /// Queue a job; waits for room or fails with [`SubmitError::Full`] depending on the policy
    pub async fn submit<F>(&self, job: F) -> Result<(), SubmitError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let sender = self
            .sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
            .ok_or(SubmitError::Closed)?;
        let job: Job = job.boxed();

        match self.when_full {
            WhenFull::Block => sender.send(job).await.map_err(|_| SubmitError::Closed),
            WhenFull::Reject => sender.try_send(job).map_err(|e| match e {
                mpsc::error::TrySendError::Full(_) => SubmitError::Full,
                mpsc::error::TrySendError::Closed(_) => SubmitError::Closed,
            }),
        }
    }

    /// Refuse new jobs, let workers finish the backlog, abort whatever is left after `timeout`
    ///
    /// Returns `true` when every worker finished in time.
    pub async fn shutdown(&self, timeout: Duration) -> bool {
        self.sender
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take();
        let handles: Vec<JoinHandle<()>> = std::mem::take(
            &mut *self
                .workers
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner()),
        );
        let aborts: Vec<_> = handles.iter().map(JoinHandle::abort_handle).collect();

        match tokio::time::timeout(timeout, join_all(handles)).await {
            Ok(_) => {
                info!("Task queue drained");
                true
            },
            Err(_) => {
                warn!(timeout_secs = timeout.as_secs(), "Task queue did not drain in time; abandoning workers");
                for abort in aborts {
                    abort.abort();
                }
                false
            },
        }
    }
}

async fn worker(id: usize, receiver: Arc<tokio::sync::Mutex<mpsc::Receiver<Job>>>) {
    debug!(worker = id, "Worker started");
    loop {
        let job = receiver.lock().await.recv().await;
        let Some(job) = job else {
            break;
        };
        if let Err(panic) = AssertUnwindSafe(job).catch_unwind().await {
            error!(worker = id, panic = %panic_message(panic.as_ref()), "Task panicked");
        }
    }
    debug!(worker = id, "Worker stopped");
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::oneshot;

    #[tokio::test]
    async fn test_runs_jobs_and_survives_panics() {
        let queue = TaskQueue::new(1, 8, WhenFull::Block);
        let done = Arc::new(AtomicUsize::new(0));

        queue.submit(async { panic!("boom") }).await.unwrap();
        for _ in 0..3 {
            let done = Arc::clone(&done);
            queue
                .submit(async move {
                    done.fetch_add(1, Ordering::SeqCst);
                })
                .await
                .unwrap();
        }

        assert!(queue.shutdown(Duration::from_secs(5)).await);
        assert_eq!(done.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_reject_when_full() {
        let queue = TaskQueue::new(1, 1, WhenFull::Reject);
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel::<()>();

        queue
            .submit(async move {
                started_tx.send(()).unwrap();
                release_rx.await.ok();
            })
            .await
            .unwrap();
        started_rx.await.unwrap();

        queue.submit(async {}).await.unwrap();
        assert_eq!(queue.submit(async {}).await, Err(SubmitError::Full));

        release_tx.send(()).unwrap();
        assert!(queue.shutdown(Duration::from_secs(5)).await);
    }

    #[tokio::test]
    async fn test_closed_after_shutdown_and_timeout_abandons() {
        let queue = TaskQueue::new(1, 4, WhenFull::Block);
        queue
            .submit(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
            })
            .await
            .unwrap();

        assert!(!queue.shutdown(Duration::from_millis(50)).await);
        assert_eq!(queue.submit(async {}).await, Err(SubmitError::Closed));
    }
}
