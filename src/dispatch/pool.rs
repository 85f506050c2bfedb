//! Route-bound worker pools.
//!
//! # Responsibilities
//! - Run submitted tasks on a fixed set of workers
//! - Bound the pending queue; reject when full
//! - Drain and join workers on close
//!
//! # Design Decisions
//! - Rejection is the backpressure signal, surfaced to the dispatcher as
//!   `PoolRejected` and to the client as an overload envelope
//! - Queue depth counts tasks not yet picked up by a worker

use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

type Task = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// A task was refused because the pool queue is full or the pool is closed.
#[derive(Debug, thiserror::Error)]
#[error("worker pool '{pool}' rejected task")]
pub struct PoolRejected {
    pub pool: String,
}

struct PoolInner {
    name: String,
    tx: Mutex<Option<mpsc::Sender<Task>>>,
    workers: Mutex<Vec<JoinHandle<()>>>,
}

/// Fixed-size executor with a bounded submission queue.
///
/// Clones share the same workers and queue.
#[derive(Clone)]
pub struct WorkerPool {
    inner: Arc<PoolInner>,
}

impl WorkerPool {
    /// Spawn `workers` tasks draining a queue of capacity `queue_size`.
    ///
    /// Both must be at least 1.
    pub fn new(name: &str, workers: usize, queue_size: usize) -> Self {
        let (tx, rx) = mpsc::channel::<Task>(queue_size.max(1));
        let rx = Arc::new(tokio::sync::Mutex::new(rx));

        let mut handles = Vec::with_capacity(workers.max(1));
        for _ in 0..workers.max(1) {
            let rx = rx.clone();
            handles.push(tokio::spawn(async move {
                loop {
                    let task = { rx.lock().await.recv().await };
                    match task {
                        Some(task) => task.await,
                        None => break,
                    }
                }
            }));
        }

        Self {
            inner: Arc::new(PoolInner {
                name: name.to_string(),
                tx: Mutex::new(Some(tx)),
                workers: Mutex::new(handles),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Submit a task; fails immediately when the queue is full.
    pub fn try_execute<F>(&self, task: F) -> Result<(), PoolRejected>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let guard = self.inner.tx.lock().expect("pool sender lock");
        let Some(tx) = guard.as_ref() else {
            return Err(PoolRejected {
                pool: self.inner.name.clone(),
            });
        };
        tx.try_send(Box::pin(task)).map_err(|_| PoolRejected {
            pool: self.inner.name.clone(),
        })
    }

    /// Close the queue, drain remaining tasks and join the workers.
    ///
    /// Subsequent submissions are rejected. Safe to call more than once.
    pub async fn close(&self) {
        let tx = self.inner.tx.lock().expect("pool sender lock").take();
        drop(tx);

        let handles: Vec<JoinHandle<()>> =
            std::mem::take(&mut *self.inner.workers.lock().expect("pool workers lock"));
        for handle in handles {
            if let Err(e) = handle.await {
                tracing::warn!(pool = %self.inner.name, error = %e, "worker task join failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    #[tokio::test]
    async fn runs_submitted_tasks() {
        let pool = WorkerPool::new("t", 2, 8);
        let done = Arc::new(AtomicU32::new(0));
        for _ in 0..4 {
            let done = done.clone();
            pool.try_execute(async move {
                done.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(done.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn rejects_when_queue_saturated() {
        let pool = WorkerPool::new("t", 1, 1);
        let (release_tx, release_rx) = tokio::sync::oneshot::channel::<()>();

        // Occupy the single worker until released.
        pool.try_execute(async move {
            let _ = release_rx.await;
        })
        .unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Queue slot.
        pool.try_execute(async {}).unwrap();
        // Queue full now.
        assert!(pool.try_execute(async {}).is_err());

        let _ = release_tx.send(());
    }

    #[tokio::test]
    async fn close_drains_and_rejects_new_tasks() {
        let pool = WorkerPool::new("t", 1, 4);
        let done = Arc::new(AtomicU32::new(0));
        for _ in 0..3 {
            let done = done.clone();
            pool.try_execute(async move {
                done.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }

        pool.close().await;
        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert!(pool.try_execute(async {}).is_err());
    }
}
