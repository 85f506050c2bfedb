//! Asynchronous completion handoff.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tokio::sync::Notify;

use crate::dispatch::WorkerPool;

/// Pairs a request with its pending response and a completion signal.
///
/// Ownership of the context flows dispatcher → worker → writer: the worker
/// (or a task it schedules on the completer pool) calls [`on_complete`], and
/// the connection task observes completion through [`completed`] and performs
/// the single response write.
///
/// [`on_complete`]: AsyncContext::on_complete
/// [`completed`]: AsyncContext::completed
pub struct AsyncContext<T> {
    request: T,
    response: OnceLock<T>,
    complete: AtomicBool,
    notify: Notify,
    completer: WorkerPool,
}

impl<T> AsyncContext<T> {
    pub fn new(request: T, completer: WorkerPool) -> Arc<Self> {
        Arc::new(Self {
            request,
            response: OnceLock::new(),
            complete: AtomicBool::new(false),
            notify: Notify::new(),
            completer,
        })
    }

    pub fn request(&self) -> &T {
        &self.request
    }

    /// Complete the context with `response`.
    ///
    /// First caller wins; later calls are no-ops and return `false`. The
    /// winning response is immutable once set.
    pub fn on_complete(&self, response: T) -> bool {
        if self.response.set(response).is_err() {
            return false;
        }
        self.complete.store(true, Ordering::Release);
        self.notify.notify_waiters();
        true
    }

    /// Non-blocking completion check.
    pub fn is_complete(&self) -> bool {
        self.complete.load(Ordering::Acquire)
    }

    /// The winning response; `None` until complete.
    pub fn response(&self) -> Option<&T> {
        self.response.get()
    }

    /// Wait until the context is complete.
    pub async fn completed(&self) {
        while !self.is_complete() {
            let notified = self.notify.notified();
            if self.is_complete() {
                break;
            }
            notified.await;
        }
    }

    /// Pool on which processors may schedule deferred completion.
    pub fn completer(&self) -> &WorkerPool {
        &self.completer
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for AsyncContext<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncContext")
            .field("request", &self.request)
            .field("complete", &self.is_complete())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completer() -> WorkerPool {
        WorkerPool::new("test-completer", 2, 16)
    }

    #[tokio::test]
    async fn first_completion_wins() {
        let ctx = AsyncContext::new("req", completer());
        assert!(!ctx.is_complete());
        assert!(ctx.on_complete("first"));
        assert!(!ctx.on_complete("second"));
        assert!(ctx.is_complete());
        assert_eq!(ctx.response(), Some(&"first"));
    }

    #[tokio::test]
    async fn concurrent_completions_yield_one_response() {
        let ctx = AsyncContext::new(0u32, completer());
        let mut handles = Vec::new();
        for i in 0..8u32 {
            let ctx = ctx.clone();
            handles.push(tokio::spawn(async move { ctx.on_complete(i) }));
        }

        let mut wins = 0;
        for handle in handles {
            if handle.await.unwrap() {
                wins += 1;
            }
        }
        assert_eq!(wins, 1);
        assert!(ctx.response().is_some());
    }

    #[tokio::test]
    async fn completed_wakes_waiter() {
        let ctx = AsyncContext::new((), completer());
        let waiter = {
            let ctx = ctx.clone();
            tokio::spawn(async move {
                ctx.completed().await;
                *ctx.response().unwrap()
            })
        };

        tokio::time::sleep(std::time::Duration::from_millis(20)).await;
        ctx.on_complete(());
        waiter.await.unwrap();
    }
}
