//! In-flight dispatch tracking for drain-on-shutdown.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::Notify;

/// Counter of dispatches currently between validation and response write.
///
/// Shutdown awaits [`Inflight::drain`] so completed work is flushed before
/// connections are torn down.
#[derive(Clone, Default)]
pub struct Inflight {
    count: Arc<AtomicUsize>,
    notify: Arc<Notify>,
}

impl Inflight {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark one dispatch in flight; the guard releases it on drop.
    pub fn enter(&self) -> InflightGuard {
        self.count.fetch_add(1, Ordering::AcqRel);
        InflightGuard {
            inflight: self.clone(),
        }
    }

    pub fn count(&self) -> usize {
        self.count.load(Ordering::Acquire)
    }

    /// Wait until no dispatch is in flight.
    pub async fn drain(&self) {
        while self.count() > 0 {
            let notified = self.notify.notified();
            if self.count() == 0 {
                break;
            }
            notified.await;
        }
    }
}

/// RAII token for one in-flight dispatch.
pub struct InflightGuard {
    inflight: Inflight,
}

impl Drop for InflightGuard {
    fn drop(&mut self) {
        if self.inflight.count.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.inflight.notify.notify_waiters();
        }
    }
}
