//! Ordered teardown coordination.

use std::sync::atomic::{AtomicU8, Ordering};

use tokio::sync::broadcast;

const SERVING: u8 = 0;
const DRAINING: u8 = 1;
const STOPPED: u8 = 2;

/// Teardown phase of the ingress.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Accepting and dispatching.
    Serving,
    /// Started flag is down; in-flight dispatches are flushing.
    Draining,
    /// Accept loop and connections have been told to close.
    Stopped,
}

/// Coordinator for the two-step ingress teardown.
///
/// The accept loop and every connection driver subscribe to the close
/// signal. Teardown order matters: [`begin_drain`] fences new work while
/// completed dispatches still have live connections to write to, then
/// [`stop_connections`] broadcasts the close.
///
/// [`begin_drain`]: Shutdown::begin_drain
/// [`stop_connections`]: Shutdown::stop_connections
pub struct Shutdown {
    tx: broadcast::Sender<()>,
    phase: AtomicU8,
}

impl Shutdown {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self {
            tx,
            phase: AtomicU8::new(SERVING),
        }
    }

    pub fn phase(&self) -> Phase {
        match self.phase.load(Ordering::Acquire) {
            SERVING => Phase::Serving,
            DRAINING => Phase::Draining,
            _ => Phase::Stopped,
        }
    }

    /// Subscribe to the connection-close signal.
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Enter the draining phase.
    ///
    /// Exactly one caller wins; `false` means teardown already began and the
    /// caller must skip its shutdown sequence.
    pub fn begin_drain(&self) -> bool {
        self.phase
            .compare_exchange(SERVING, DRAINING, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Broadcast the close signal to the accept loop and open connections.
    pub fn stop_connections(&self) {
        self.phase.store(STOPPED, Ordering::Release);
        let notified = self.tx.send(()).unwrap_or(0);
        tracing::debug!(tasks = notified, "close signal broadcast");
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn phases_advance_and_drain_wins_once() {
        let shutdown = Shutdown::new();
        assert_eq!(shutdown.phase(), Phase::Serving);

        assert!(shutdown.begin_drain());
        assert_eq!(shutdown.phase(), Phase::Draining);
        assert!(!shutdown.begin_drain());

        shutdown.stop_connections();
        assert_eq!(shutdown.phase(), Phase::Stopped);
        assert!(!shutdown.begin_drain());
    }

    #[tokio::test]
    async fn close_signal_reaches_subscribers() {
        let shutdown = Shutdown::new();
        let mut rx = shutdown.subscribe();

        shutdown.stop_connections();
        rx.recv().await.unwrap();
    }
}
