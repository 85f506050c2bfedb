//! TCP listener and connection gate.
//!
//! # Responsibilities
//! - Bind to the configured address
//! - Accept incoming TCP connections
//! - Cap concurrent live connections: over-cap connections are closed
//!   immediately, never queued
//!
//! # Design Decisions
//! - The gate is a counter, not a semaphore: a rejected connection drops its
//!   TCP accept so the client fails fast instead of waiting for a slot

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};

use crate::config::ListenerConfig;

/// Error type for listener operations.
#[derive(Debug, thiserror::Error)]
pub enum ListenerError {
    #[error("Failed to bind: {0}")]
    Bind(std::io::Error),
    #[error("Failed to accept: {0}")]
    Accept(std::io::Error),
}

/// Caps concurrent live connections.
#[derive(Clone)]
pub struct ConnectionGate {
    live: Arc<AtomicUsize>,
    max_connections: usize,
}

impl ConnectionGate {
    pub fn new(max_connections: usize) -> Self {
        Self {
            live: Arc::new(AtomicUsize::new(0)),
            max_connections,
        }
    }

    /// Count a new connection in.
    ///
    /// Returns `None` when the cap is exceeded; the caller must drop the
    /// socket. The returned guard counts the connection out on drop.
    pub fn admit(&self, peer: SocketAddr) -> Option<ConnectionGuard> {
        let live = self.live.fetch_add(1, Ordering::AcqRel) + 1;
        if live > self.max_connections {
            self.live.fetch_sub(1, Ordering::AcqRel);
            tracing::warn!(
                peer = %peer,
                max_connections = self.max_connections,
                "too many clients connected, closing connection"
            );
            return None;
        }
        Some(ConnectionGuard {
            live: self.live.clone(),
        })
    }

    /// Current live connection count.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }
}

/// RAII token for one admitted connection.
pub struct ConnectionGuard {
    live: Arc<AtomicUsize>,
}

impl Drop for ConnectionGuard {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::AcqRel);
    }
}

/// A bound TCP listener.
pub struct Listener {
    inner: TcpListener,
}

impl Listener {
    /// Bind to the configured address.
    pub async fn bind(config: &ListenerConfig) -> Result<Self, ListenerError> {
        let addr: SocketAddr = config
            .bind_address
            .parse()
            .map_err(|e| ListenerError::Bind(std::io::Error::new(std::io::ErrorKind::InvalidInput, e)))?;

        let listener = TcpListener::bind(addr).await.map_err(ListenerError::Bind)?;
        let local_addr = listener.local_addr().map_err(ListenerError::Bind)?;

        tracing::info!(
            address = %local_addr,
            max_connections = config.max_connections,
            "Listener bound"
        );

        Ok(Self { inner: listener })
    }

    /// Accept a new connection with SO_KEEPALIVE set.
    pub async fn accept(&self) -> Result<(TcpStream, SocketAddr), ListenerError> {
        let (stream, peer) = self.inner.accept().await.map_err(ListenerError::Accept)?;
        let _ = socket2::SockRef::from(&stream).set_keepalive(true);
        Ok((stream, peer))
    }

    pub fn local_addr(&self) -> Result<SocketAddr, std::io::Error> {
        self.inner.local_addr()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer() -> SocketAddr {
        "127.0.0.1:50000".parse().unwrap()
    }

    #[test]
    fn gate_admits_up_to_cap() {
        let gate = ConnectionGate::new(2);
        let a = gate.admit(peer()).unwrap();
        let _b = gate.admit(peer()).unwrap();
        assert_eq!(gate.live(), 2);

        assert!(gate.admit(peer()).is_none());
        assert_eq!(gate.live(), 2);

        drop(a);
        assert_eq!(gate.live(), 1);
        assert!(gate.admit(peer()).is_some());
    }

    #[test]
    fn gate_returns_to_zero() {
        let gate = ConnectionGate::new(3);
        let guards: Vec<_> = (0..3).filter_map(|_| gate.admit(peer())).collect();
        assert_eq!(gate.live(), 3);
        drop(guards);
        assert_eq!(gate.live(), 0);
    }
}
