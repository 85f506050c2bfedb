//! Per-connection driver.
//!
//! # Responsibilities
//! - Assemble the per-connection pipeline: optional TLS, idle-tracked stream,
//!   HTTP/1.1 serving with the dispatch handler
//! - Close the connection after prolonged read/write inactivity
//! - React to server shutdown with a graceful connection close
//!
//! # Design Decisions
//! - The idle watchdog samples an activity timestamp updated by the stream
//!   wrapper; no timer churn per read/write
//! - Write failures surface as connection errors here and close the channel;
//!   in-flight worker tasks are allowed to run to completion

use std::convert::Infallible;
use std::net::SocketAddr;
use std::pin::Pin;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};

use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio_rustls::TlsAcceptor;

use crate::dispatch::ChannelContext;
use crate::http::handler;
use crate::http::server::IngressInner;
use crate::net::listener::ConnectionGuard;

/// Serve one accepted connection until it closes.
pub(crate) async fn serve(
    inner: Arc<IngressInner>,
    stream: TcpStream,
    peer: SocketAddr,
    guard: ConnectionGuard,
    tls: Option<TlsAcceptor>,
) {
    let local_addr = match stream.local_addr() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::warn!(peer = %peer, error = %e, "could not resolve local address");
            return;
        }
    };
    let channel = ChannelContext {
        peer_addr: peer,
        local_addr,
    };

    match tls {
        Some(acceptor) => match acceptor.accept(stream).await {
            Ok(tls_stream) => drive(inner, tls_stream, channel, guard).await,
            Err(e) => {
                tracing::warn!(peer = %peer, error = %e, "TLS handshake failed");
            }
        },
        None => drive(inner, stream, channel, guard).await,
    }
}

async fn drive<S>(inner: Arc<IngressInner>, io: S, channel: ChannelContext, _guard: ConnectionGuard)
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    let idle_timeout = Duration::from_secs(inner.config.listener.idle_timeout_secs.max(1));
    let tracker = IdleTracker::new();
    let io = IdleTrackedStream::new(io, tracker.clone());

    let service_inner = inner.clone();
    let service = service_fn(move |req| {
        let inner = service_inner.clone();
        async move { Ok::<_, Infallible>(handler::dispatch(inner, channel, req).await) }
    });

    let conn = http1::Builder::new()
        .keep_alive(true)
        .serve_connection(TokioIo::new(io), service);
    tokio::pin!(conn);

    let mut shutdown_rx = inner.shutdown.subscribe();
    let tick = (idle_timeout / 4).max(Duration::from_millis(100));
    let mut closing = false;

    loop {
        if closing {
            if let Err(e) = conn.as_mut().await {
                tracing::debug!(peer = %channel.peer_addr, error = %e, "connection ended during close");
            }
            break;
        }

        tokio::select! {
            result = conn.as_mut() => {
                if let Err(e) = result {
                    tracing::warn!(
                        peer = %channel.peer_addr,
                        error = %e,
                        "send response to client failed, closing channel"
                    );
                }
                break;
            }
            _ = shutdown_rx.recv() => {
                conn.as_mut().graceful_shutdown();
                closing = true;
            }
            _ = tokio::time::sleep(tick) => {
                if tracker.idle_for() >= idle_timeout {
                    tracing::info!(
                        peer = %channel.peer_addr,
                        idle_secs = tracker.idle_for().as_secs(),
                        "closing idle connection"
                    );
                    conn.as_mut().graceful_shutdown();
                    closing = true;
                }
            }
        }
    }
}

/// Shared last-activity timestamp for one connection.
#[derive(Clone)]
pub(crate) struct IdleTracker {
    epoch: Instant,
    last_ms: Arc<AtomicU64>,
}

impl IdleTracker {
    pub(crate) fn new() -> Self {
        Self {
            epoch: Instant::now(),
            last_ms: Arc::new(AtomicU64::new(0)),
        }
    }

    fn touch(&self) {
        self.last_ms
            .store(self.epoch.elapsed().as_millis() as u64, Ordering::Relaxed);
    }

    pub(crate) fn idle_for(&self) -> Duration {
        let now = self.epoch.elapsed().as_millis() as u64;
        Duration::from_millis(now.saturating_sub(self.last_ms.load(Ordering::Relaxed)))
    }
}

/// Stream wrapper stamping the idle tracker on every successful read/write.
pub(crate) struct IdleTrackedStream<S> {
    inner: S,
    tracker: IdleTracker,
}

impl<S> IdleTrackedStream<S> {
    pub(crate) fn new(inner: S, tracker: IdleTracker) -> Self {
        Self { inner, tracker }
    }
}

impl<S: AsyncRead + Unpin> AsyncRead for IdleTrackedStream<S> {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        let this = self.get_mut();
        let result = Pin::new(&mut this.inner).poll_read(cx, buf);
        if matches!(result, Poll::Ready(Ok(()))) {
            this.tracker.touch();
        }
        result
    }
}

impl<S: AsyncWrite + Unpin> AsyncWrite for IdleTrackedStream<S> {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        let this = self.get_mut();
        let result = Pin::new(&mut this.inner).poll_write(cx, buf);
        if matches!(result, Poll::Ready(Ok(_))) {
            this.tracker.touch();
        }
        result
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_flush(cx)
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Pin::new(&mut self.get_mut().inner).poll_shutdown(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn tracker_measures_inactivity() {
        let tracker = IdleTracker::new();
        tokio::time::sleep(Duration::from_millis(30)).await;
        assert!(tracker.idle_for() >= Duration::from_millis(20));

        tracker.touch();
        assert!(tracker.idle_for() < Duration::from_millis(20));
    }
}
