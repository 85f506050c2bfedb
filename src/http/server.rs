//! Ingress server: route registries, listener lifecycle, accept loop.
//!
//! # Responsibilities
//! - Hold the two route registries (request-code and URI prefix)
//! - Bind the listener, run the accept loop, gate connections
//! - Flip the started flag read by request validation
//! - Drain in-flight dispatches on shutdown
//!
//! # Design Decisions
//! - Registries are append-only before `start()` and frozen afterwards
//! - URI prefixes are matched longest-first; the order is computed once at
//!   startup so matching is deterministic regardless of registration order

use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};
use std::time::Duration;

use dashmap::DashMap;
use tokio_rustls::TlsAcceptor;

use crate::config::IngressConfig;
use crate::dispatch::{CodeProcessor, EventProcessor, WorkerPool};
use crate::lifecycle::{Inflight, Shutdown};
use crate::net::connection;
use crate::net::listener::{ConnectionGate, Listener, ListenerError};
use crate::net::tls::{build_acceptor, TlsError};
use crate::observability::IngressMetrics;

/// Error registering a processor route.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("route registration is closed once the server has started")]
    AlreadyStarted,
    #[error("duplicate route registration for '{0}'")]
    Duplicate(String),
    #[error("URI route prefix must not be blank")]
    EmptyPrefix,
}

/// Error starting the server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Listener(#[from] ListenerError),
    #[error(transparent)]
    Tls(#[from] TlsError),
    #[error("server already started")]
    AlreadyStarted,
}

pub(crate) struct CodeRoute {
    pub(crate) processor: Arc<dyn CodeProcessor>,
    pub(crate) pool: WorkerPool,
}

pub(crate) struct UriRoute {
    pub(crate) processor: Arc<dyn EventProcessor>,
    pub(crate) pool: WorkerPool,
}

pub(crate) struct IngressInner {
    pub(crate) config: IngressConfig,
    pub(crate) started: AtomicBool,
    start_called: AtomicBool,
    pub(crate) code_routes: DashMap<String, CodeRoute>,
    pub(crate) uri_routes: DashMap<String, UriRoute>,
    uri_prefixes: OnceLock<Vec<String>>,
    pub(crate) completer: WorkerPool,
    pub(crate) metrics: Arc<IngressMetrics>,
    pub(crate) inflight: Inflight,
    pub(crate) shutdown: Shutdown,
    pub(crate) gate: ConnectionGate,
    local_addr: OnceLock<SocketAddr>,
}

impl IngressInner {
    /// Longest registered prefix matching `uri`, if any.
    ///
    /// Empty until `start()` freezes the registration set.
    pub(crate) fn match_uri_prefix(&self, uri: &str) -> Option<&str> {
        self.uri_prefixes
            .get()?
            .iter()
            .find(|prefix| uri.starts_with(prefix.as_str()))
            .map(String::as_str)
    }
}

/// The HTTP ingress front-end of the mesh broker.
///
/// Register processors, then [`start`](Self::start); requests arriving before
/// the started flag flips are answered with 503.
#[derive(Clone)]
pub struct HttpIngressServer {
    pub(crate) inner: Arc<IngressInner>,
}

impl HttpIngressServer {
    pub fn new(config: IngressConfig) -> Self {
        let completer = WorkerPool::new(
            "ingress-completer",
            config.completer.workers,
            config.completer.queue_size,
        );
        let gate = ConnectionGate::new(config.listener.max_connections);

        Self {
            inner: Arc::new(IngressInner {
                config,
                started: AtomicBool::new(false),
                start_called: AtomicBool::new(false),
                code_routes: DashMap::new(),
                uri_routes: DashMap::new(),
                uri_prefixes: OnceLock::new(),
                completer,
                metrics: Arc::new(IngressMetrics::new()),
                inflight: Inflight::new(),
                shutdown: Shutdown::new(),
                gate,
                local_addr: OnceLock::new(),
            }),
        }
    }

    /// Register a processor for a legacy request code.
    ///
    /// Must be called before [`start`](Self::start).
    pub fn register_code_processor(
        &self,
        request_code: i32,
        processor: Arc<dyn CodeProcessor>,
        pool: WorkerPool,
    ) -> Result<(), RegistryError> {
        if self.inner.start_called.load(Ordering::Acquire) {
            return Err(RegistryError::AlreadyStarted);
        }
        let key = request_code.to_string();
        if self.inner.code_routes.contains_key(&key) {
            return Err(RegistryError::Duplicate(key));
        }
        self.inner.code_routes.insert(key, CodeRoute { processor, pool });
        Ok(())
    }

    /// Register a processor for a URI prefix.
    ///
    /// Must be called before [`start`](Self::start).
    pub fn register_uri_processor(
        &self,
        prefix: &str,
        processor: Arc<dyn EventProcessor>,
        pool: WorkerPool,
    ) -> Result<(), RegistryError> {
        if self.inner.start_called.load(Ordering::Acquire) {
            return Err(RegistryError::AlreadyStarted);
        }
        if prefix.trim().is_empty() {
            return Err(RegistryError::EmptyPrefix);
        }
        if self.inner.uri_routes.contains_key(prefix) {
            return Err(RegistryError::Duplicate(prefix.to_string()));
        }
        self.inner
            .uri_routes
            .insert(prefix.to_string(), UriRoute { processor, pool });
        Ok(())
    }

    /// Bind the listener, spawn the accept loop and mark the server started.
    ///
    /// Freezes the route registries. URI prefixes are ordered longest-first
    /// (ties lexicographic) for deterministic matching. A bind failure shuts
    /// the server down and surfaces the error.
    pub async fn start(&self) -> Result<SocketAddr, ServerError> {
        if self.inner.start_called.swap(true, Ordering::AcqRel) {
            return Err(ServerError::AlreadyStarted);
        }

        let tls = match &self.inner.config.listener.tls {
            Some(tls_config) => match build_acceptor(tls_config) {
                Ok(acceptor) => Some(acceptor),
                Err(e) => {
                    self.shutdown().await;
                    return Err(e.into());
                }
            },
            None => None,
        };

        let listener = match Listener::bind(&self.inner.config.listener).await {
            Ok(listener) => listener,
            Err(e) => {
                self.shutdown().await;
                return Err(e.into());
            }
        };
        let local_addr = listener
            .local_addr()
            .map_err(|e| ServerError::Listener(ListenerError::Bind(e)))?;
        let _ = self.inner.local_addr.set(local_addr);

        let mut prefixes: Vec<String> = self
            .inner
            .uri_routes
            .iter()
            .map(|entry| entry.key().clone())
            .collect();
        prefixes.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        let _ = self.inner.uri_prefixes.set(prefixes);

        let inner = self.inner.clone();
        let loop_tls = tls.clone();
        tokio::spawn(async move {
            accept_loop(inner, listener, loop_tls).await;
        });

        self.inner.started.store(true, Ordering::Release);
        tracing::info!(
            address = %local_addr,
            tls = tls.is_some(),
            code_routes = self.inner.code_routes.len(),
            uri_routes = self.inner.uri_routes.len(),
            "HTTP ingress server started"
        );
        Ok(local_addr)
    }

    /// Stop accepting, drain in-flight dispatches and close the completer.
    ///
    /// Idempotent; later calls return immediately.
    pub async fn shutdown(&self) {
        if !self.inner.shutdown.begin_drain() {
            return;
        }
        self.inner.started.store(false, Ordering::Release);

        let drain_deadline = Duration::from_secs(self.inner.config.drain_timeout_secs.max(1));
        if tokio::time::timeout(drain_deadline, self.inner.inflight.drain())
            .await
            .is_err()
        {
            tracing::warn!(
                pending = self.inner.inflight.count(),
                "drain deadline reached with dispatches still in flight"
            );
        }

        self.inner.shutdown.stop_connections();
        self.inner.completer.close().await;
        tracing::info!("HTTP ingress server shut down");
    }

    pub fn is_started(&self) -> bool {
        self.inner.started.load(Ordering::Acquire)
    }

    /// Address the listener is bound to, once started.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.inner.local_addr.get().copied()
    }

    /// Current live connection count.
    pub fn live_connections(&self) -> usize {
        self.inner.gate.live()
    }

    pub fn metrics(&self) -> Arc<IngressMetrics> {
        self.inner.metrics.clone()
    }
}

async fn accept_loop(inner: Arc<IngressInner>, listener: Listener, tls: Option<TlsAcceptor>) {
    let mut shutdown_rx = inner.shutdown.subscribe();
    loop {
        tokio::select! {
            biased;

            _ = shutdown_rx.recv() => {
                tracing::info!("accept loop stopped");
                break;
            }

            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    match inner.gate.admit(peer) {
                        Some(guard) => {
                            let inner = inner.clone();
                            let tls = tls.clone();
                            tokio::spawn(async move {
                                connection::serve(inner, stream, peer, guard, tls).await;
                            });
                        }
                        // Over cap: drop the accept, no HTTP exchange.
                        None => drop(stream),
                    }
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
