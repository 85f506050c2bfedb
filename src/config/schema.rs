//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the ingress.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the ingress server.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IngressConfig {
    /// Listener configuration (bind address, limits, TLS).
    pub listener: ListenerConfig,

    /// Address reported to clients in the injected server-IP header.
    pub server_ip: String,

    /// Charset advertised on plain-text error responses.
    pub charset: String,

    /// Completer pool sizing for deferred processor completion.
    pub completer: CompleterConfig,

    /// Maximum seconds to wait for in-flight dispatches during shutdown.
    pub drain_timeout_secs: u64,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:10105").
    pub bind_address: String,

    /// Maximum concurrent live connections; excess connections are closed
    /// without an HTTP exchange.
    pub max_connections: usize,

    /// Close a connection after this many seconds without read/write activity.
    pub idle_timeout_secs: u64,

    /// Upper bound on an aggregated request body.
    pub max_body_bytes: usize,

    /// Optional TLS termination.
    pub tls: Option<TlsConfig>,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:10105".to_string(),
            max_connections: 20_000,
            idle_timeout_secs: 60,
            max_body_bytes: i32::MAX as usize,
            tls: None,
        }
    }
}

/// TLS termination configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TlsConfig {
    /// Path to certificate chain file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Completer pool configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CompleterConfig {
    /// Worker tasks draining deferred completions.
    pub workers: usize,

    /// Pending completion queue depth.
    pub queue_size: usize,
}

impl Default for CompleterConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            queue_size: 10_000,
        }
    }
}

/// Observability settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Expose Prometheus metrics.
    pub metrics_enabled: bool,

    /// Scrape endpoint address.
    pub metrics_address: String,

    /// Emit a server span per request.
    pub trace_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "0.0.0.0:19090".to_string(),
            trace_enabled: false,
        }
    }
}

impl Default for IngressConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            server_ip: "127.0.0.1".to_string(),
            charset: "utf-8".to_string(),
            completer: CompleterConfig::default(),
            drain_timeout_secs: 30,
            observability: ObservabilityConfig::default(),
        }
    }
}

impl IngressConfig {
    pub fn tls_enabled(&self) -> bool {
        self.listener.tls.is_some()
    }
}
