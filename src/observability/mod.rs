//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Ingress paths produce:
//!     → logging.rs (structured log events)
//!     → metrics.rs (request/discard counters, decode & end-to-end timers)
//!     → trace.rs (one server span per request)
//!
//! Consumers:
//!     → Log aggregation (stdout, file, remote)
//!     → Metrics endpoint (Prometheus scrape)
//!     → Span subscriber (fmt layer, OpenTelemetry bridge)
//! ```
//!
//! # Design Decisions
//! - Metrics are cheap (atomic increments) and recorded on every path
//! - Tracing is optional; when disabled no span is allocated

pub mod logging;
pub mod metrics;
pub mod trace;

pub use metrics::IngressMetrics;
