//! Event-Mesh HTTP Ingress
//!
//! Always-on HTTP/1.1 (optionally TLS) front-end for an event-mesh broker:
//! accepts client requests, classifies each as a legacy request-code command
//! or a URI-routed event command, dispatches it to the matching processor on
//! a route-bound worker pool, and writes a structured response.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌───────────────────────────────────────────────────┐
//!                        │                 HTTP INGRESS                      │
//!                        │                                                   │
//!   Client Request       │  ┌─────────┐    ┌──────────┐    ┌─────────────┐  │
//!   ─────────────────────┼─▶│   net   │───▶│   http   │───▶│  dispatch   │  │
//!                        │  │ gate/tls│    │ handler  │    │ route pools │  │
//!                        │  └─────────┘    └──────────┘    └──────┬──────┘  │
//!                        │                                        │         │
//!                        │                                        ▼         │
//!                        │                                 ┌─────────────┐  │
//!                        │                                 │ processors  │  │
//!                        │                                 │ (external)  │  │
//!                        │                                 └──────┬──────┘  │
//!                        │                                        │         │
//!   Client Response      │  ┌──────────┐    ┌──────────────┐      │         │
//!   ◀────────────────────┼──│ response │◀───│ AsyncContext │◀─────┘         │
//!                        │  │ envelope │    │  completion  │                │
//!                        │  └──────────┘    └──────────────┘                │
//!                        │                                                   │
//!                        │  ┌─────────────────────────────────────────────┐  │
//!                        │  │           Cross-Cutting Concerns            │  │
//!                        │  │  ┌────────┐ ┌─────────────┐ ┌───────────┐  │  │
//!                        │  │  │ config │ │observability│ │ lifecycle │  │  │
//!                        │  │  └────────┘ └─────────────┘ └───────────┘  │  │
//!                        │  └─────────────────────────────────────────────┘  │
//!                        └───────────────────────────────────────────────────┘
//! ```
//!
//! Processors, broker backends, metric exporters and TLS keystore tooling are
//! external collaborators; this crate owns the wire state machine, the
//! dispatch plane and the resource lifecycle between them.

// Core subsystems
pub mod config;
pub mod dispatch;
pub mod http;
pub mod net;
pub mod protocol;

// Cross-cutting concerns
pub mod lifecycle;
pub mod observability;

pub use config::IngressConfig;
pub use dispatch::{
    AsyncContext, ChannelContext, CodeProcessor, EventProcessor, PoolRejected, ProcessorError,
    WorkerPool,
};
pub use http::{HttpIngressServer, RegistryError, ServerError};
pub use lifecycle::Shutdown;
pub use observability::IngressMetrics;
pub use protocol::{CodeCommand, EventWrapper, ProtocolVersion, RequestCode, RetCode};
