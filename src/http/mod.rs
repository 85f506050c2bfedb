//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP/TLS connection
//!     → server.rs (listener, accept loop, route registries, lifecycle)
//!     → handler.rs (per-request dispatch: enrich → validate → classify)
//!     → request.rs (header snapshot, enrichment, validation)
//!     → body.rs (query/JSON/form/multipart decoding)
//!     → [route-bound worker pool runs the processor]
//!     → response.rs (status-only text or JSON envelope)
//!     → Send to client
//! ```

pub mod body;
pub mod handler;
pub mod request;
pub mod response;
pub mod server;

pub use server::{HttpIngressServer, RegistryError, ServerError};
