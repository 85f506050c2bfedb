//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept, connection gate: count or close)
//!     → tls.rs (optional TLS handshake)
//!     → connection.rs (idle tracking, HTTP/1.1 serving, lifecycle)
//!     → Hand off to the dispatch handler
//! ```

pub mod connection;
pub mod listener;
pub mod tls;

pub use listener::{ConnectionGate, ConnectionGuard, Listener, ListenerError};
pub use tls::{build_acceptor, TlsError};
