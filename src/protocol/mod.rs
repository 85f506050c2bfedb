//! Wire protocol contract.
//!
//! # Data Flow
//! ```text
//! Incoming request headers
//!     → key.rs (header names injected/read by the ingress)
//!     → version.rs (protocol version negotiation)
//!     → code.rs (legacy request-code registry)
//!
//! Dispatch envelopes:
//!     command.rs (request-code path: typed header/body + response envelope)
//!     wrapper.rs (URI path: header snapshot + canonical JSON body)
//!
//! Result taxonomy:
//!     retcode.rs (mesh-level result codes carried in every envelope)
//! ```
//!
//! # Design Decisions
//! - Envelope errors ride HTTP 200; HTTP status codes are reserved for
//!   transport-level failures (not-started, malformed, bad method/version)
//! - Envelopes are immutable once a response variant is constructed

pub mod code;
pub mod command;
pub mod key;
pub mod retcode;
pub mod version;
pub mod wrapper;

pub use code::RequestCode;
pub use command::{Body, BuildError, CodeCommand, Header};
pub use retcode::RetCode;
pub use version::ProtocolVersion;
pub use wrapper::EventWrapper;

use std::time::{SystemTime, UNIX_EPOCH};

/// Current wall-clock time as epoch milliseconds.
pub(crate) fn epoch_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as i64
}
