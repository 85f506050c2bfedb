//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Load config → Validate → Register processors → start() binds listener
//!     → accept loop running → started flag flips true
//!
//! Shutdown:
//!     shutdown() → started flips false → in-flight dispatches drain
//!     → accept loop and connections stop → completer pool closes
//! ```
//!
//! # Design Decisions
//! - Requests are fenced by the started flag, not by the listener state
//! - Drain waits on a counter of in-flight dispatches, with a deadline

pub mod inflight;
pub mod shutdown;

pub use inflight::{Inflight, InflightGuard};
pub use shutdown::{Phase, Shutdown};
