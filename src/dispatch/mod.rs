//! Dispatch-and-scheduling plane.
//!
//! # Data Flow
//! ```text
//! Decoded request (I/O task)
//!     → context.rs (AsyncContext: request + pending response + complete flag)
//!     → pool.rs (route-bound bounded worker pool; rejection = backpressure)
//!     → processor.rs (CodeProcessor / EventProcessor business seam)
//!     → completion observed by the connection's I/O task, single write
//! ```
//!
//! # Design Decisions
//! - Bounded queues everywhere; a full queue rejects instead of buffering
//! - Completion is first-caller-wins; the losing caller's response is dropped
//! - Processors may defer completion onto the shared completer pool

pub mod context;
pub mod pool;
pub mod processor;

pub use context::AsyncContext;
pub use pool::{PoolRejected, WorkerPool};
pub use processor::{ChannelContext, CodeProcessor, EventProcessor, ProcessorError};
