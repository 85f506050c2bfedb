//! Processor seam.
//!
//! Processors own business logic and per-request policy (including any
//! authentication); the ingress only routes, schedules and writes. A
//! processor either completes the [`AsyncContext`] before returning, or
//! schedules deferred completion, typically on the context's completer pool.

use std::net::SocketAddr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::dispatch::AsyncContext;
use crate::protocol::{CodeCommand, EventWrapper};

/// Connection facts handed to processors alongside the context.
#[derive(Debug, Clone, Copy)]
pub struct ChannelContext {
    pub peer_addr: SocketAddr,
    pub local_addr: SocketAddr,
}

/// Failure surfaced by a processor.
///
/// The dispatcher logs it and synthesizes a runtime-error completion so the
/// client is still answered.
#[derive(Debug, thiserror::Error)]
#[error("processor error: {0}")]
pub struct ProcessorError(pub String);

/// Handler for a legacy request-code route.
#[async_trait]
pub trait CodeProcessor: Send + Sync {
    /// Admission check run before processing; `true` refuses the request.
    fn reject_request(&self) -> bool {
        false
    }

    async fn process_request(
        &self,
        channel: ChannelContext,
        context: Arc<AsyncContext<CodeCommand>>,
    ) -> Result<(), ProcessorError>;
}

/// Handler for a URI-prefix event route.
#[async_trait]
pub trait EventProcessor: Send + Sync {
    /// Admission check run before processing; `true` refuses the request.
    fn reject_request(&self) -> bool {
        false
    }

    async fn process_request(
        &self,
        channel: ChannelContext,
        context: Arc<AsyncContext<EventWrapper>>,
    ) -> Result<(), ProcessorError>;
}
