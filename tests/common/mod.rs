//! Shared utilities for ingress integration testing.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use mesh_ingress::{
    AsyncContext, ChannelContext, CodeCommand, CodeProcessor, EventProcessor, EventWrapper,
    IngressConfig, ProcessorError, RetCode,
};

/// Config bound to an ephemeral local port.
pub fn test_config(max_connections: usize) -> IngressConfig {
    let mut config = IngressConfig::default();
    config.listener.bind_address = "127.0.0.1:0".to_string();
    config.listener.max_connections = max_connections;
    config
}

/// Code processor that counts invocations, optionally sleeps, then completes
/// with a success envelope echoing the request code.
pub struct CountingCodeProcessor {
    pub calls: Arc<AtomicU32>,
    pub delay: Duration,
}

#[async_trait]
impl CodeProcessor for CountingCodeProcessor {
    async fn process_request(
        &self,
        _channel: ChannelContext,
        context: Arc<AsyncContext<CodeCommand>>,
    ) -> Result<(), ProcessorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let mut payload = Map::new();
        payload.insert(
            "processed".into(),
            Value::from(context.request().request_code.clone()),
        );
        context.on_complete(
            context
                .request()
                .create_response_with_payload(RetCode::Success, payload),
        );
        Ok(())
    }
}

/// Event processor completing with the request's canonical body bytes.
pub struct EchoEventProcessor {
    pub calls: Arc<AtomicU32>,
}

#[async_trait]
impl EventProcessor for EchoEventProcessor {
    async fn process_request(
        &self,
        _channel: ChannelContext,
        context: Arc<AsyncContext<EventWrapper>>,
    ) -> Result<(), ProcessorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let body = context.request().body.clone();
        context.on_complete(context.request().create_response_with_body(body));
        Ok(())
    }
}

/// Poll `live` until it reaches `expected` or the deadline passes.
#[allow(dead_code)]
pub async fn wait_for_connections(
    live: impl Fn() -> usize,
    expected: usize,
    deadline: Duration,
) -> bool {
    let start = tokio::time::Instant::now();
    while start.elapsed() < deadline {
        if live() == expected {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    live() == expected
}

#[allow(dead_code)]
pub fn url(addr: SocketAddr) -> String {
    format!("http://{}", addr)
}
