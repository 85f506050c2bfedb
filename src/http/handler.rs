//! Per-request dispatch.
//!
//! # Data Flow
//! ```text
//! Aggregated request (connection I/O task)
//!     → header snapshot + enrichment
//!     → validation (503 / 405 / 400 status-text, connection closes)
//!     → classification: URI prefix match → event path, else code path
//!     → body decode → envelope build → submit to the route's pool
//!     → pool rejection → overload envelope (HTTP 200), discard metric
//!     → await completion → single response write
//! ```
//!
//! # Design Decisions
//! - Everything up to pool submission runs on the connection's I/O task and
//!   never blocks; processor work runs on the route's pool
//! - A processor error completes the context with a runtime-error envelope so
//!   the client is always answered
//! - Completion is observed through the context; out-of-band completion from
//!   the completer pool resumes the waiting write here

use std::collections::HashMap;
use std::sync::atomic::Ordering;
use std::sync::Arc;

use bytes::Bytes;
use http::{Method, Response, StatusCode, Uri, Version};
use http_body_util::{BodyExt, Full, Limited};
use hyper::body::Body as HttpBody;
use serde_json::Value;
use tracing::Span;

use crate::dispatch::{AsyncContext, ChannelContext, CodeProcessor, EventProcessor};
use crate::http::server::IngressInner;
use crate::http::{body, request, response};
use crate::observability::trace;
use crate::protocol::command::Body as CommandBody;
use crate::protocol::{epoch_millis, key, CodeCommand, EventWrapper, Header, RequestCode, RetCode};

/// Facts captured from the request head before dispatch.
struct RequestFacts {
    method: Method,
    uri: Uri,
    target: String,
    flavor: &'static str,
    content_type: Option<String>,
    headers: HashMap<String, String>,
    req_time: i64,
}

fn flavor(version: Version) -> &'static str {
    match version {
        Version::HTTP_10 => "HTTP/1.0",
        Version::HTTP_11 => "HTTP/1.1",
        Version::HTTP_2 => "HTTP/2.0",
        _ => "HTTP",
    }
}

fn elapsed_since(req_time: i64) -> u64 {
    (epoch_millis() - req_time).max(0) as u64
}

/// Handle one aggregated request end to end.
pub(crate) async fn dispatch<B>(
    inner: Arc<IngressInner>,
    channel: ChannelContext,
    req: http::Request<B>,
) -> Response<Full<Bytes>>
where
    B: HttpBody + Send,
    B::Data: Send,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let _inflight = inner.inflight.enter();
    let trace_on = inner.config.observability.trace_enabled;
    let charset = inner.config.charset.clone();

    let (parts, req_body) = req.into_parts();
    let mut headers = request::header_snapshot(&parts.headers);
    let req_time = request::enrich(&mut headers, channel.peer_addr, &inner.config.server_ip);

    let facts = RequestFacts {
        target: parts.uri.to_string(),
        flavor: flavor(parts.version),
        content_type: headers.get("content-type").cloned(),
        method: parts.method,
        uri: parts.uri,
        headers,
        req_time,
    };

    if let Some(status) = request::validate(
        inner.started.load(Ordering::Acquire),
        &facts.method,
        &facts.headers,
    ) {
        let span = trace::server_span(trace_on, facts.method.as_str(), facts.flavor, &facts.target);
        trace::finish_with_error(span, status.canonical_reason().unwrap_or("request rejected"));
        return response::status_text(status, &charset);
    }

    inner.metrics.record_http_request();

    let body_bytes = match Limited::new(req_body, inner.config.listener.max_body_bytes)
        .collect()
        .await
    {
        Ok(collected) => collected.to_bytes(),
        Err(e) => {
            tracing::warn!(
                peer = %channel.peer_addr,
                error = %e,
                "request body aggregation failed"
            );
            let span =
                trace::server_span(trace_on, facts.method.as_str(), facts.flavor, &facts.target);
            trace::finish_with_error(span, "malformed request body");
            return response::status_text(StatusCode::BAD_REQUEST, &charset);
        }
    };

    if inner.match_uri_prefix(&facts.target).is_some() {
        dispatch_event(inner, channel, facts, body_bytes).await
    } else {
        dispatch_code(inner, channel, facts, body_bytes).await
    }
}

/// URI-routed event path.
async fn dispatch_event(
    inner: Arc<IngressInner>,
    channel: ChannelContext,
    facts: RequestFacts,
    body_bytes: Bytes,
) -> Response<Full<Bytes>> {
    let trace_on = inner.config.observability.trace_enabled;
    let span = trace::server_span(trace_on, facts.method.as_str(), facts.flavor, &facts.target);

    let attributes = match body::decode(
        &facts.method,
        &facts.uri,
        facts.content_type.as_deref(),
        body_bytes,
        &inner.metrics,
    )
    .await
    {
        Ok(attributes) => attributes,
        Err(e) => {
            tracing::warn!(uri = %facts.target, error = %e, "event body decode failed");
            let wrapper = EventWrapper::new(
                facts.flavor.to_string(),
                facts.target.clone(),
                facts.headers,
                Bytes::new(),
                facts.req_time,
            );
            trace::finish_with_error(span, RetCode::RuntimeErr.msg());
            return wrapper.create_response(RetCode::RuntimeErr).http_response();
        }
    };

    let canonical = Bytes::from(serde_json::to_vec(&attributes).unwrap_or_else(|_| b"{}".to_vec()));
    let wrapper = EventWrapper::new(
        facts.flavor.to_string(),
        facts.target.clone(),
        facts.headers,
        canonical,
        facts.req_time,
    );

    let route = inner
        .match_uri_prefix(&facts.target)
        .and_then(|prefix| inner.uri_routes.get(prefix));
    let Some(route) = route else {
        trace::finish_with_error(span, "no event processor for request uri");
        return wrapper
            .create_response(RetCode::RequestCodeInvalid)
            .http_response();
    };
    let processor = route.processor.clone();
    let pool = route.pool.clone();
    drop(route);

    let context = AsyncContext::new(wrapper, inner.completer.clone());
    let submitted = pool.try_execute({
        let context = context.clone();
        async move {
            run_event_processor(processor, channel, context).await;
        }
    });

    finish_dispatch(&inner, &context, submitted.is_ok(), facts.req_time, span).await
}

async fn run_event_processor(
    processor: Arc<dyn EventProcessor>,
    channel: ChannelContext,
    context: Arc<AsyncContext<EventWrapper>>,
) {
    if processor.reject_request() {
        context.on_complete(
            context
                .request()
                .create_response(RetCode::RejectByProcessor),
        );
        return;
    }
    if let Err(e) = processor.process_request(channel, context.clone()).await {
        tracing::error!(
            uri = %context.request().request_uri,
            error = %e,
            "event processor failed"
        );
        context.on_complete(context.request().create_response(RetCode::RuntimeErr));
    }
    // Still incomplete here means the processor deferred completion; the
    // completer pool finishes the context and the writer resumes then.
}

/// Legacy request-code path.
async fn dispatch_code(
    inner: Arc<IngressInner>,
    channel: ChannelContext,
    facts: RequestFacts,
    body_bytes: Bytes,
) -> Response<Full<Bytes>> {
    let trace_on = inner.config.observability.trace_enabled;

    let attributes = match body::decode(
        &facts.method,
        &facts.uri,
        facts.content_type.as_deref(),
        body_bytes,
        &inner.metrics,
    )
    .await
    {
        Ok(attributes) => attributes,
        Err(e) => {
            tracing::warn!(uri = %facts.target, error = %e, "command body decode failed");
            let span =
                trace::server_span(trace_on, facts.method.as_str(), facts.flavor, &facts.target);
            trace::finish_with_error(span, RetCode::RuntimeErr.msg());
            return response::envelope(RetCode::RuntimeErr);
        }
    };

    // POST carries the code as a header, GET as a body attribute.
    let request_code = if facts.method == Method::POST {
        facts
            .headers
            .get(key::REQUEST_CODE)
            .cloned()
            .unwrap_or_default()
    } else {
        attributes
            .get(key::REQUEST_CODE)
            .and_then(Value::as_str)
            .unwrap_or("")
            .to_string()
    };

    let known = request_code
        .trim()
        .parse::<i32>()
        .ok()
        .and_then(RequestCode::from_value);
    let (code, route) = match (known, inner.code_routes.get(&request_code)) {
        (Some(code), Some(route)) => (code, route),
        _ => {
            tracing::debug!(code = %request_code, "request code unknown or unregistered");
            let span =
                trace::server_span(trace_on, facts.method.as_str(), facts.flavor, &facts.target);
            trace::finish_with_error(span, RetCode::RequestCodeInvalid.msg());
            return response::envelope(RetCode::RequestCodeInvalid);
        }
    };
    let processor = route.processor.clone();
    let pool = route.pool.clone();
    drop(route);

    let header = match Header::build(code, &facts.headers) {
        Ok(header) => header,
        Err(e) => {
            tracing::warn!(code = %request_code, error = %e, "header build failed");
            let span =
                trace::server_span(trace_on, facts.method.as_str(), facts.flavor, &facts.target);
            trace::finish_with_error(span, RetCode::RuntimeErr.msg());
            return response::envelope(RetCode::RuntimeErr);
        }
    };
    let command_body = match CommandBody::build(code, attributes) {
        Ok(body) => body,
        Err(e) => {
            tracing::warn!(code = %request_code, error = %e, "body build failed");
            let span =
                trace::server_span(trace_on, facts.method.as_str(), facts.flavor, &facts.target);
            trace::finish_with_error(span, RetCode::RuntimeErr.msg());
            return response::envelope(RetCode::RuntimeErr);
        }
    };

    let command = CodeCommand::new(
        facts.method.to_string(),
        facts.flavor.to_string(),
        request_code.clone(),
        header,
        command_body,
        facts.req_time,
    );
    tracing::debug!(code = %request_code, "dispatching request command");

    let span = trace::server_span(trace_on, facts.method.as_str(), facts.flavor, &facts.target);
    let context = AsyncContext::new(command, inner.completer.clone());
    let submitted = pool.try_execute({
        let context = context.clone();
        async move {
            run_code_processor(processor, channel, context).await;
        }
    });

    finish_dispatch(&inner, &context, submitted.is_ok(), facts.req_time, span).await
}

async fn run_code_processor(
    processor: Arc<dyn CodeProcessor>,
    channel: ChannelContext,
    context: Arc<AsyncContext<CodeCommand>>,
) {
    if processor.reject_request() {
        context.on_complete(
            context
                .request()
                .create_response(RetCode::RejectByProcessor),
        );
        return;
    }
    if let Err(e) = processor.process_request(channel, context.clone()).await {
        tracing::error!(
            code = %context.request().request_code,
            error = %e,
            "command processor failed"
        );
        context.on_complete(context.request().create_response(RetCode::RuntimeErr));
    }
}

/// Shared completion tail for both dispatch paths.
trait DispatchEnvelope: Send + Sync + 'static {
    fn create_error(&self, ret: RetCode) -> Self;
    fn ret(&self) -> Option<RetCode>;
    fn http_response(&self) -> Response<Full<Bytes>>;
}

impl DispatchEnvelope for EventWrapper {
    fn create_error(&self, ret: RetCode) -> Self {
        self.create_response(ret)
    }
    fn ret(&self) -> Option<RetCode> {
        EventWrapper::ret(self)
    }
    fn http_response(&self) -> Response<Full<Bytes>> {
        EventWrapper::http_response(self)
    }
}

impl DispatchEnvelope for CodeCommand {
    fn create_error(&self, ret: RetCode) -> Self {
        self.create_response(ret)
    }
    fn ret(&self) -> Option<RetCode> {
        CodeCommand::ret(self)
    }
    fn http_response(&self) -> Response<Full<Bytes>> {
        CodeCommand::http_response(self)
    }
}

/// Resolve a submitted (or rejected) dispatch into the response write.
async fn finish_dispatch<T: DispatchEnvelope>(
    inner: &IngressInner,
    context: &AsyncContext<T>,
    submitted: bool,
    req_time: i64,
    span: Option<Span>,
) -> Response<Full<Bytes>> {
    if !submitted {
        // Queue saturated: overload envelope, discard metric, channel stays open.
        context.on_complete(context.request().create_error(RetCode::Overload));
        inner.metrics.record_http_discard();
        inner.metrics.record_req_res_time_cost(elapsed_since(req_time));
        trace::finish_with_error(span, RetCode::Overload.msg());
        return match context.response() {
            Some(resp) => resp.http_response(),
            None => response::envelope(RetCode::Overload),
        };
    }

    context.completed().await;
    inner.metrics.record_req_res_time_cost(elapsed_since(req_time));

    let Some(resp) = context.response() else {
        trace::finish_with_error(span, RetCode::RuntimeErr.msg());
        return response::envelope(RetCode::RuntimeErr);
    };
    match resp.ret() {
        Some(RetCode::Success) | None => trace::finish_ok(span),
        Some(ret) => trace::finish_with_error(span, ret.msg()),
    }
    resp.http_response()
}
