//! Server span per request.
//!
//! # Responsibilities
//! - Create one span per request with standard HTTP attributes
//! - Finish every span exactly once, recording the outcome
//!
//! # Design Decisions
//! - Disabled tracing allocates nothing: `server_span` returns `None` and all
//!   finish helpers accept the `Option` untouched
//! - Error finishes record the message inside the span before it closes

use tracing::Span;

/// Create the server span covering ingress handling of one request.
///
/// Returns `None` when tracing is disabled.
pub fn server_span(enabled: bool, method: &str, flavor: &str, url: &str) -> Option<Span> {
    if !enabled {
        return None;
    }
    Some(tracing::info_span!(
        "upstream-eventmesh-server-span",
        http.method = %method,
        http.flavor = %flavor,
        http.url = %url,
    ))
}

/// Finish the span recording success.
pub fn finish_ok(span: Option<Span>) {
    if let Some(span) = span {
        span.in_scope(|| tracing::debug!("request completed"));
    }
}

/// Finish the span recording the failure message.
pub fn finish_with_error(span: Option<Span>, message: &str) {
    if let Some(span) = span {
        span.in_scope(|| tracing::error!(error = message, "request failed"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_tracer_creates_no_span() {
        assert!(server_span(false, "POST", "HTTP/1.1", "/x").is_none());
    }

    #[test]
    fn every_created_span_can_be_finished() {
        let span = server_span(true, "GET", "HTTP/1.1", "/eventmesh/publish");
        assert!(span.is_some());
        finish_ok(span);

        let span = server_span(true, "POST", "HTTP/1.1", "/");
        finish_with_error(span, "request code invalid");
    }
}
