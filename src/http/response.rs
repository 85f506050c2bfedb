//! Response builders.
//!
//! Two response families exist: status-only plain-text responses for
//! transport-level validation failures (these close the connection), and JSON
//! envelopes for everything else (these keep it alive).

use bytes::Bytes;
use http::{header, Response, StatusCode};
use http_body_util::Full;
use serde_json::{Map, Value};

use crate::protocol::{epoch_millis, RetCode};

/// Status-only plain-text response; the connection closes after the flush.
pub fn status_text(status: StatusCode, charset: &str) -> Response<Full<Bytes>> {
    Response::builder()
        .status(status)
        .header(
            header::CONTENT_TYPE,
            format!("text/plain; charset={}", charset),
        )
        .header(header::CONTENT_LENGTH, 0)
        .header(header::CONNECTION, "close")
        .body(Full::new(Bytes::new()))
        .expect("static response parts are valid")
}

/// Bare JSON envelope for dispatch failures with no command attached.
pub fn envelope(ret: RetCode) -> Response<Full<Bytes>> {
    let mut body = Map::new();
    body.insert("retCode".into(), Value::from(ret.code()));
    body.insert("retMsg".into(), Value::from(ret.msg()));
    body.insert("resTime".into(), Value::from(epoch_millis()));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::CONNECTION, "keep-alive")
        .body(Full::new(Bytes::from(
            serde_json::to_vec(&body).unwrap_or_else(|_| b"{}".to_vec()),
        )))
        .expect("static response parts are valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_text_closes_connection() {
        let response = status_text(StatusCode::METHOD_NOT_ALLOWED, "utf-8");
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(response.headers().get(header::CONNECTION).unwrap(), "close");
        assert_eq!(
            response.headers().get(header::CONTENT_TYPE).unwrap(),
            "text/plain; charset=utf-8"
        );
    }

    #[test]
    fn envelope_rides_http_200() {
        let response = envelope(RetCode::Overload);
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers().get(header::CONNECTION).unwrap(),
            "keep-alive"
        );
    }
}
