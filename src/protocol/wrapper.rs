//! URI-routed event envelope.
//!
//! `EventWrapper` carries the full header snapshot plus the decoded request
//! body re-serialized as canonical JSON bytes. Event processors read the body
//! bytes, do their work, and hand back a response wrapper whose body is the
//! client-facing envelope.

use std::collections::HashMap;

use bytes::Bytes;
use http::{header, Response, StatusCode};
use http_body_util::Full;
use serde_json::{Map, Value};

use crate::protocol::{epoch_millis, RetCode};

/// A URI-routed event request and, once completed, its response.
#[derive(Debug, Clone)]
pub struct EventWrapper {
    pub http_version: String,
    pub request_uri: String,
    pub header_map: HashMap<String, String>,
    /// Canonical JSON of the decoded request body (request side), or the
    /// response envelope bytes (response side).
    pub body: Bytes,
    pub req_time: i64,
    ret: Option<RetCode>,
}

impl EventWrapper {
    pub fn new(
        http_version: String,
        request_uri: String,
        header_map: HashMap<String, String>,
        body: Bytes,
        req_time: i64,
    ) -> Self {
        Self {
            http_version,
            request_uri,
            header_map,
            body,
            req_time,
            ret: None,
        }
    }

    /// Decode the canonical JSON body back into an attribute map.
    pub fn body_map(&self) -> Result<Map<String, Value>, serde_json::Error> {
        if self.body.is_empty() {
            return Ok(Map::new());
        }
        serde_json::from_slice(&self.body)
    }

    /// Derive an error/status response whose body is the standard envelope.
    pub fn create_response(&self, ret: RetCode) -> EventWrapper {
        let mut envelope = Map::new();
        envelope.insert("retCode".into(), Value::from(ret.code()));
        envelope.insert("retMsg".into(), Value::from(ret.msg()));
        envelope.insert("resTime".into(), Value::from(epoch_millis()));

        let mut response = self.clone();
        response.body = Bytes::from(serde_json::to_vec(&envelope).unwrap_or_else(|_| b"{}".to_vec()));
        response.ret = Some(ret);
        response
    }

    /// Derive a success response carrying a processor-built body.
    pub fn create_response_with_body(&self, body: Bytes) -> EventWrapper {
        let mut response = self.clone();
        response.body = body;
        response.ret = Some(RetCode::Success);
        response
    }

    /// Result code of a completed response, if this wrapper is one.
    pub fn ret(&self) -> Option<RetCode> {
        self.ret
    }

    /// Render the response: body bytes as `application/json`, keep-alive.
    pub fn http_response(&self) -> Response<Full<Bytes>> {
        Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONNECTION, "keep-alive")
            .body(Full::new(self.body.clone()))
            .expect("static response parts are valid")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wrapper_with_body(body: &str) -> EventWrapper {
        EventWrapper::new(
            "HTTP/1.1".into(),
            "/eventmesh/publish".into(),
            HashMap::new(),
            Bytes::from(body.to_string()),
            epoch_millis(),
        )
    }

    #[test]
    fn body_round_trips_through_canonical_json() {
        let mut map = Map::new();
        map.insert("a".into(), Value::from(1));
        map.insert("b".into(), Value::from("x"));
        let bytes = Bytes::from(serde_json::to_vec(&map).unwrap());

        let wrapper = EventWrapper::new(
            "HTTP/1.1".into(),
            "/eventmesh/publish".into(),
            HashMap::new(),
            bytes,
            epoch_millis(),
        );
        assert_eq!(wrapper.body_map().unwrap(), map);
    }

    #[test]
    fn error_response_body_is_the_envelope() {
        let response = wrapper_with_body("{}").create_response(RetCode::Overload);
        assert_eq!(response.ret(), Some(RetCode::Overload));

        let parsed: Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(parsed["retCode"], RetCode::Overload.code());
        assert_eq!(parsed["retMsg"], RetCode::Overload.msg());
    }

    #[test]
    fn success_response_keeps_processor_body() {
        let request = wrapper_with_body("{}");
        let response = request.create_response_with_body(Bytes::from_static(b"{\"ok\":true}"));
        assert_eq!(response.ret(), Some(RetCode::Success));
        assert_eq!(&response.body[..], b"{\"ok\":true}");
    }

    #[test]
    fn empty_body_decodes_to_empty_map() {
        let wrapper = wrapper_with_body("");
        assert!(wrapper.body_map().unwrap().is_empty());
    }
}
