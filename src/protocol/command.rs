//! Request-code command envelope.
//!
//! `CodeCommand` is the dispatch unit for the legacy request-code path. It is
//! built on the connection's I/O task from the decoded request, consumed by a
//! route worker, and turned back into a full HTTP response by
//! [`CodeCommand::http_response`].

use std::collections::HashMap;

use bytes::Bytes;
use http::{header, Response, StatusCode};
use http_body_util::Full;
use serde_json::{Map, Value};

use crate::protocol::{epoch_millis, key, RequestCode, RetCode};

/// Failure while assembling the typed header or body of a command.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("required header '{0}' is missing or blank")]
    MissingHeader(&'static str),
    #[error("required body attribute '{0}' is missing or blank")]
    MissingAttribute(&'static str),
}

/// Typed view over the request headers for one request code.
#[derive(Debug, Clone)]
pub struct Header {
    code: RequestCode,
    fields: HashMap<String, String>,
}

impl Header {
    /// Build the header for `code` from the enriched header snapshot.
    ///
    /// Send-family codes must carry a producer group.
    pub fn build(code: RequestCode, headers: &HashMap<String, String>) -> Result<Self, BuildError> {
        if code.is_send_family() {
            let group = headers.get(key::PRODUCER_GROUP).map(String::as_str).unwrap_or("");
            if group.trim().is_empty() {
                return Err(BuildError::MissingHeader(key::PRODUCER_GROUP));
            }
        }
        Ok(Self {
            code,
            fields: headers.clone(),
        })
    }

    pub fn code(&self) -> RequestCode {
        self.code
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    pub fn fields(&self) -> &HashMap<String, String> {
        &self.fields
    }
}

/// Typed view over the decoded body attributes for one request code.
#[derive(Debug, Clone)]
pub struct Body {
    attributes: Map<String, Value>,
}

impl Body {
    /// Build the body for `code` from the decoded attribute map.
    ///
    /// Send-family codes must name a topic.
    pub fn build(code: RequestCode, attributes: Map<String, Value>) -> Result<Self, BuildError> {
        if code.is_send_family() {
            let topic = attributes.get(key::TOPIC).and_then(Value::as_str).unwrap_or("");
            if topic.trim().is_empty() {
                return Err(BuildError::MissingAttribute(key::TOPIC));
            }
        }
        Ok(Self { attributes })
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.attributes
    }
}

#[derive(Debug, Clone)]
struct CommandResult {
    ret: RetCode,
    res_time: i64,
    payload: Option<Map<String, Value>>,
}

/// A legacy request-code command and, once completed, its response.
#[derive(Debug, Clone)]
pub struct CodeCommand {
    pub http_method: String,
    pub http_version: String,
    pub request_code: String,
    pub header: Header,
    pub body: Body,
    pub req_time: i64,
    result: Option<CommandResult>,
}

impl CodeCommand {
    pub fn new(
        http_method: String,
        http_version: String,
        request_code: String,
        header: Header,
        body: Body,
        req_time: i64,
    ) -> Self {
        Self {
            http_method,
            http_version,
            request_code,
            header,
            body,
            req_time,
            result: None,
        }
    }

    /// Derive the response command for this request.
    pub fn create_response(&self, ret: RetCode) -> CodeCommand {
        let mut response = self.clone();
        response.result = Some(CommandResult {
            ret,
            res_time: epoch_millis(),
            payload: None,
        });
        response
    }

    /// Derive a success response carrying a processor payload.
    pub fn create_response_with_payload(&self, ret: RetCode, payload: Map<String, Value>) -> CodeCommand {
        let mut response = self.clone();
        response.result = Some(CommandResult {
            ret,
            res_time: epoch_millis(),
            payload: Some(payload),
        });
        response
    }

    /// Result code of a completed response, if this command is one.
    pub fn ret(&self) -> Option<RetCode> {
        self.result.as_ref().map(|r| r.ret)
    }

    /// Serialized JSON envelope: `retCode`, `retMsg` and `resTime` alongside
    /// any processor payload fields.
    pub fn envelope_json(&self) -> Vec<u8> {
        let (ret, res_time, payload) = match &self.result {
            Some(r) => (r.ret, r.res_time, r.payload.clone()),
            None => (RetCode::Success, epoch_millis(), None),
        };

        let mut envelope = payload.unwrap_or_default();
        envelope.insert("retCode".into(), Value::from(ret.code()));
        envelope.insert("retMsg".into(), Value::from(ret.msg()));
        envelope.insert("resTime".into(), Value::from(res_time));

        serde_json::to_vec(&envelope).unwrap_or_else(|_| b"{}".to_vec())
    }

    /// Render the JSON envelope response; Content-Type is `application/json`
    /// and the connection stays alive.
    pub fn http_response(&self) -> Response<Full<Bytes>> {
        Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONNECTION, "keep-alive")
            .body(Full::new(Bytes::from(self.envelope_json())))
            .expect("static response parts are valid")
    }
}
