//! Request body decoding.
//!
//! Every request body is flattened to a string-keyed attribute map:
//! GET query parameters (first value wins), POST JSON objects, POST
//! form-urlencoded fields, or POST multipart attribute fields. Multipart file
//! parts are skipped; upload handling belongs to processors.

use bytes::Bytes;
use http::{Method, Uri};
use serde_json::{Map, Value};

use crate::observability::IngressMetrics;
use crate::protocol::epoch_millis;

/// Failure to interpret a request body under its declared content type.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("malformed JSON body: {0}")]
    Json(#[from] serde_json::Error),
    #[error("malformed multipart body: {0}")]
    Multipart(#[from] multer::Error),
    #[error("unsupported content type '{0}'")]
    ContentType(String),
}

/// Decode the request body into an attribute map, recording decode latency.
pub async fn decode(
    method: &Method,
    uri: &Uri,
    content_type: Option<&str>,
    body: Bytes,
    metrics: &IngressMetrics,
) -> Result<Map<String, Value>, DecodeError> {
    let decode_start = epoch_millis();
    let result = decode_inner(method, uri, content_type, body).await;
    metrics.record_decode_time_cost((epoch_millis() - decode_start).max(0) as u64);
    result
}

async fn decode_inner(
    method: &Method,
    uri: &Uri,
    content_type: Option<&str>,
    body: Bytes,
) -> Result<Map<String, Value>, DecodeError> {
    let mut attributes = Map::new();

    if *method == Method::GET {
        if let Some(query) = uri.query() {
            for (name, value) in url::form_urlencoded::parse(query.as_bytes()) {
                attributes
                    .entry(name.into_owned())
                    .or_insert(Value::String(value.into_owned()));
            }
        }
        return Ok(attributes);
    }

    if body.is_empty() {
        return Ok(attributes);
    }

    let content_type = content_type.unwrap_or("");
    if content_type.contains("application/json") {
        let parsed: Map<String, Value> = serde_json::from_slice(&body)?;
        attributes.extend(parsed);
    } else if content_type.contains("multipart/") {
        let boundary = multer::parse_boundary(content_type)?;
        let stream = futures_util::stream::once(async move {
            Ok::<Bytes, std::convert::Infallible>(body)
        });
        let mut multipart = multer::Multipart::new(stream, boundary);
        while let Some(field) = multipart.next_field().await? {
            if field.file_name().is_some() {
                continue;
            }
            let Some(name) = field.name().map(str::to_string) else {
                continue;
            };
            let value = field.text().await?;
            attributes.insert(name, Value::String(value));
        }
    } else if content_type.is_empty() || content_type.contains("application/x-www-form-urlencoded")
    {
        for (name, value) in url::form_urlencoded::parse(&body) {
            attributes.insert(name.into_owned(), Value::String(value.into_owned()));
        }
    } else {
        return Err(DecodeError::ContentType(content_type.to_string()));
    }

    Ok(attributes)
}
