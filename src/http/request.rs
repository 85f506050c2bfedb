//! Header snapshot, enrichment and validation.
//!
//! Enrichment runs before validation: the version default is applied first,
//! so validation only fails on a non-blank unrecognized version.

use std::collections::HashMap;
use std::net::SocketAddr;

use http::{HeaderMap, Method, StatusCode};

use crate::protocol::{epoch_millis, key, ProtocolVersion};

/// Snapshot request headers into a lower-cased string map.
///
/// Non-UTF-8 header values are flattened to empty strings; the mesh protocol
/// headers are all ASCII.
pub fn header_snapshot(headers: &HeaderMap) -> HashMap<String, String> {
    headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_ascii_lowercase(),
                value.to_str().unwrap_or("").to_string(),
            )
        })
        .collect()
}

/// Stamp ingress metadata into the header snapshot.
///
/// Sets the receive timestamp, defaults a blank version to V1, and injects
/// the client and server addresses. Returns the receive timestamp.
pub fn enrich(headers: &mut HashMap<String, String>, peer: SocketAddr, server_ip: &str) -> i64 {
    let req_time = epoch_millis();
    headers.insert(key::REQ_C2EVENTMESH_TIMESTAMP.to_string(), req_time.to_string());

    let version_blank = headers
        .get(key::VERSION)
        .map(|v| v.trim().is_empty())
        .unwrap_or(true);
    if version_blank {
        headers.insert(key::VERSION.to_string(), ProtocolVersion::V1.as_str().to_string());
    }

    headers.insert(key::CLIENT_IP.to_string(), peer.ip().to_string());
    headers.insert(key::REQ_SEND_EVENTMESH_IP.to_string(), server_ip.to_string());

    req_time
}

/// Validate a request against the transport-level rules.
///
/// Returns the error status to answer with, or `None` when the request may
/// enter the dispatch plane. Check order: not-started, method, version.
pub fn validate(
    started: bool,
    method: &Method,
    headers: &HashMap<String, String>,
) -> Option<StatusCode> {
    if !started {
        return Some(StatusCode::SERVICE_UNAVAILABLE);
    }

    if *method != Method::GET && *method != Method::POST {
        return Some(StatusCode::METHOD_NOT_ALLOWED);
    }

    let version = headers.get(key::VERSION).map(String::as_str).unwrap_or("");
    if !ProtocolVersion::contains(version) {
        return Some(StatusCode::BAD_REQUEST);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn peer() -> SocketAddr {
        "10.1.2.3:55000".parse().unwrap()
    }

    #[test]
    fn enrich_injects_ingress_headers() {
        let mut headers = HashMap::new();
        let req_time = enrich(&mut headers, peer(), "192.168.0.9");

        assert_eq!(headers.get(key::CLIENT_IP).unwrap(), "10.1.2.3");
        assert_eq!(headers.get(key::REQ_SEND_EVENTMESH_IP).unwrap(), "192.168.0.9");
        assert_eq!(
            headers.get(key::REQ_C2EVENTMESH_TIMESTAMP).unwrap(),
            &req_time.to_string()
        );
        assert_eq!(headers.get(key::VERSION).unwrap(), "1.0");
    }

    #[test]
    fn enrich_keeps_explicit_version() {
        let mut headers = HashMap::new();
        headers.insert(key::VERSION.to_string(), "2.0".to_string());
        enrich(&mut headers, peer(), "192.168.0.9");
        assert_eq!(headers.get(key::VERSION).unwrap(), "2.0");
    }

    #[test]
    fn validate_rejects_before_start() {
        let mut headers = HashMap::new();
        enrich(&mut headers, peer(), "ip");
        // Not-started wins over any other failure.
        assert_eq!(
            validate(false, &Method::DELETE, &headers),
            Some(StatusCode::SERVICE_UNAVAILABLE)
        );
    }

    #[test]
    fn validate_rejects_bad_method_and_version() {
        let mut headers = HashMap::new();
        enrich(&mut headers, peer(), "ip");
        assert_eq!(
            validate(true, &Method::PUT, &headers),
            Some(StatusCode::METHOD_NOT_ALLOWED)
        );

        headers.insert(key::VERSION.to_string(), "9.9".to_string());
        assert_eq!(
            validate(true, &Method::POST, &headers),
            Some(StatusCode::BAD_REQUEST)
        );
    }

    #[test]
    fn validate_passes_enriched_get_and_post() {
        let mut headers = HashMap::new();
        enrich(&mut headers, peer(), "ip");
        assert_eq!(validate(true, &Method::GET, &headers), None);
        assert_eq!(validate(true, &Method::POST, &headers), None);
    }
}
