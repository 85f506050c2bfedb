//! Header and attribute names used on the wire.
//!
//! Header keys are stored lower-cased in the ingress header snapshot, so the
//! constants here are the lower-case forms.

/// Protocol version negotiated by the client.
pub const VERSION: &str = "version";

/// Legacy request code: header on POST, body attribute on GET.
pub const REQUEST_CODE: &str = "code";

/// Client address, injected by the ingress.
pub const CLIENT_IP: &str = "ip";

/// Ingress receive timestamp (epoch millis), injected by the ingress.
pub const REQ_C2EVENTMESH_TIMESTAMP: &str = "req_c2eventmesh_timestamp";

/// Address of the mesh server that accepted the request, injected by the ingress.
pub const REQ_SEND_EVENTMESH_IP: &str = "req_send_eventmesh_ip";

/// Producer group, required on send-family request headers.
pub const PRODUCER_GROUP: &str = "producergroup";

/// Topic body attribute, required on send-family requests.
pub const TOPIC: &str = "topic";
