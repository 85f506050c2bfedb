//! Legacy request-code registry.

/// Numeric identifiers selecting a legacy processor.
///
/// Carried in the `code` header on POST, or the `code` body attribute on GET.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestCode {
    MsgSendSync,
    MsgSendAsync,
    MsgBatchSend,
    Register,
    Unregister,
    Heartbeat,
    Subscribe,
    Unsubscribe,
    ReplyMessage,
    AdminMetrics,
}

impl RequestCode {
    pub fn value(&self) -> i32 {
        match self {
            RequestCode::MsgSendSync => 101,
            RequestCode::MsgSendAsync => 102,
            RequestCode::MsgBatchSend => 103,
            RequestCode::Register => 200,
            RequestCode::Unregister => 201,
            RequestCode::Heartbeat => 203,
            RequestCode::Subscribe => 206,
            RequestCode::Unsubscribe => 207,
            RequestCode::ReplyMessage => 301,
            RequestCode::AdminMetrics => 603,
        }
    }

    pub fn from_value(value: i32) -> Option<Self> {
        match value {
            101 => Some(RequestCode::MsgSendSync),
            102 => Some(RequestCode::MsgSendAsync),
            103 => Some(RequestCode::MsgBatchSend),
            200 => Some(RequestCode::Register),
            201 => Some(RequestCode::Unregister),
            203 => Some(RequestCode::Heartbeat),
            206 => Some(RequestCode::Subscribe),
            207 => Some(RequestCode::Unsubscribe),
            301 => Some(RequestCode::ReplyMessage),
            603 => Some(RequestCode::AdminMetrics),
            _ => None,
        }
    }

    /// Whether a stringified code names a recognized value.
    pub fn contains(code: &str) -> bool {
        code.parse::<i32>().ok().and_then(Self::from_value).is_some()
    }

    /// Send-family codes carry message payloads and require producer metadata.
    pub fn is_send_family(&self) -> bool {
        matches!(
            self,
            RequestCode::MsgSendSync | RequestCode::MsgSendAsync | RequestCode::MsgBatchSend
        )
    }
}

impl std::fmt::Display for RequestCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.value())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_values() {
        for code in [
            RequestCode::MsgSendSync,
            RequestCode::Register,
            RequestCode::Heartbeat,
            RequestCode::AdminMetrics,
        ] {
            assert_eq!(RequestCode::from_value(code.value()), Some(code));
        }
    }

    #[test]
    fn contains_handles_garbage() {
        assert!(RequestCode::contains("200"));
        assert!(!RequestCode::contains("9999"));
        assert!(!RequestCode::contains("abc"));
        assert!(!RequestCode::contains(""));
    }
}
