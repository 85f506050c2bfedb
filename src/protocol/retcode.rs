//! Mesh-level result codes carried in response envelopes.

/// Result of handling a request, as reported to the client inside the JSON
/// envelope. Every variant except [`RetCode::Success`] rides HTTP 200: the
/// transport succeeded, the mesh-level operation did not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetCode {
    Success,
    RuntimeErr,
    RequestCodeInvalid,
    RejectByProcessor,
    Overload,
}

impl RetCode {
    pub fn code(&self) -> i32 {
        match self {
            RetCode::Success => 0,
            RetCode::RuntimeErr => 2,
            RetCode::RequestCodeInvalid => 3,
            RetCode::RejectByProcessor => 7,
            RetCode::Overload => 8,
        }
    }

    pub fn msg(&self) -> &'static str {
        match self {
            RetCode::Success => "success",
            RetCode::RuntimeErr => "mesh runtime error",
            RetCode::RequestCodeInvalid => "request code invalid",
            RetCode::RejectByProcessor => "request rejected by processor",
            RetCode::Overload => "mesh overload, try later",
        }
    }
}

impl std::fmt::Display for RetCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code(), self.msg())
    }
}
