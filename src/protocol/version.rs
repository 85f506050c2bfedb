//! Protocol version negotiation.

/// Recognized client protocol versions.
///
/// A blank version header is defaulted to [`ProtocolVersion::V1`] during
/// header enrichment, before validation runs, so only a non-blank unknown
/// string fails validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolVersion {
    V1,
    V2,
}

impl ProtocolVersion {
    /// The wire form of this version.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProtocolVersion::V1 => "1.0",
            ProtocolVersion::V2 => "2.0",
        }
    }

    /// Parse a wire version string.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "1.0" => Some(ProtocolVersion::V1),
            "2.0" => Some(ProtocolVersion::V2),
            _ => None,
        }
    }

    /// Whether `s` names a recognized version.
    pub fn contains(s: &str) -> bool {
        Self::parse(s).is_some()
    }
}

impl std::fmt::Display for ProtocolVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_known_versions() {
        assert_eq!(ProtocolVersion::parse("1.0"), Some(ProtocolVersion::V1));
        assert_eq!(ProtocolVersion::parse("2.0"), Some(ProtocolVersion::V2));
        assert!(ProtocolVersion::contains("1.0"));
    }

    #[test]
    fn rejects_unknown_versions() {
        assert!(!ProtocolVersion::contains("3.0"));
        assert!(!ProtocolVersion::contains(""));
        assert!(!ProtocolVersion::contains("v1"));
    }
}
