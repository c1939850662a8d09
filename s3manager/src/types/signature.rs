//! Request signing mode for the upstream S3 endpoint

use std::fmt;
use std::str::FromStr;

/// How requests to the S3 endpoint are signed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignatureType {
    /// Legacy AWS signature version 2
    V2,
    /// AWS signature version 4
    V4,
    /// AWS signature version 4 with chunked payload signing
    V4Streaming,
    /// Unsigned requests
    Anonymous,
}

impl SignatureType {
    /// Whether requests carry a signature at all
    #[must_use]
    pub const fn is_signed(self) -> bool {
        !matches!(self, Self::Anonymous)
    }

    /// Whether the SDK can sign requests this way
    ///
    /// The SDK only implements SigV4. Streaming payload signing is chosen per
    /// request by the SDK itself, so `V4Streaming` is served by plain SigV4.
    #[must_use]
    pub const fn is_supported(self) -> bool {
        !matches!(self, Self::V2)
    }
}

impl FromStr for SignatureType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "V2" => Ok(Self::V2),
            "V4" => Ok(Self::V4),
            "V4Streaming" => Ok(Self::V4Streaming),
            "Anonymous" => Ok(Self::Anonymous),
            other => Err(other.to_string()),
        }
    }
}

impl fmt::Display for SignatureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::V2 => "V2",
            Self::V4 => "V4",
            Self::V4Streaming => "V4Streaming",
            Self::Anonymous => "Anonymous",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_signature_types() {
        assert_eq!("V2".parse(), Ok(SignatureType::V2));
        assert_eq!("V4".parse(), Ok(SignatureType::V4));
        assert_eq!("V4Streaming".parse(), Ok(SignatureType::V4Streaming));
        assert_eq!("Anonymous".parse(), Ok(SignatureType::Anonymous));
    }

    #[test]
    fn test_parse_is_case_sensitive() {
        assert_eq!("v4".parse::<SignatureType>(), Err("v4".to_string()));
        assert_eq!("".parse::<SignatureType>(), Err(String::new()));
    }

    #[test]
    fn test_signature_capabilities() {
        assert!(!SignatureType::V2.is_supported());
        assert!(SignatureType::V4Streaming.is_supported());
        assert!(SignatureType::V4.is_signed());
        assert!(!SignatureType::Anonymous.is_signed());
        assert_eq!(SignatureType::V4Streaming.to_string(), "V4Streaming");
    }
}
