//! Error kinds for MathPad operations

use std::fmt;

/// The kind of error that occurred.
///
/// Callers match on `ErrorKind` to decide what to do; the gateway also uses it
/// to pick the HTTP status and the `code` field of the error envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ErrorKind {
    // =========================================================================
    // General errors
    // =========================================================================
    /// An unexpected error occurred - catch-all for unhandled cases
    Unexpected,

    /// Missing or invalid configuration (e.g. no model credential)
    ConfigInvalid,

    // =========================================================================
    // Request errors
    // =========================================================================
    /// The request is missing required data or carries a malformed payload
    InvalidInput,

    /// A solve was triggered while another one is still outstanding
    SolveInFlight,

    // =========================================================================
    // Upstream model errors
    // =========================================================================
    /// The external model rejected the call or answered with a server error
    UpstreamFailed,

    /// Could not reach the external model
    NetworkFailed,

    /// The external model throttled the call
    RateLimited,

    /// The call did not finish within its time budget
    Timeout,

    // =========================================================================
    // Data errors
    // =========================================================================
    /// The model reply could not be decoded into result records
    ParseFailed,

    /// Encoding or decoding of a local value failed
    SerializationFailed,

    // =========================================================================
    // IO errors
    // =========================================================================
    /// File not found
    FileNotFound,

    /// Permission denied
    PermissionDenied,

    /// IO operation failed
    IoFailed,
}

impl ErrorKind {
    /// Returns the error kind as a static string
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Unexpected => "Unexpected",
            ErrorKind::ConfigInvalid => "ConfigInvalid",

            ErrorKind::InvalidInput => "InvalidInput",
            ErrorKind::SolveInFlight => "SolveInFlight",

            ErrorKind::UpstreamFailed => "UpstreamFailed",
            ErrorKind::NetworkFailed => "NetworkFailed",
            ErrorKind::RateLimited => "RateLimited",
            ErrorKind::Timeout => "Timeout",

            ErrorKind::ParseFailed => "ParseFailed",
            ErrorKind::SerializationFailed => "SerializationFailed",

            ErrorKind::FileNotFound => "FileNotFound",
            ErrorKind::PermissionDenied => "PermissionDenied",
            ErrorKind::IoFailed => "IoFailed",
        }
    }

    /// Stable code reported in the gateway's error envelope.
    ///
    /// Network and rate-limit failures are both upstream failures from the
    /// client's point of view.
    pub fn code(&self) -> &'static str {
        match self {
            ErrorKind::ConfigInvalid => "CONFIGURATION_ERROR",
            ErrorKind::InvalidInput => "INVALID_INPUT",
            ErrorKind::UpstreamFailed | ErrorKind::NetworkFailed | ErrorKind::RateLimited => {
                "UPSTREAM_ERROR"
            }
            ErrorKind::Timeout => "TIMEOUT",
            ErrorKind::ParseFailed => "PARSE_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }

    /// Inverse of [`ErrorKind::code`], used by clients reading an envelope
    pub fn from_code(code: &str) -> Self {
        match code {
            "CONFIGURATION_ERROR" => ErrorKind::ConfigInvalid,
            "INVALID_INPUT" => ErrorKind::InvalidInput,
            "UPSTREAM_ERROR" => ErrorKind::UpstreamFailed,
            "TIMEOUT" => ErrorKind::Timeout,
            "PARSE_ERROR" => ErrorKind::ParseFailed,
            _ => ErrorKind::Unexpected,
        }
    }

    /// Check if this error kind is retryable by default
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            ErrorKind::NetworkFailed | ErrorKind::RateLimited | ErrorKind::Timeout
        )
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kind_display() {
        assert_eq!(ErrorKind::InvalidInput.to_string(), "InvalidInput");
        assert_eq!(ErrorKind::ParseFailed.to_string(), "ParseFailed");
    }

    #[test]
    fn test_is_retryable() {
        assert!(ErrorKind::NetworkFailed.is_retryable());
        assert!(ErrorKind::RateLimited.is_retryable());
        assert!(ErrorKind::Timeout.is_retryable());
        assert!(!ErrorKind::ParseFailed.is_retryable());
        assert!(!ErrorKind::InvalidInput.is_retryable());
    }

    #[test]
    fn test_codes() {
        assert_eq!(ErrorKind::ParseFailed.code(), "PARSE_ERROR");
        assert_eq!(ErrorKind::Timeout.code(), "TIMEOUT");
        assert_eq!(ErrorKind::RateLimited.code(), "UPSTREAM_ERROR");
        assert_eq!(ErrorKind::IoFailed.code(), "INTERNAL_ERROR");
        assert_eq!(ErrorKind::from_code("INVALID_INPUT"), ErrorKind::InvalidInput);
        assert_eq!(ErrorKind::from_code("nonsense"), ErrorKind::Unexpected);
    }
}
