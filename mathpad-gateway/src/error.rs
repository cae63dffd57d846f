//! Gateway error types
//!
//! Re-exports mathpad-error and converts provider failures into it.

pub use mathpad_error::{Error, ErrorKind, ErrorStatus, Result};

use crate::provider::ProviderError;

/// Create an InvalidInput error for a request field
pub fn invalid_input(field: &'static str, reason: impl Into<String>) -> Error {
    Error::invalid_input(reason).with_context("field", field)
}

/// Create a ParseFailed error for a model reply
pub fn parse_error(message: impl Into<String>) -> Error {
    Error::parse_failed(message).with_operation("reply::parse")
}

// =============================================================================
// Provider errors
// =============================================================================

impl From<ProviderError> for Error {
    fn from(err: ProviderError) -> Self {
        let message = err.to_string();
        let base = match &err {
            ProviderError::Network(_) => Error::new(ErrorKind::NetworkFailed, message),
            ProviderError::Timeout => Error::new(ErrorKind::Timeout, message),
            ProviderError::RateLimited { retry_after } => {
                let e = Error::new(ErrorKind::RateLimited, message);
                match retry_after {
                    Some(secs) => e.with_context("retry_after", secs.to_string()),
                    None => e,
                }
            }
            ProviderError::Api { status, .. } => {
                let e = Error::new(ErrorKind::UpstreamFailed, message)
                    .with_context("status", status.to_string());
                if *status >= 500 {
                    e.temporary()
                } else {
                    e
                }
            }
            ProviderError::AuthenticationFailed => Error::new(ErrorKind::ConfigInvalid, message)
                .with_context("setting", "model credential"),
            ProviderError::Parse(_) | ProviderError::Other(_) => {
                Error::new(ErrorKind::UpstreamFailed, message)
            }
        };
        base.with_operation("provider").set_source(err)
    }
}
