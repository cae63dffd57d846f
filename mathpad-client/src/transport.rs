//! # Gateway Transport
//!
//! How a solve request reaches the gateway. [`HttpTransport`] is the real
//! thing; tests substitute their own [`SolveTransport`].

use mathpad_error::{Error, ErrorKind, Result};
use mathpad_gateway::{ErrorResponse, SolveRequest, SolveResponse, SolveResultRecord, SOLVE_PATH};
use std::future::Future;
use std::time::Duration;

pub const DEFAULT_GATEWAY: &str = "http://127.0.0.1:3000";

/// Sends one solve request and returns the gateway's records
pub trait SolveTransport: Send + Sync {
    fn solve(
        &self,
        request: &SolveRequest,
    ) -> impl Future<Output = Result<Vec<SolveResultRecord>>> + Send;
}

/// JSON over HTTP to `{base_url}/api/genai`
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpTransport {
    pub fn new(base_url: impl AsRef<str>, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                Error::unexpected(format!("failed to build HTTP client: {}", e))
                    .with_operation("transport::new")
                    .set_source(e)
            })?;

        Ok(Self {
            client,
            endpoint: format!("{}{}", base_url.as_ref().trim_end_matches('/'), SOLVE_PATH),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl SolveTransport for HttpTransport {
    async fn solve(&self, request: &SolveRequest) -> Result<Vec<SolveResultRecord>> {
        tracing::debug!(endpoint = %self.endpoint, vars = request.variables.len(), "sending solve request");

        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| send_error(e, &self.endpoint))?;

        let status = response.status();
        let body = response
            .bytes()
            .await
            .map_err(|e| send_error(e, &self.endpoint))?;

        if status != reqwest::StatusCode::OK {
            return Err(envelope_error(status, &body));
        }

        let decoded: SolveResponse = serde_json::from_slice(&body).map_err(|e| {
            Error::parse_failed(format!("gateway returned an unreadable success body: {}", e))
                .with_operation("transport::solve")
                .set_source(e)
        })?;

        tracing::debug!(records = decoded.data.len(), "gateway answered");
        Ok(decoded.data)
    }
}

fn send_error(err: reqwest::Error, endpoint: &str) -> Error {
    let kind = if err.is_timeout() {
        ErrorKind::Timeout
    } else {
        ErrorKind::NetworkFailed
    };
    Error::new(kind, format!("gateway request failed: {}", err))
        .with_operation("transport::solve")
        .with_context("endpoint", endpoint)
        .set_source(err)
}

/// Non-200 answers carry `{error, code}`; anything else is still an error
fn envelope_error(status: reqwest::StatusCode, body: &[u8]) -> Error {
    let (kind, message) = match serde_json::from_slice::<ErrorResponse>(body) {
        Ok(envelope) => (ErrorKind::from_code(&envelope.code), envelope.error),
        Err(_) => (
            ErrorKind::UpstreamFailed,
            format!("gateway answered {} without an error envelope", status),
        ),
    };

    Error::new(kind, message)
        .with_operation("transport::solve")
        .with_context("status", status.as_u16().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_joins_path() {
        let t = HttpTransport::new("http://localhost:3000/", Duration::from_secs(1)).unwrap();
        assert_eq!(t.endpoint(), "http://localhost:3000/api/genai");
    }

    #[test]
    fn test_envelope_error_uses_code() {
        let err = envelope_error(
            reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            br#"{"error": "request is missing an image payload", "code": "INVALID_INPUT"}"#,
        );
        assert_eq!(err.kind(), ErrorKind::InvalidInput);
        assert_eq!(err.message(), "request is missing an image payload");
        assert!(err.context().contains(&("status", "500".to_string())));
    }

    #[test]
    fn test_envelope_error_without_body() {
        let err = envelope_error(reqwest::StatusCode::BAD_GATEWAY, b"<html>bad gateway</html>");
        assert_eq!(err.kind(), ErrorKind::UpstreamFailed);
        assert!(err.message().contains("502"));
    }

    #[tokio::test]
    async fn test_unreachable_gateway_is_network_error() {
        // port 9 (discard) on localhost is closed in test environments
        let t = HttpTransport::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();
        let err = t
            .solve(&SolveRequest::new("data:image/png;base64,AAAA", Default::default()))
            .await
            .unwrap_err();
        assert!(matches!(err.kind(), ErrorKind::NetworkFailed | ErrorKind::Timeout));
    }
}
