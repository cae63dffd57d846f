//! # Vision Model Provider Interface
//!
//! A trait-based abstraction over vision-capable generative models.
//!
//! ## Design
//! - `VisionModel` trait: one image + one instruction in, free text out
//! - `GeminiProvider`: Google Generative Language REST API
//! - `ScriptedModel`: canned replies, for tests and offline demos
//! - Usage reporting per call

pub mod gemini;
pub mod scripted;

pub use gemini::GeminiProvider;
pub use scripted::ScriptedModel;

use std::future::Future;

// ============================================================================
// Core Types
// ============================================================================

/// An image sent inline with the request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineImage {
    pub mime_type: String,
    /// Base64 payload without any data-URI prefix
    pub data: String,
}

impl InlineImage {
    pub fn png(data: impl Into<String>) -> Self {
        Self {
            mime_type: "image/png".into(),
            data: data.into(),
        }
    }
}

/// Request parameters for one generation call
#[derive(Debug, Clone)]
pub struct GenerateRequest {
    pub image: InlineImage,
    pub prompt: String,
    pub temperature: Option<f32>,
    /// When set, the provider asks for a JSON reply matching this schema
    pub response_schema: Option<serde_json::Value>,
}

impl GenerateRequest {
    pub fn new(image: InlineImage, prompt: impl Into<String>) -> Self {
        Self {
            image,
            prompt: prompt.into(),
            temperature: None,
            response_schema: None,
        }
    }

    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    pub fn with_response_schema(mut self, schema: serde_json::Value) -> Self {
        self.response_schema = Some(schema);
        self
    }
}

/// Response from a generation call
#[derive(Debug, Clone)]
pub struct GenerateResponse {
    pub model: String,
    /// Text of the first candidate, if the model produced any
    pub text: Option<String>,
    pub finish_reason: FinishReason,
    pub usage: Usage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Stop,
    Length,
    Safety,
    Recitation,
    Unknown,
}

impl FinishReason {
    pub fn from_wire(reason: Option<&str>) -> Self {
        match reason {
            Some("STOP") => FinishReason::Stop,
            Some("MAX_TOKENS") => FinishReason::Length,
            Some("SAFETY") | Some("BLOCKLIST") | Some("PROHIBITED_CONTENT") => FinishReason::Safety,
            Some("RECITATION") => FinishReason::Recitation,
            _ => FinishReason::Unknown,
        }
    }
}

/// Token usage information
#[derive(Debug, Clone, Default)]
pub struct Usage {
    pub prompt_tokens: usize,
    pub completion_tokens: usize,
    pub total_tokens: usize,
}

// ============================================================================
// Provider Trait
// ============================================================================

/// Error type for provider operations
#[derive(Debug)]
pub enum ProviderError {
    /// Network/connection error
    Network(String),
    /// The HTTP call exceeded the client timeout
    Timeout,
    /// API returned an error
    Api { status: u16, message: String },
    /// Failed to parse response
    Parse(String),
    /// Rate limited
    RateLimited { retry_after: Option<u64> },
    /// Authentication failed
    AuthenticationFailed,
    /// Other error
    Other(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Network(e) => write!(f, "Network error: {}", e),
            Self::Timeout => write!(f, "Request timed out"),
            Self::Api { status, message } => write!(f, "API error ({}): {}", status, message),
            Self::Parse(e) => write!(f, "Parse error: {}", e),
            Self::RateLimited { retry_after } => {
                write!(f, "Rate limited")?;
                if let Some(secs) = retry_after {
                    write!(f, " (retry after {}s)", secs)?;
                }
                Ok(())
            }
            Self::AuthenticationFailed => write!(f, "Authentication failed"),
            Self::Other(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for ProviderError {}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_decode() {
            ProviderError::Parse(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

/// A vision-capable generative model
pub trait VisionModel: Send + Sync {
    /// Get the provider name (e.g., "gemini")
    fn name(&self) -> &str;

    /// Get the default model
    fn default_model(&self) -> &str;

    /// Send one image + instruction and get the model's reply
    fn generate(
        &self,
        request: GenerateRequest,
    ) -> impl Future<Output = Result<GenerateResponse, ProviderError>> + Send;
}

// ============================================================================
// Provider Configuration
// ============================================================================

/// Configuration for creating providers
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    pub base_url: Option<String>,
    pub default_model: Option<String>,
    pub timeout_secs: Option<u64>,
}

impl ProviderConfig {
    pub fn gemini(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            base_url: Some(gemini::DEFAULT_BASE_URL.into()),
            default_model: Some(gemini::DEFAULT_MODEL.into()),
            timeout_secs: Some(30),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = Some(model.into());
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request_builder() {
        let request = GenerateRequest::new(InlineImage::png("AAAA"), "solve this")
            .with_temperature(0.2)
            .with_response_schema(serde_json::json!({ "type": "ARRAY" }));

        assert_eq!(request.image.mime_type, "image/png");
        assert_eq!(request.temperature, Some(0.2));
        assert!(request.response_schema.is_some());
    }

    #[test]
    fn test_provider_config() {
        let config = ProviderConfig::gemini("key-123")
            .with_model("gemini-2.0-flash")
            .with_timeout(10);

        assert_eq!(config.api_key.as_deref(), Some("key-123"));
        assert_eq!(config.default_model.as_deref(), Some("gemini-2.0-flash"));
        assert_eq!(config.timeout_secs, Some(10));
    }

    #[test]
    fn test_finish_reason_from_wire() {
        assert_eq!(FinishReason::from_wire(Some("STOP")), FinishReason::Stop);
        assert_eq!(FinishReason::from_wire(Some("MAX_TOKENS")), FinishReason::Length);
        assert_eq!(FinishReason::from_wire(Some("SAFETY")), FinishReason::Safety);
        assert_eq!(FinishReason::from_wire(None), FinishReason::Unknown);
    }

    #[test]
    fn test_provider_error_display() {
        let err = ProviderError::RateLimited { retry_after: Some(3) };
        assert_eq!(err.to_string(), "Rate limited (retry after 3s)");
        let err = ProviderError::Api { status: 500, message: "boom".into() };
        assert_eq!(err.to_string(), "API error (500): boom");
    }
}
