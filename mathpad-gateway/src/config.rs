//! # Gateway Configuration
//!
//! Everything the gateway needs is read once at start-up, from the process
//! environment (see [`GatewayConfig::from_env`]). A missing model credential
//! is a hard error: the gateway never starts without one.

use crate::error::{Error, Result};
use crate::provider::{gemini, ProviderConfig};
use crate::schema::SolveResultRecord;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

/// Credential variables, in lookup order
pub const API_KEY_VARS: [&str; 2] = ["GOOGLE_GEMI_API", "GEMINI_API_KEY"];

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

// ============================================================================
// Echo Mode
// ============================================================================

/// Which parsed records the gateway returns to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EchoMode {
    /// Only the first record, always flagged as an assignment.
    /// This is the wire contract browser clients were written against.
    #[default]
    FirstAsAssignment,
    /// Every record with the flag the model gave it
    AllRecords,
}

impl EchoMode {
    pub fn apply(self, records: Vec<SolveResultRecord>) -> Vec<SolveResultRecord> {
        match self {
            EchoMode::FirstAsAssignment => records
                .into_iter()
                .take(1)
                .map(|r| SolveResultRecord {
                    is_assignment: true,
                    ..r
                })
                .collect(),
            EchoMode::AllRecords => records,
        }
    }
}

impl FromStr for EchoMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(EchoMode::FirstAsAssignment),
            "all" => Ok(EchoMode::AllRecords),
            other => Err(Error::config_invalid(
                "MATHPAD_ECHO_MODE",
                format!("unknown echo mode '{}', expected 'first' or 'all'", other),
            )),
        }
    }
}

// ============================================================================
// Solver Configuration
// ============================================================================

/// How the solver talks to the model
#[derive(Debug, Clone)]
pub struct SolverConfig {
    /// Budget for one model attempt
    pub timeout: Duration,
    /// Extra attempts after a retryable failure
    pub max_retries: u32,
    pub retry_backoff: Duration,
    /// Ask the model for schema-constrained JSON
    pub structured_output: bool,
    /// Sampling temperature; the model's own default when unset
    pub temperature: Option<f32>,
    pub echo_mode: EchoMode,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 1,
            retry_backoff: Duration::from_millis(500),
            structured_output: true,
            temperature: None,
            echo_mode: EchoMode::default(),
        }
    }
}

impl SolverConfig {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retries(mut self, max_retries: u32, backoff: Duration) -> Self {
        self.max_retries = max_retries;
        self.retry_backoff = backoff;
        self
    }

    pub fn with_structured_output(mut self, enabled: bool) -> Self {
        self.structured_output = enabled;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_echo_mode(mut self, mode: EchoMode) -> Self {
        self.echo_mode = mode;
        self
    }
}

// ============================================================================
// Gateway Configuration
// ============================================================================

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub bind: SocketAddr,
    pub provider: ProviderConfig,
    pub solver: SolverConfig,
}

impl GatewayConfig {
    /// Read the configuration from the process environment.
    ///
    /// | variable                    | default                 |
    /// |-----------------------------|-------------------------|
    /// | `GOOGLE_GEMI_API` / `GEMINI_API_KEY` | required       |
    /// | `MATHPAD_BIND`              | `127.0.0.1:3000`        |
    /// | `MATHPAD_MODEL`             | `gemini-1.5-flash`      |
    /// | `MATHPAD_BASE_URL`          | Gemini v1beta endpoint  |
    /// | `MATHPAD_TIMEOUT_SECS`      | `30`                    |
    /// | `MATHPAD_MAX_RETRIES`       | `1`                     |
    /// | `MATHPAD_STRUCTURED_OUTPUT` | `true`                  |
    /// | `MATHPAD_TEMPERATURE`       | model default           |
    /// | `MATHPAD_ECHO_MODE`         | `first`                 |
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`GatewayConfig::from_env`] with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let api_key = API_KEY_VARS
            .iter()
            .find_map(|key| get(*key))
            .ok_or_else(|| {
                Error::config_invalid(
                    API_KEY_VARS[0],
                    format!("model credential is not set (tried {})", API_KEY_VARS.join(", ")),
                )
                .with_operation("config::from_env")
            })?;

        let bind = parse_var("MATHPAD_BIND", get("MATHPAD_BIND"), DEFAULT_BIND.parse().ok())?;
        let timeout_secs = parse_var("MATHPAD_TIMEOUT_SECS", get("MATHPAD_TIMEOUT_SECS"), Some(30u64))?;
        let max_retries = parse_var("MATHPAD_MAX_RETRIES", get("MATHPAD_MAX_RETRIES"), Some(1u32))?;
        let structured_output = parse_var(
            "MATHPAD_STRUCTURED_OUTPUT",
            get("MATHPAD_STRUCTURED_OUTPUT"),
            Some(true),
        )?;
        let temperature = match get("MATHPAD_TEMPERATURE") {
            Some(raw) => Some(parse_var::<f32>("MATHPAD_TEMPERATURE", Some(raw), None)?),
            None => None,
        };
        let echo_mode = match get("MATHPAD_ECHO_MODE") {
            Some(raw) => raw.parse()?,
            None => EchoMode::default(),
        };

        let mut provider = ProviderConfig::gemini(api_key)
            .with_model(get("MATHPAD_MODEL").unwrap_or_else(|| gemini::DEFAULT_MODEL.to_string()))
            .with_timeout(timeout_secs);
        if let Some(base_url) = get("MATHPAD_BASE_URL") {
            provider = provider.with_base_url(base_url);
        }

        let mut solver = SolverConfig::default()
            .with_timeout(Duration::from_secs(timeout_secs))
            .with_retries(max_retries, SolverConfig::default().retry_backoff)
            .with_structured_output(structured_output)
            .with_echo_mode(echo_mode);
        if let Some(temperature) = temperature {
            solver = solver.with_temperature(temperature);
        }

        Ok(Self {
            bind,
            provider,
            solver,
        })
    }
}

fn parse_var<T: FromStr>(key: &'static str, raw: Option<String>, default: Option<T>) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match raw {
        Some(raw) => raw.parse::<T>().map_err(|e| {
            Error::config_invalid(key, format!("invalid value '{}': {}", raw, e))
                .with_operation("config::from_env")
        }),
        None => default.ok_or_else(|| Error::config_invalid(key, "no value and no default")),
    }
}
