//! # Wire Schema
//!
//! Request/response types shared by the gateway and its clients.
//!
//! Field names on the wire follow the browser client: `dictOfVars` for the
//! variable map, `expr`/`result`/`assign` for result records.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

/// Message carried by every success envelope
pub const SUCCESS_MESSAGE: &str = "Successfully processed image and prompt.";

/// Message carried by error envelopes for server-side failures
pub const GENERIC_FAILURE: &str = "Failed to process image or prompt.";

// ============================================================================
// Variable Map
// ============================================================================

/// User-assigned variables and their last known values.
///
/// Keys are unique and ordered, so serializing the map is deterministic.
/// Values that arrive as JSON numbers or booleans are stored as strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct VariableMap(BTreeMap<String, String>);

impl VariableMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set `name` to `value`, replacing any earlier value
    pub fn assign(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.0.insert(name.into(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Compact JSON object form, as interpolated into the prompt
    pub fn to_json(&self) -> String {
        serde_json::to_string(&self.0).unwrap_or_else(|_| "{}".to_string())
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for VariableMap {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<'de> Deserialize<'de> for VariableMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<BTreeMap<String, serde_json::Value>>::deserialize(deserializer)?;
        Ok(raw
            .unwrap_or_default()
            .into_iter()
            .map(|(k, v)| (k, scalar_to_string(v)))
            .collect())
    }
}

// ============================================================================
// Request / Records
// ============================================================================

/// One solve action: a canvas snapshot plus the variables known so far
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolveRequest {
    /// Data URI or bare base64 PNG. Optional so that a missing payload can be
    /// reported as invalid input instead of a decode failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(rename = "dictOfVars", default)]
    pub variables: VariableMap,
}

impl SolveRequest {
    pub fn new(image: impl Into<String>, variables: VariableMap) -> Self {
        Self {
            image: Some(image.into()),
            variables,
        }
    }
}

/// One expression/result pair produced by the model
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveResultRecord {
    #[serde(rename = "expr", deserialize_with = "deserialize_scalar")]
    pub expression: String,
    #[serde(deserialize_with = "deserialize_scalar")]
    pub result: String,
    #[serde(rename = "assign", default, deserialize_with = "deserialize_flag")]
    pub is_assignment: bool,
}

impl SolveResultRecord {
    pub fn new(expression: impl Into<String>, result: impl Into<String>) -> Self {
        Self {
            expression: expression.into(),
            result: result.into(),
            is_assignment: false,
        }
    }

    pub fn assignment(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            is_assignment: true,
            ..Self::new(name, value)
        }
    }
}

// ============================================================================
// Envelopes
// ============================================================================

/// Body of a 200 response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveResponse {
    pub message: String,
    /// Clients must not assume this is present
    #[serde(default)]
    pub data: Vec<SolveResultRecord>,
    pub status: String,
}

impl SolveResponse {
    pub fn success(data: Vec<SolveResultRecord>) -> Self {
        Self {
            message: SUCCESS_MESSAGE.to_string(),
            data,
            status: "success".to_string(),
        }
    }
}

/// Body of every non-200 response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    #[serde(default)]
    pub code: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            code: code.into(),
        }
    }
}

// ============================================================================
// Lenient scalars
// ============================================================================

/// Render a JSON scalar the way it would read on the canvas
pub fn scalar_to_string(value: serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s,
        serde_json::Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn deserialize_scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    serde_json::Value::deserialize(deserializer).map(scalar_to_string)
}

fn deserialize_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    use serde::de::Error as _;

    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Bool(b) => Ok(b),
        serde_json::Value::Null => Ok(false),
        serde_json::Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(true),
        serde_json::Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(false),
        other => Err(D::Error::custom(format!("invalid assign flag: {}", other))),
    }
}
