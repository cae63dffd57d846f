//! # MathPad Gateway
//!
//! A stateless HTTP service that solves hand-drawn math.
//!
//! ## Core Concepts
//! - **Schema**: wire types (`SolveRequest`, `SolveResultRecord`, envelopes)
//! - **Prompt**: the fixed five-case instruction with the variable map inlined
//! - **Provider**: trait-based vision model access (Gemini, scripted)
//! - **Reply**: tolerant decoding of the model's text into records
//! - **Solver**: validation, timeout and retry around one model call
//! - **Handler**: axum routes and the envelope contract

pub mod error;
pub mod schema;
pub mod prompt;
pub mod reply;
pub mod provider;
pub mod config;
pub mod solver;
pub mod handler;

pub use error::{Error, ErrorKind, ErrorStatus, Result};
pub use schema::{
    ErrorResponse, SolveRequest, SolveResponse, SolveResultRecord, VariableMap,
    GENERIC_FAILURE, SUCCESS_MESSAGE,
};
pub use prompt::{build_prompt, response_schema};
pub use reply::parse_reply;
pub use provider::{
    FinishReason, GeminiProvider, GenerateRequest, GenerateResponse, InlineImage,
    ProviderConfig, ProviderError, ScriptedModel, Usage, VisionModel,
};
pub use config::{EchoMode, GatewayConfig, SolverConfig};
pub use solver::Solver;
pub use handler::{router, serve, SOLVE_PATH};
