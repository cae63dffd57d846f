//! # mathpad-error
//!
//! Unified error handling for MathPad.
//!
//! ## Design Philosophy
//!
//! - **ErrorKind**: Know what went wrong (e.g., InvalidInput, ParseFailed)
//! - **ErrorStatus**: Decide how to handle it (Permanent, Temporary, Persistent)
//! - **Error Context**: Key-value pairs that help locate the cause
//! - **Error Source**: Wrap underlying errors without leaking raw types
//!
//! ## Usage
//!
//! ```rust
//! use mathpad_error::{Error, ErrorKind};
//!
//! fn example() -> Result<(), Error> {
//!     Err(Error::new(ErrorKind::InvalidInput, "request is missing an image payload")
//!         .with_operation("solver::solve")
//!         .with_context("field", "image"))
//! }
//! ```
//!
//! ## Principles
//!
//! - All functions return `Result<T, mathpad_error::Error>`
//! - External errors are wrapped with `set_source(err)`
//! - Same error handled once, subsequent ops only append context
//! - Every kind maps to one stable wire code (see [`ErrorKind::code`])

mod error;
mod kind;
mod status;

pub use error::Error;
pub use kind::ErrorKind;
pub use status::ErrorStatus;

/// Result type alias using the MathPad Error
pub type Result<T> = std::result::Result<T, Error>;
