use crate::{ErrorKind, ErrorStatus};
use std::fmt;

/// The error every MathPad operation returns.
///
/// Besides its [`ErrorKind`] an error records where it happened
/// (`operation`), debugging breadcrumbs (`context`), whether retrying can
/// help (`status`) and, optionally, the foreign error it wraps.
///
/// ```rust
/// use mathpad_error::{Error, ErrorKind, ErrorStatus};
///
/// let err = Error::new(ErrorKind::NetworkFailed, "connection reset")
///     .with_operation("gemini::generate")
///     .with_context("model", "gemini-1.5-flash");
///
/// assert_eq!(err.status(), ErrorStatus::Temporary);
/// assert_eq!(err.code(), "UPSTREAM_ERROR");
/// ```
pub struct Error {
    kind: ErrorKind,
    message: String,
    status: ErrorStatus,
    operation: &'static str,
    context: Vec<(&'static str, String)>,
    source: Option<anyhow::Error>,
}

impl Error {
    /// The status starts out as whatever the kind implies.
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: match kind.is_retryable() {
                true => ErrorStatus::Temporary,
                false => ErrorStatus::Permanent,
            },
            operation: "",
            context: Vec::new(),
            source: None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn status(&self) -> ErrorStatus {
        self.status
    }

    pub fn operation(&self) -> &'static str {
        self.operation
    }

    pub fn context(&self) -> &[(&'static str, String)] {
        &self.context
    }

    /// Code sent to clients in the error envelope
    pub fn code(&self) -> &'static str {
        self.kind.code()
    }

    pub fn is_retryable(&self) -> bool {
        self.status.is_retryable()
    }

    /// Record the operation in progress. An operation set earlier is kept in
    /// the context under `called`, so the chain of callers survives.
    pub fn with_operation(mut self, operation: &'static str) -> Self {
        if !self.operation.is_empty() {
            let inner = std::mem::replace(&mut self.operation, operation);
            self.context.push(("called", inner.to_string()));
        } else {
            self.operation = operation;
        }
        self
    }

    pub fn with_context(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.context.push((key, value.into()));
        self
    }

    /// Attach the underlying error. Only one source is kept; setting a
    /// second one is a bug and trips a debug assertion.
    pub fn set_source(mut self, source: impl Into<anyhow::Error>) -> Self {
        debug_assert!(self.source.is_none(), "source already set on {}", self.kind);
        self.source = Some(source.into());
        self
    }

    pub fn temporary(mut self) -> Self {
        self.status = ErrorStatus::Temporary;
        self
    }

    pub fn permanent(mut self) -> Self {
        self.status = ErrorStatus::Permanent;
        self
    }

    /// Retries ran out; see [`ErrorStatus::persist`]
    pub fn persist(mut self) -> Self {
        self.status = self.status.persist();
        self
    }
}

// One line, suitable for `tracing` fields:
// `ParseFailed at reply::parse (permanent): reply is not a list [preview=...]`
impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kind)?;
        if !self.operation.is_empty() {
            write!(f, " at {}", self.operation)?;
        }
        write!(f, " ({})", self.status)?;
        if !self.message.is_empty() {
            write!(f, ": {}", self.message)?;
        }

        let mut pairs = self.context.iter();
        if let Some((key, value)) = pairs.next() {
            write!(f, " [{}={}", key, value)?;
            for (key, value) in pairs {
                write!(f, ", {}={}", key, value)?;
            }
            write!(f, "]")?;
        }
        Ok(())
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct("Error");
        out.field("kind", &self.kind)
            .field("status", &self.status)
            .field("operation", &self.operation)
            .field("message", &self.message);
        if !self.context.is_empty() {
            out.field("context", &self.context);
        }
        if let Some(source) = &self.source {
            out.field("source", &format_args!("{:#}", source));
        }
        out.finish()
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let kind = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorKind::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorKind::PermissionDenied,
            _ => ErrorKind::IoFailed,
        };
        Error::new(kind, err.to_string()).with_operation("io").set_source(err)
    }
}

impl Error {
    pub fn unexpected(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unexpected, message)
    }

    /// `setting` names the variable or flag that was wrong
    pub fn config_invalid(setting: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::new(ErrorKind::ConfigInvalid, reason).with_context("setting", setting)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn solve_in_flight() -> Self {
        Self::new(ErrorKind::SolveInFlight, "a solve request is already outstanding")
    }

    pub fn upstream_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UpstreamFailed, message)
    }

    pub fn timeout(after_ms: u128) -> Self {
        Self::new(ErrorKind::Timeout, format!("timed out after {}ms", after_ms))
            .with_context("timeout_ms", after_ms.to_string())
    }

    pub fn parse_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ParseFailed, message)
    }

    pub fn serialization_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::SerializationFailed, message)
    }
}
