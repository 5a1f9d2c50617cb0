//! Domain-level error type shared by every driving port.
//!
//! The error is transport agnostic. The HTTP adapter maps [`ErrorCode`] to a
//! status code; other adapters can use [`ErrorCode::rpc_status`] or their own
//! mapping. Errors built inside a request scope capture the active
//! [`TraceId`] so responses and logs can be correlated.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::TraceId;

/// Stable machine-readable error code describing the failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    /// The requested user does not exist.
    NotFound,
    /// Another execution currently holds the idempotency lock for this key.
    AlreadyInProgress,
    /// The request failed validation.
    InvalidRequest,
    /// The entity could not be assembled (identifier generation failed).
    BuildFailed,
    /// Persistence or an unexpected dependency failure.
    InternalError,
}

impl ErrorCode {
    /// Canonical RPC status name for adapters speaking a status-code protocol.
    #[must_use]
    pub const fn rpc_status(self) -> &'static str {
        match self {
            Self::NotFound => "NOT_FOUND",
            Self::AlreadyInProgress => "ABORTED",
            Self::InvalidRequest => "INVALID_ARGUMENT",
            Self::BuildFailed | Self::InternalError => "INTERNAL",
        }
    }
}

/// Domain error payload.
///
/// Serialises as `{"error": "<message>", "code": "<code>"}` with an optional
/// `trace_id`.
///
/// # Examples
/// ```
/// use user_service::domain::{Error, ErrorCode};
///
/// let err = Error::not_found("user not found");
/// assert_eq!(err.code(), ErrorCode::NotFound);
/// assert_eq!(err.message(), "user not found");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Error {
    #[serde(rename = "error")]
    #[schema(example = "user not found")]
    message: String,
    #[schema(example = "not_found")]
    code: ErrorCode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    trace_id: Option<String>,
}

impl Error {
    /// Create an error, capturing the trace identifier in scope (if any).
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            code,
            trace_id: TraceId::current().map(|id| id.to_string()),
        }
    }

    /// Stable machine-readable error code.
    #[must_use]
    pub fn code(&self) -> ErrorCode {
        self.code
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Correlation identifier captured when the error was created.
    #[must_use]
    pub fn trace_id(&self) -> Option<&str> {
        self.trace_id.as_deref()
    }

    /// Replace the trace identifier.
    #[must_use]
    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    /// Convenience constructor for [`ErrorCode::NotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    /// Convenience constructor for [`ErrorCode::AlreadyInProgress`].
    pub fn already_in_progress(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::AlreadyInProgress, message)
    }

    /// Convenience constructor for [`ErrorCode::InvalidRequest`].
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidRequest, message)
    }

    /// Convenience constructor for [`ErrorCode::BuildFailed`].
    pub fn build_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BuildFailed, message)
    }

    /// Convenience constructor for [`ErrorCode::InternalError`].
    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for Error {}
