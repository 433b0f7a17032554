//! Error types for the jade-assist pipeline.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the pipeline and its entry points.
#[derive(Error, Debug)]
pub enum Error {
    // ===== Pipeline Errors =====
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Scan unavailable: semantic index: {semantic}; filesystem search: {filesystem}")]
    ScanUnavailable { semantic: String, filesystem: String },

    #[error("Unsupported format: '{0}' (expected markdown, json or terminal)")]
    UnsupportedFormat(String),

    #[error("Invalid criteria: {0}")]
    InvalidCriteria(String),

    // ===== Dispatch Errors =====
    #[error("Unknown handler: {0}")]
    UnknownHandler(String),

    #[error("Handler '{request_type}' failed: {source}")]
    HandlerFailure {
        request_type: String,
        #[source]
        source: Box<Error>,
    },

    #[error("Invalid handler arguments: {0}")]
    InvalidArguments(String),

    #[error("Invalid handler definition: {0}")]
    InvalidHandlerDefinition(String),

    #[error("Duplicate handler: {0}")]
    DuplicateHandler(String),

    // ===== Collaborator Errors =====
    #[error("Semantic index error: {status} {status_text} - {message}")]
    Api {
        status: u16,
        status_text: String,
        message: String,
    },

    #[error("Workspace not found: {0}")]
    WorkspaceNotFound(String),

    // ===== I/O Errors =====
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // ===== HTTP Errors =====
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP server error: {0}")]
    HttpServer(String),

    // ===== Internal Errors =====
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Timeout: {operation} timed out after {millis} ms")]
    Timeout { operation: String, millis: u64 },

    #[error("Cancelled: operation was cancelled")]
    Cancelled,
}

/// Discriminant reported to callers alongside the error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidQuery,
    ScanUnavailable,
    UnsupportedFormat,
    UnknownHandler,
    HandlerFailure,
    InvalidArguments,
    Cancelled,
    Internal,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InvalidQuery => "invalid_query",
            Self::ScanUnavailable => "scan_unavailable",
            Self::UnsupportedFormat => "unsupported_format",
            Self::UnknownHandler => "unknown_handler",
            Self::HandlerFailure => "handler_failure",
            Self::InvalidArguments => "invalid_arguments",
            Self::Cancelled => "cancelled",
            Self::Internal => "internal",
        }
    }

    /// Whether the caller sent something the pipeline cannot act on.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidQuery | Self::UnsupportedFormat | Self::UnknownHandler | Self::InvalidArguments
        )
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    /// Create an API error from HTTP response details.
    pub fn api(status: u16, status_text: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            status,
            status_text: status_text.into(),
            message: message.into(),
        }
    }

    /// Wrap an error raised inside a handler with the request type that selected it.
    pub fn handler_failure(request_type: impl Into<String>, source: Error) -> Self {
        Self::HandlerFailure {
            request_type: request_type.into(),
            source: Box::new(source),
        }
    }

    /// Create a timeout error for a named operation.
    pub fn timeout(operation: impl Into<String>, duration: std::time::Duration) -> Self {
        Self::Timeout {
            operation: operation.into(),
            millis: duration.as_millis() as u64,
        }
    }

    /// The taxonomy kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidQuery(_) => ErrorKind::InvalidQuery,
            Self::ScanUnavailable { .. } => ErrorKind::ScanUnavailable,
            Self::UnsupportedFormat(_) => ErrorKind::UnsupportedFormat,
            Self::UnknownHandler(_) => ErrorKind::UnknownHandler,
            Self::HandlerFailure { .. } => ErrorKind::HandlerFailure,
            Self::InvalidArguments(_) | Self::InvalidCriteria(_) | Self::Config(_) => {
                ErrorKind::InvalidArguments
            }
            Self::Cancelled => ErrorKind::Cancelled,
            _ => ErrorKind::Internal,
        }
    }

    /// The request type a handler failure is annotated with.
    pub fn request_type(&self) -> Option<&str> {
        match self {
            Self::HandlerFailure { request_type, .. } => Some(request_type),
            _ => None,
        }
    }

    /// The innermost error, looking through handler annotations.
    pub fn root_cause(&self) -> &Error {
        match self {
            Self::HandlerFailure { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// Check if this error is retriable (transient failures).
    pub fn is_retriable(&self) -> bool {
        match self {
            Self::Api { status, .. } => *status == 429 || *status == 499 || (500..600).contains(status),
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            _ => false,
        }
    }
}
