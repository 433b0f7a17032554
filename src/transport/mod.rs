//! Wire envelopes shared by the stdio and HTTP entry points.
//!
//! A request is `{"id"?, "type", "args"?, "format"?}`; the reply is
//! `{"id"?, "ok", "output"? | "error"?}`. On stdio a `{"cancel": id}` line
//! cancels an in-flight request.

pub mod stdio;

use serde::{Deserialize, Serialize};

use crate::error::{Error, ErrorKind, Result};
use crate::types::{FormatKind, HandlerArgs, RenderedOutput, Request};

/// Format used when an envelope does not name one.
pub const DEFAULT_WIRE_FORMAT: FormatKind = FormatKind::Json;

/// Request ID (can be string or number).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(untagged)]
pub enum RequestId {
    String(String),
    Number(i64),
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::String(s) => f.write_str(s),
            Self::Number(n) => write!(f, "{}", n),
        }
    }
}

/// A dispatch request on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispatchEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    #[serde(rename = "type")]
    pub request_type: String,
    #[serde(default)]
    pub args: HandlerArgs,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
}

impl DispatchEnvelope {
    /// The requested format, or [`DEFAULT_WIRE_FORMAT`].
    pub fn format_kind(&self) -> Result<FormatKind> {
        match &self.format {
            Some(format) => format.parse(),
            None => Ok(DEFAULT_WIRE_FORMAT),
        }
    }

    /// Split into the reply id and the request.
    pub fn into_request(self) -> (Option<RequestId>, Request) {
        let request = Request {
            request_type: self.request_type,
            args: self.args,
        };
        (self.id, request)
    }
}

/// Error details returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub kind: ErrorKind,
    pub message: String,
    /// Kind of the underlying error when a handler failed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<ErrorKind>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_type: Option<String>,
}

impl From<&Error> for ErrorPayload {
    fn from(error: &Error) -> Self {
        let kind = error.kind();
        let root = error.root_cause().kind();
        Self {
            kind,
            message: error.to_string(),
            cause: (root != kind).then_some(root),
            request_type: error.request_type().map(String::from),
        }
    }
}

/// Reply to one envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<RequestId>,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<RenderedOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorPayload>,
}

impl DispatchResponse {
    pub fn success(id: Option<RequestId>, output: RenderedOutput) -> Self {
        Self {
            id,
            ok: true,
            output: Some(output),
            error: None,
        }
    }

    pub fn failure(id: Option<RequestId>, error: &Error) -> Self {
        Self {
            id,
            ok: false,
            output: None,
            error: Some(ErrorPayload::from(error)),
        }
    }

    pub fn from_result(id: Option<RequestId>, result: Result<RenderedOutput>) -> Self {
        match result {
            Ok(output) => Self::success(id, output),
            Err(e) => Self::failure(id, &e),
        }
    }
}
