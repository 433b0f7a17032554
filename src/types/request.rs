//! Request types accepted by the dispatcher.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// Arguments passed to a handler.
pub type HandlerArgs = HashMap<String, Value>;

/// A request for a registered handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Handler selector
    #[serde(rename = "type")]
    pub request_type: String,
    /// Handler arguments
    #[serde(default)]
    pub args: HandlerArgs,
}

impl Request {
    /// Create a request with no arguments.
    pub fn new(request_type: impl Into<String>) -> Self {
        Self {
            request_type: request_type.into(),
            args: HashMap::new(),
        }
    }

    /// Add an argument.
    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.args.insert(name.into(), value.into());
        self
    }
}
