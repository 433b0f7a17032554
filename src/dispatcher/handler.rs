//! Handler trait and argument helpers.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::dispatcher::ExecutionContext;
use crate::error::{Error, Result};
use crate::types::{HandlerArgs, RenderedOutput};

/// Outcome of one dispatch.
pub type HandlerResult = Result<RenderedOutput>;

/// A named request handler.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Name matched against `request.type`.
    fn name(&self) -> &str;

    /// One-line description shown in handler listings.
    fn description(&self) -> &str;

    /// Handle a request with its own execution context.
    async fn handle(&self, args: &HandlerArgs, context: ExecutionContext) -> HandlerResult;
}

/// Helper to extract a required string argument.
pub fn get_string_arg(args: &HandlerArgs, name: &str) -> Result<String> {
    args.get(name)
        .and_then(|v| v.as_str())
        .map(String::from)
        .ok_or_else(|| Error::InvalidArguments(format!("Missing required argument: {}", name)))
}

/// Helper to extract an optional string argument.
pub fn get_optional_string_arg(args: &HandlerArgs, name: &str) -> Option<String> {
    args.get(name).and_then(|v| v.as_str()).map(String::from)
}

/// Helper to extract an optional non-negative integer argument.
pub fn get_optional_usize_arg(args: &HandlerArgs, name: &str) -> Result<Option<usize>> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .map(|v| Some(v as usize))
            .ok_or_else(|| {
                Error::InvalidArguments(format!(
                    "Argument {} must be a non-negative integer",
                    name
                ))
            }),
    }
}

/// Helper to extract a string array argument. A single string is accepted
/// as a one-element array.
pub fn get_string_array_arg(args: &HandlerArgs, name: &str) -> Result<Vec<String>> {
    match args.get(name) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| {
                v.as_str().map(String::from).ok_or_else(|| {
                    Error::InvalidArguments(format!("Argument {} must contain only strings", name))
                })
            })
            .collect(),
        Some(_) => Err(Error::InvalidArguments(format!(
            "Argument {} must be a string array",
            name
        ))),
    }
}

/// Helper to deserialize a structured argument.
pub fn get_typed_arg<T: DeserializeOwned>(args: &HandlerArgs, name: &str) -> Result<T> {
    let value = args
        .get(name)
        .cloned()
        .ok_or_else(|| Error::InvalidArguments(format!("Missing required argument: {}", name)))?;
    serde_json::from_value(value)
        .map_err(|e| Error::InvalidArguments(format!("Invalid argument {}: {}", name, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> HandlerArgs {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_get_string_arg() {
        let args = args(json!({"name": "value", "count": 3}));

        assert_eq!(get_string_arg(&args, "name").unwrap(), "value");
        assert!(matches!(
            get_string_arg(&args, "missing"),
            Err(Error::InvalidArguments(_))
        ));
        assert!(get_string_arg(&args, "count").is_err());
        assert_eq!(get_optional_string_arg(&args, "missing"), None);
    }

    #[test]
    fn test_get_optional_usize_arg() {
        let args = args(json!({"n": 5, "neg": -1, "null": null}));

        assert_eq!(get_optional_usize_arg(&args, "n").unwrap(), Some(5));
        assert_eq!(get_optional_usize_arg(&args, "missing").unwrap(), None);
        assert_eq!(get_optional_usize_arg(&args, "null").unwrap(), None);
        assert!(get_optional_usize_arg(&args, "neg").is_err());
    }

    #[test]
    fn test_get_string_array_arg() {
        let args = args(json!({
            "many": ["a", "b"],
            "one": "c",
            "mixed": ["a", 1],
            "bad": {"a": 1}
        }));

        assert_eq!(get_string_array_arg(&args, "many").unwrap(), vec!["a", "b"]);
        assert_eq!(get_string_array_arg(&args, "one").unwrap(), vec!["c"]);
        assert!(get_string_array_arg(&args, "missing").unwrap().is_empty());
        assert!(get_string_array_arg(&args, "mixed").is_err());
        assert!(get_string_array_arg(&args, "bad").is_err());
    }

    #[test]
    fn test_get_typed_arg() {
        let args = args(json!({"pair": [1, 2]}));

        let pair: (u8, u8) = get_typed_arg(&args, "pair").unwrap();
        assert_eq!(pair, (1, 2));
        assert!(get_typed_arg::<String>(&args, "pair").is_err());
        assert!(get_typed_arg::<String>(&args, "missing").is_err());
    }
}
