//! Core type definitions shared by the pipeline stages.
//!
//! Everything here is plain data: created within one request and dropped
//! when the dispatcher returns.

pub mod matches;
pub mod output;
pub mod request;

#[cfg(test)]
pub(crate) mod strategies;

// Re-export commonly used types
pub use matches::*;
pub use output::*;
pub use request::*;
