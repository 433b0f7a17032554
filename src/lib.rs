//! jade-assist - request orchestration for developer assistance.
//!
//! A request names a handler and carries arguments; the handler retrieves
//! code context, ranks it and renders it in the format the caller asked for.
//!
//! # Architecture
//!
//! The pipeline has four stages, leaf-first:
//!
//! 1. **Scanner** (`scanner`) - Concurrent semantic-index and filesystem
//!    lookups, merged and deduplicated, with per-source timeouts
//! 2. **Scorer** (`scorer`) - Pure, deterministic ranking under versioned `Criteria`
//! 3. **Presenter** (`presenter`) - Markdown, JSON or terminal rendering
//! 4. **Dispatcher** (`dispatcher`) - Routes `request.type` to a registered handler
//!
//! Around the pipeline:
//!
//! - `handlers` - Built-in handlers and YAML-defined preset searches
//! - `transport` / `http` - Line-delimited JSON on stdio and an HTTP API
//! - `config` - Command-line and environment configuration
//!
//! # Example
//!
//! ```no_run
//! use jade_assist::config::Config;
//! use jade_assist::dispatcher::Dispatcher;
//! use jade_assist::types::{FormatKind, Request};
//!
//! # async fn run() -> jade_assist::Result<()> {
//! let dispatcher = Dispatcher::from_config(&Config::default()).await?;
//! let request = Request::new("context_search").with_arg("query", "load config");
//! let output = dispatcher.dispatch(request, FormatKind::Terminal).await?;
//! println!("{}", output.payload);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod dispatcher;
pub mod error;
pub mod handlers;
pub mod http;
pub mod presenter;
pub mod scanner;
pub mod scorer;
pub mod transport;
pub mod types;

pub use error::{Error, Result};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Maximum file size searched by default (1MB)
pub const MAX_FILE_SIZE: usize = 1024 * 1024;
