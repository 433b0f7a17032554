//! Configuration management for jade-assist.
//!
//! Every setting can come from the command line or a `JADE_*` environment
//! variable (a `.env` file in the working directory is loaded first).

use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::scanner::ScanOptions;
use crate::MAX_FILE_SIZE;

/// Default per-request timeout for the semantic index.
pub const DEFAULT_SEMANTIC_TIMEOUT_MS: u64 = 3_000;

/// Default per-request timeout for the filesystem search.
pub const DEFAULT_FILESYSTEM_TIMEOUT_MS: u64 = 5_000;

/// Command-line arguments for jade-assist.
#[derive(Parser, Debug, Clone)]
#[command(name = "jade-assist")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Retrieve, rank and render code context for developer-assistance requests")]
pub struct Args {
    /// Request type to dispatch (once mode), e.g. context_search
    #[arg(value_name = "TYPE")]
    pub request_type: Option<String>,

    /// Query text, added to the request arguments as `query`
    #[arg(short, long)]
    pub query: Option<String>,

    /// Request arguments as a JSON object
    #[arg(short, long, value_name = "JSON")]
    pub args: Option<String>,

    /// Output format: markdown, json or terminal
    #[arg(short, long, default_value = "markdown", env = "JADE_FORMAT")]
    pub format: String,

    /// Print the registered handlers and exit
    #[arg(long)]
    pub list_handlers: bool,

    /// Run mode: once, stdio or http
    #[arg(short, long, default_value = "once", env = "JADE_MODE")]
    pub mode: Mode,

    /// Workspace root directory
    #[arg(short, long, env = "JADE_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// HTTP port (only for http mode)
    #[arg(short, long, default_value = "3000", env = "JADE_PORT")]
    pub port: u16,

    /// Enable debug logging
    #[arg(short, long, env = "JADE_DEBUG")]
    pub debug: bool,

    /// Log output format
    #[arg(long, default_value = "text", env = "JADE_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Semantic index service URL (filesystem-only when unset)
    #[arg(long, env = "JADE_SEMANTIC_URL")]
    pub semantic_url: Option<String>,

    /// Bearer token for the semantic index service
    #[arg(long, env = "JADE_SEMANTIC_API_KEY", hide_env_values = true)]
    pub semantic_api_key: Option<String>,

    /// Semantic index timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_SEMANTIC_TIMEOUT_MS, env = "JADE_SEMANTIC_TIMEOUT_MS")]
    pub semantic_timeout_ms: u64,

    /// Filesystem search timeout in milliseconds
    #[arg(long, default_value_t = DEFAULT_FILESYSTEM_TIMEOUT_MS, env = "JADE_FILESYSTEM_TIMEOUT_MS")]
    pub filesystem_timeout_ms: u64,

    /// Maximum hits requested from each source
    #[arg(long, env = "JADE_PER_SOURCE_LIMIT")]
    pub per_source_limit: Option<usize>,

    /// Maximum file size searched (bytes)
    #[arg(long, default_value_t = MAX_FILE_SIZE, env = "JADE_MAX_FILE_SIZE")]
    pub max_file_size: usize,

    /// Directory of YAML handler definitions [default: ~/.jade/handlers]
    #[arg(long, env = "JADE_HANDLERS_DIR")]
    pub handlers_dir: Option<PathBuf>,

    /// Maximum concurrent HTTP requests
    #[arg(long, default_value = "64", env = "JADE_MAX_CONCURRENT_REQUESTS")]
    pub max_concurrent_requests: usize,
}

/// Run mode.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Dispatch one request from the command line
    #[default]
    Once,
    /// Line-delimited JSON requests on stdin
    Stdio,
    /// HTTP server
    Http,
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Default handler definitions directory.
pub fn default_handlers_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".jade").join("handlers"))
}

/// Runtime configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Workspace root directory
    pub workspace: PathBuf,
    /// Run mode
    pub mode: Mode,
    /// HTTP port
    pub port: u16,
    /// Debug mode
    pub debug: bool,
    /// Log output format
    pub log_format: LogFormat,
    /// Semantic index URL
    pub semantic_url: Option<String>,
    /// Semantic index token
    #[serde(skip_serializing)]
    pub semantic_api_key: Option<String>,
    /// Semantic index timeout (ms)
    pub semantic_timeout_ms: u64,
    /// Filesystem search timeout (ms)
    pub filesystem_timeout_ms: u64,
    /// Hits requested per source
    pub per_source_limit: Option<usize>,
    /// Maximum file size
    pub max_file_size: usize,
    /// Handler definitions directory
    pub handlers_dir: Option<PathBuf>,
    /// HTTP concurrency limit
    pub max_concurrent_requests: usize,
}

impl TryFrom<&Args> for Config {
    type Error = Error;

    fn try_from(args: &Args) -> Result<Self> {
        let workspace = match &args.workspace {
            Some(path) => path.clone(),
            None => std::env::current_dir()
                .map_err(|e| Error::Config(format!("Failed to get current directory: {}", e)))?,
        };

        let config = Self {
            workspace,
            mode: args.mode,
            port: args.port,
            debug: args.debug,
            log_format: args.log_format,
            semantic_url: args.semantic_url.clone().filter(|u| !u.trim().is_empty()),
            semantic_api_key: args.semantic_api_key.clone(),
            semantic_timeout_ms: args.semantic_timeout_ms,
            filesystem_timeout_ms: args.filesystem_timeout_ms,
            per_source_limit: args.per_source_limit,
            max_file_size: args.max_file_size,
            handlers_dir: args.handlers_dir.clone().or_else(default_handlers_dir),
            max_concurrent_requests: args.max_concurrent_requests,
        };
        config.validate()?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            workspace: PathBuf::from("."),
            mode: Mode::Once,
            port: 3000,
            debug: false,
            log_format: LogFormat::Text,
            semantic_url: None,
            semantic_api_key: None,
            semantic_timeout_ms: DEFAULT_SEMANTIC_TIMEOUT_MS,
            filesystem_timeout_ms: DEFAULT_FILESYSTEM_TIMEOUT_MS,
            per_source_limit: None,
            max_file_size: MAX_FILE_SIZE,
            handlers_dir: None,
            max_concurrent_requests: 64,
        }
    }
}

impl Config {
    /// Check settings that clap cannot.
    pub fn validate(&self) -> Result<()> {
        if self.semantic_timeout_ms == 0 {
            return Err(Error::Config(
                "semantic timeout must be greater than zero".to_string(),
            ));
        }
        if self.filesystem_timeout_ms == 0 {
            return Err(Error::Config(
                "filesystem timeout must be greater than zero".to_string(),
            ));
        }
        if self.max_concurrent_requests == 0 {
            return Err(Error::Config(
                "max concurrent requests must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Base scan options shared by every request.
    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions::new(
            Duration::from_millis(self.semantic_timeout_ms),
            Duration::from_millis(self.filesystem_timeout_ms),
        )
        .with_per_source_limit(self.per_source_limit)
    }
}
