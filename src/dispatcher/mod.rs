//! Dispatcher - routes a request to its handler.
//!
//! The dispatcher looks up `request.type` in the handler registry, builds a
//! fresh [`ExecutionContext`], invokes the handler and annotates any failure
//! with the request type. Unknown types are rejected before any handler
//! runs.
//!
//! # Architecture
//!
//! - `handler` - The [`Handler`] trait and argument helpers
//! - `registry` - Read-only registry built at startup
//! - `context` - Per-request execution context and tool bindings

pub mod context;
pub mod handler;
pub mod registry;

use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::config::Config;
use crate::error::{Error, Result};
use crate::handlers;
use crate::scanner::ScanOptions;
use crate::types::{FormatKind, Request};

pub use context::{ExecutionContext, ToolBindings};
pub use handler::{Handler, HandlerResult};
pub use registry::{HandlerDescriptor, HandlerRegistry};

/// Routes requests to registered handlers.
#[derive(Clone)]
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
    tools: ToolBindings,
    scan_options: ScanOptions,
}

impl Dispatcher {
    pub fn new(registry: HandlerRegistry, tools: ToolBindings, scan_options: ScanOptions) -> Self {
        Self {
            registry: Arc::new(registry),
            tools,
            scan_options,
        }
    }

    /// Build the dispatcher with the built-in handlers and any handler
    /// definitions found in the configured directory.
    pub async fn from_config(config: &Config) -> Result<Self> {
        let tools = ToolBindings::from_config(config)?;

        let mut registry = HandlerRegistry::new();
        handlers::register_builtin(&mut registry)?;

        if let Some(dir) = &config.handlers_dir {
            for definition in handlers::load_definitions(dir).await? {
                registry.register(definition)?;
            }
        }

        info!(
            handlers = registry.len(),
            semantic_index = tools.semantic_index.is_some(),
            "Dispatcher ready"
        );
        Ok(Self::new(registry, tools, config.scan_options()))
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Registered handlers, sorted by name.
    pub fn handlers(&self) -> Vec<HandlerDescriptor> {
        self.registry.descriptors()
    }

    /// Dispatch a request and render its result in `format`.
    pub async fn dispatch(&self, request: Request, format: FormatKind) -> HandlerResult {
        self.dispatch_with_cancel(request, format, CancellationToken::new())
            .await
    }

    /// Dispatch a request that stops when `cancel` fires.
    ///
    /// Cancelling drops the handler future, and with it any in-flight
    /// sub-search, and returns [`Error::Cancelled`].
    pub async fn dispatch_with_cancel(
        &self,
        request: Request,
        format: FormatKind,
        cancel: CancellationToken,
    ) -> HandlerResult {
        let Some(handler) = self.registry.get(&request.request_type) else {
            warn!(request_type = %request.request_type, "Unknown request type");
            return Err(Error::UnknownHandler(request.request_type));
        };

        let request_id = Uuid::new_v4();
        let span = info_span!(
            "dispatch",
            request_type = %request.request_type,
            request_id = %request_id
        );

        async move {
            let context = ExecutionContext::new(
                request_id,
                &request.request_type,
                format,
                self.tools.clone(),
                self.scan_options.clone(),
                cancel.clone(),
            );
            let start = Instant::now();
            debug!(%format, "Dispatching request");

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(Error::Cancelled),
                result = handler.handle(&request.args, context) => result.map_err(|e| match e {
                    Error::Cancelled => Error::Cancelled,
                    other => Error::handler_failure(&request.request_type, other),
                }),
            };

            let elapsed_ms = start.elapsed().as_millis() as u64;
            match &outcome {
                Ok(_) => info!(elapsed_ms, "Request completed"),
                Err(Error::Cancelled) => info!(elapsed_ms, "Request cancelled"),
                Err(e) => warn!(elapsed_ms, error = %e, "Request failed"),
            }
            outcome
        }
        .instrument(span)
        .await
    }
}
