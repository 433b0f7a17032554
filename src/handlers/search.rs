//! Search handlers: scan, rank, truncate, render.

use async_trait::async_trait;
use tracing::debug;

use crate::dispatcher::handler::{
    get_optional_usize_arg, get_string_arg, get_string_array_arg, Handler, HandlerResult,
};
use crate::dispatcher::ExecutionContext;
use crate::error::Error;
use crate::handlers::resolve_criteria;
use crate::scorer::Criteria;
use crate::types::HandlerArgs;

/// A search handler with optional preset file patterns, criteria and
/// result cap. Caller arguments take precedence over the presets.
#[derive(Debug, Clone)]
pub struct SearchHandler {
    name: String,
    description: String,
    file_patterns: Vec<String>,
    criteria: Criteria,
    max_results: Option<usize>,
}

impl SearchHandler {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            file_patterns: Vec::new(),
            criteria: Criteria::default(),
            max_results: None,
        }
    }

    /// The general-purpose `context_search` handler.
    pub fn context_search() -> Self {
        Self::new(
            "context_search",
            "Search the semantic index and the workspace for code relevant to a query, then rank and render the results.",
        )
    }

    pub fn with_file_patterns(mut self, patterns: Vec<String>) -> Self {
        self.file_patterns = patterns;
        self
    }

    pub fn with_criteria(mut self, criteria: Criteria) -> Self {
        self.criteria = criteria;
        self
    }

    pub fn with_max_results(mut self, max_results: Option<usize>) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn file_patterns(&self) -> &[String] {
        &self.file_patterns
    }

    pub fn criteria(&self) -> &Criteria {
        &self.criteria
    }

    pub fn max_results(&self) -> Option<usize> {
        self.max_results
    }
}

#[async_trait]
impl Handler for SearchHandler {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn handle(&self, args: &HandlerArgs, context: ExecutionContext) -> HandlerResult {
        let query = get_string_arg(args, "query")?;
        let max_results = get_optional_usize_arg(args, "max_results")?.or(self.max_results);
        let criteria = resolve_criteria(args, &self.criteria)?;

        let mut file_patterns = get_string_array_arg(args, "file_patterns")?;
        if file_patterns.is_empty() {
            file_patterns = self.file_patterns.clone();
        }

        let options = context
            .scan_options()
            .clone()
            .with_file_patterns(file_patterns);
        let report = context.scanner().scan_with_report(&query, &options).await?;
        for degraded in &report.degraded {
            debug!(source = %degraded.source, reason = %degraded.reason, "Source skipped");
        }
        if context.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let mut ranked = context.scorer().rank(&report.matches, &criteria);
        if let Some(max) = max_results {
            ranked.truncate(max);
        }

        debug!(results = ranked.len(), "Search ranked");
        context.render(&ranked)
    }
}
