//! Scanner - retrieves candidate context from the semantic index and the
//! local filesystem.
//!
//! Both sources are queried concurrently, each under its own timeout. A
//! source that fails or times out is logged and skipped; the scan only fails
//! when neither source produced results. Matches describing the same
//! normalized location are merged into one.
//!
//! # Architecture
//!
//! - `semantic` - Semantic index collaborator trait and HTTP client
//! - `filesystem` - Filesystem search collaborator trait and workspace walker
//! - `retry` - Backoff helper used by the HTTP client

pub mod filesystem;
pub mod retry;
pub mod semantic;

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::types::{merge_matches, Match, MatchSource};

pub use filesystem::{FileHit, FilesystemSearch, WorkspaceSearch};
pub use semantic::{HttpSemanticIndex, IndexHit, SemanticIndex};

/// Options forwarded to each collaborator.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceOptions {
    /// Maximum hits the source may return (None = source decides)
    pub limit: Option<usize>,
    /// Glob patterns restricting which locations are searched
    pub file_patterns: Vec<String>,
    /// When the scanner stops waiting for this source
    pub deadline: Option<Instant>,
}

/// Options for a single scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanOptions {
    /// Time allowed for the semantic index query
    pub semantic_timeout: Duration,
    /// Time allowed for the filesystem search
    pub filesystem_timeout: Duration,
    /// Maximum hits requested from each source. This is the only
    /// truncation the scanner applies.
    pub per_source_limit: Option<usize>,
    /// Glob patterns restricting the searched locations
    pub file_patterns: Vec<String>,
}

impl ScanOptions {
    /// Create options with explicit per-source timeouts.
    pub fn new(semantic_timeout: Duration, filesystem_timeout: Duration) -> Self {
        Self {
            semantic_timeout,
            filesystem_timeout,
            per_source_limit: None,
            file_patterns: Vec::new(),
        }
    }

    pub fn with_per_source_limit(mut self, limit: Option<usize>) -> Self {
        self.per_source_limit = limit;
        self
    }

    pub fn with_file_patterns(mut self, patterns: Vec<String>) -> Self {
        self.file_patterns = patterns;
        self
    }

    fn source_options(&self, deadline: Instant) -> SourceOptions {
        SourceOptions {
            limit: self.per_source_limit,
            file_patterns: self.file_patterns.clone(),
            deadline: Some(deadline),
        }
    }
}

/// A source that did not contribute to a scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Degradation {
    pub source: MatchSource,
    pub reason: String,
}

/// Matches from a scan plus the sources that were skipped.
#[derive(Debug, Clone, Default)]
pub struct ScanReport {
    pub matches: Vec<Match>,
    pub degraded: Vec<Degradation>,
}

/// Scanner over a semantic index and a filesystem search.
#[derive(Clone)]
pub struct Scanner {
    semantic: Option<Arc<dyn SemanticIndex>>,
    filesystem: Arc<dyn FilesystemSearch>,
}

impl Scanner {
    /// Create a scanner. Without a semantic index the scan is filesystem-only.
    pub fn new(
        semantic: Option<Arc<dyn SemanticIndex>>,
        filesystem: Arc<dyn FilesystemSearch>,
    ) -> Self {
        Self {
            semantic,
            filesystem,
        }
    }

    /// Whether a semantic index is attached.
    pub fn has_semantic_index(&self) -> bool {
        self.semantic.is_some()
    }

    /// Retrieve deduplicated matches for a query. Order is unspecified.
    pub async fn scan(&self, query: &str, options: &ScanOptions) -> Result<Vec<Match>> {
        Ok(self.scan_with_report(query, options).await?.matches)
    }

    /// Like [`Scanner::scan`], also reporting which sources were skipped.
    pub async fn scan_with_report(&self, query: &str, options: &ScanOptions) -> Result<ScanReport> {
        let query = query.trim();
        if query.is_empty() {
            return Err(Error::InvalidQuery(
                "query must not be empty or whitespace".to_string(),
            ));
        }

        let started = Instant::now();
        let semantic_options = options.source_options(started + options.semantic_timeout);
        let filesystem_options = options.source_options(started + options.filesystem_timeout);
        let (semantic, filesystem) = futures::future::join(
            self.query_semantic(query, &semantic_options, options.semantic_timeout),
            self.search_filesystem(query, &filesystem_options, options.filesystem_timeout),
        )
        .await;

        let mut found = Vec::new();
        let mut degraded = Vec::new();

        let semantic_count = match semantic {
            Some(Ok(hits)) => {
                let count = hits.len();
                found.extend(hits);
                Some(count)
            }
            Some(Err(e)) => {
                warn!("Semantic index unavailable, continuing with filesystem results: {}", e);
                degraded.push(Degradation {
                    source: MatchSource::SemanticIndex,
                    reason: e.to_string(),
                });
                None
            }
            None => {
                debug!("No semantic index configured, scanning filesystem only");
                degraded.push(Degradation {
                    source: MatchSource::SemanticIndex,
                    reason: "semantic index not configured".to_string(),
                });
                None
            }
        };

        let filesystem_count = match filesystem {
            Ok(hits) => {
                let count = hits.len();
                found.extend(hits);
                Some(count)
            }
            Err(e) => {
                warn!("Filesystem search failed, continuing with semantic results: {}", e);
                degraded.push(Degradation {
                    source: MatchSource::Filesystem,
                    reason: e.to_string(),
                });
                None
            }
        };

        if semantic_count.is_none() && filesystem_count.is_none() {
            let reason = |source: MatchSource| {
                degraded
                    .iter()
                    .find(|d| d.source == source)
                    .map(|d| d.reason.clone())
                    .unwrap_or_default()
            };
            return Err(Error::ScanUnavailable {
                semantic: reason(MatchSource::SemanticIndex),
                filesystem: reason(MatchSource::Filesystem),
            });
        }

        let matches = merge_matches(found);
        debug!(
            query,
            semantic = semantic_count.unwrap_or(0),
            filesystem = filesystem_count.unwrap_or(0),
            merged = matches.len(),
            "Scan complete"
        );

        Ok(ScanReport { matches, degraded })
    }

    async fn query_semantic(
        &self,
        query: &str,
        options: &SourceOptions,
        timeout: Duration,
    ) -> Option<Result<Vec<Match>>> {
        let index = self.semantic.as_ref()?;

        let outcome = match tokio::time::timeout(timeout, index.query(query, options)).await {
            Ok(Ok(hits)) => Ok(hits.into_iter().map(IndexHit::into_match).collect()),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(Error::timeout("semantic index query", timeout)),
        };
        Some(outcome)
    }

    async fn search_filesystem(
        &self,
        query: &str,
        options: &SourceOptions,
        timeout: Duration,
    ) -> Result<Vec<Match>> {
        match tokio::time::timeout(timeout, self.filesystem.search(query, options)).await {
            Ok(Ok(hits)) => Ok(hits.into_iter().map(FileHit::into_match).collect()),
            Ok(Err(e)) => Err(e),
            Err(_) => Err(Error::timeout("filesystem search", timeout)),
        }
    }
}
