//! Per-request execution context.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::Config;
use crate::error::Result;
use crate::presenter::Presenter;
use crate::scanner::{
    FilesystemSearch, HttpSemanticIndex, ScanOptions, Scanner, SemanticIndex, WorkspaceSearch,
};
use crate::scorer::Scorer;
use crate::types::{FormatKind, RenderedOutput, ScoredMatch};

/// Collaborators available to handlers.
#[derive(Clone)]
pub struct ToolBindings {
    pub semantic_index: Option<Arc<dyn SemanticIndex>>,
    pub filesystem: Arc<dyn FilesystemSearch>,
    pub workspace: PathBuf,
}

impl ToolBindings {
    pub fn new(
        semantic_index: Option<Arc<dyn SemanticIndex>>,
        filesystem: Arc<dyn FilesystemSearch>,
        workspace: impl Into<PathBuf>,
    ) -> Self {
        Self {
            semantic_index,
            filesystem,
            workspace: workspace.into(),
        }
    }

    /// Build the shipped collaborators from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let semantic_index = match &config.semantic_url {
            Some(url) => {
                let index = HttpSemanticIndex::new(url.clone(), config.semantic_api_key.clone())?;
                Some(Arc::new(index) as Arc<dyn SemanticIndex>)
            }
            None => None,
        };

        let filesystem = WorkspaceSearch::new(&config.workspace)
            .with_gitignore()
            .with_max_file_size(config.max_file_size as u64);

        Ok(Self::new(
            semantic_index,
            Arc::new(filesystem),
            config.workspace.clone(),
        ))
    }
}

/// Everything a handler needs for one request.
///
/// Built fresh by the dispatcher for every call and owned by that call.
pub struct ExecutionContext {
    request_id: Uuid,
    request_type: String,
    format: FormatKind,
    scanner: Scanner,
    scorer: Scorer,
    presenter: Presenter,
    scan_options: ScanOptions,
    tools: ToolBindings,
    cancel: CancellationToken,
}

impl ExecutionContext {
    pub fn new(
        request_id: Uuid,
        request_type: impl Into<String>,
        format: FormatKind,
        tools: ToolBindings,
        scan_options: ScanOptions,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            request_id,
            request_type: request_type.into(),
            format,
            scanner: Scanner::new(tools.semantic_index.clone(), tools.filesystem.clone()),
            scorer: Scorer::new(),
            presenter: Presenter::new(),
            scan_options,
            tools,
            cancel,
        }
    }

    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    pub fn request_type(&self) -> &str {
        &self.request_type
    }

    /// Format requested by the caller.
    pub fn format(&self) -> FormatKind {
        self.format
    }

    pub fn scanner(&self) -> &Scanner {
        &self.scanner
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    pub fn presenter(&self) -> &Presenter {
        &self.presenter
    }

    /// Base scan options from configuration.
    pub fn scan_options(&self) -> &ScanOptions {
        &self.scan_options
    }

    pub fn tools(&self) -> &ToolBindings {
        &self.tools
    }

    pub fn workspace(&self) -> &Path {
        &self.tools.workspace
    }

    /// Whether the caller has given up on this request.
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Render a ranked sequence in the requested format.
    pub fn render(&self, ranked: &[ScoredMatch]) -> Result<RenderedOutput> {
        self.presenter.format(ranked, self.format)
    }
}
