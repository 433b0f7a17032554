//! Filesystem search collaborator.
//!
//! [`WorkspaceSearch`] walks the workspace on a blocking thread, skipping
//! ignored directories, binary-ish extensions and oversized files, and
//! returns the files whose lines (or relative path) contain every query
//! term.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use glob::Pattern;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio_util::sync::CancellationToken;
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

use crate::error::{Error, Result};
use crate::scanner::SourceOptions;
use crate::types::{Match, MatchSource};
use crate::MAX_FILE_SIZE;

/// Patterns to ignore when searching.
const DEFAULT_IGNORE_PATTERNS: &[&str] = &[
    "node_modules",
    ".git",
    ".svn",
    ".hg",
    "target",
    "dist",
    "build",
    "__pycache__",
    ".pytest_cache",
    ".mypy_cache",
    ".venv",
    "*.pyc",
    "*.so",
    "*.dylib",
    "*.dll",
    "*.exe",
    "*.o",
    "*.a",
    ".DS_Store",
    "*.log",
    "*.lock",
    "package-lock.json",
    "pnpm-lock.yaml",
];

/// Extensions worth searching.
const INDEXABLE_EXTENSIONS: &[&str] = &[
    "rs", "py", "js", "ts", "jsx", "tsx", "mjs", "cjs", "go", "java", "c", "cpp", "cc", "h",
    "hpp", "rb", "php", "swift", "kt", "scala", "cs", "ex", "exs", "hs", "ml", "lua", "r", "jl",
    "dart", "sql", "sh", "bash", "zsh", "fish", "ps1", "html", "css", "scss", "vue", "svelte",
    "json", "yaml", "yml", "toml", "xml", "ini", "cfg", "conf", "md", "txt", "rst", "gradle",
    "tf", "hcl", "nix", "proto",
];

/// Default walk depth.
const DEFAULT_MAX_DEPTH: usize = 16;

/// Default number of matching lines kept per file.
const DEFAULT_SNIPPET_LINES: usize = 3;

/// A hit returned by the filesystem search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FileHit {
    /// Path relative to the workspace root
    pub location: String,
    /// Matching lines
    pub snippet: String,
    /// Last modification time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl FileHit {
    pub fn into_match(self) -> Match {
        let item = Match::new(MatchSource::Filesystem, &self.location, self.snippet);
        match self.modified_at {
            Some(modified_at) => item.with_modified_at(modified_at),
            None => item,
        }
    }
}

/// Contract for the local filesystem search.
#[async_trait]
pub trait FilesystemSearch: Send + Sync {
    /// Search files for a query.
    async fn search(&self, text: &str, options: &SourceOptions) -> Result<Vec<FileHit>>;
}

/// Case-insensitive literal terms; all must match.
struct SearchQuery {
    terms: Vec<Regex>,
}

impl SearchQuery {
    fn compile(text: &str) -> Result<Self> {
        let terms = text
            .split_whitespace()
            .map(|term| {
                RegexBuilder::new(&regex::escape(term))
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| Error::InvalidQuery(e.to_string()))
            })
            .collect::<Result<Vec<_>>>()?;

        if terms.is_empty() {
            return Err(Error::InvalidQuery(
                "query must contain at least one term".to_string(),
            ));
        }
        Ok(Self { terms })
    }

    fn matches(&self, text: &str) -> bool {
        self.terms.iter().all(|term| term.is_match(text))
    }

    /// Matching lines, or the opening lines for a path-only match.
    fn snippet(&self, relative: &str, contents: &str, max_lines: usize) -> Option<String> {
        let lines: Vec<&str> = contents
            .lines()
            .filter(|line| self.matches(line))
            .map(str::trim_end)
            .take(max_lines)
            .collect();
        if !lines.is_empty() {
            return Some(lines.join("\n"));
        }

        if self.matches(relative) {
            let opening: Vec<&str> = contents
                .lines()
                .map(str::trim_end)
                .filter(|line| !line.trim().is_empty())
                .take(max_lines)
                .collect();
            return Some(opening.join("\n"));
        }

        None
    }
}

/// Filesystem search over a workspace directory.
#[derive(Debug, Clone)]
pub struct WorkspaceSearch {
    root: PathBuf,
    ignore: Vec<Pattern>,
    max_file_size: u64,
    snippet_lines: usize,
}

impl WorkspaceSearch {
    /// Create a search rooted at `root` with the default ignore patterns.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            ignore: DEFAULT_IGNORE_PATTERNS
                .iter()
                .filter_map(|p| Pattern::new(p).ok())
                .collect(),
            max_file_size: MAX_FILE_SIZE as u64,
            snippet_lines: DEFAULT_SNIPPET_LINES,
        }
    }

    /// Add the entries of the workspace `.gitignore`, if present.
    pub fn with_gitignore(mut self) -> Self {
        let gitignore_path = self.root.join(".gitignore");
        if let Ok(content) = std::fs::read_to_string(&gitignore_path) {
            for line in content.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                    continue;
                }
                let line = line.trim_matches('/');
                match Pattern::new(line) {
                    Ok(pattern) => self.ignore.push(pattern),
                    Err(e) => debug!("Skipping .gitignore entry {:?}: {}", line, e),
                }
            }
        }
        self
    }

    pub fn with_max_file_size(mut self, bytes: u64) -> Self {
        self.max_file_size = bytes;
        self
    }

    pub fn with_snippet_lines(mut self, lines: usize) -> Self {
        self.snippet_lines = lines.max(1);
        self
    }

    /// Get the workspace root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn relative(&self, path: &Path) -> String {
        path.strip_prefix(&self.root)
            .unwrap_or(path)
            .to_string_lossy()
            .replace('\\', "/")
    }

    fn is_ignored(&self, entry: &DirEntry) -> bool {
        let name = entry.file_name().to_string_lossy();
        let relative = self.relative(entry.path());
        self.ignore
            .iter()
            .any(|p| p.matches(&name) || p.matches(&relative))
    }

    fn check_root(&self) -> Result<()> {
        match std::fs::metadata(&self.root) {
            Ok(meta) if meta.is_dir() => {
                std::fs::read_dir(&self.root)?;
                Ok(())
            }
            Ok(_) => Err(Error::WorkspaceNotFound(format!(
                "{} is not a directory",
                self.root.display()
            ))),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(Error::WorkspaceNotFound(self.root.display().to_string()))
            }
            Err(e) => Err(Error::Io(e)),
        }
    }

    fn walk(
        &self,
        query: &SearchQuery,
        filters: &[Pattern],
        limit: Option<usize>,
        cancel: &CancellationToken,
    ) -> Result<Vec<FileHit>> {
        self.check_root()?;

        let mut hits = Vec::new();
        let entries = WalkDir::new(&self.root)
            .max_depth(DEFAULT_MAX_DEPTH)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| entry.depth() == 0 || !self.is_ignored(entry));

        for entry in entries {
            if cancel.is_cancelled() {
                debug!("Filesystem search cancelled after {} hits", hits.len());
                break;
            }
            if limit.is_some_and(|limit| hits.len() >= limit) {
                break;
            }

            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };
            if !entry.file_type().is_file() || !should_search_file(entry.path()) {
                continue;
            }

            let relative = self.relative(entry.path());
            if !filters.is_empty() && !filters.iter().any(|p| p.matches(&relative)) {
                continue;
            }

            let metadata = match entry.metadata() {
                Ok(metadata) => metadata,
                Err(e) => {
                    debug!("Cannot stat {}: {}", relative, e);
                    continue;
                }
            };
            if metadata.len() > self.max_file_size {
                debug!("Skipping large file: {} ({} bytes)", relative, metadata.len());
                continue;
            }

            let contents = match std::fs::read_to_string(entry.path()) {
                Ok(contents) => contents,
                Err(e) => {
                    debug!("Failed to read {}: {}", relative, e);
                    continue;
                }
            };

            if let Some(snippet) = query.snippet(&relative, &contents, self.snippet_lines) {
                hits.push(FileHit {
                    location: relative,
                    snippet,
                    modified_at: metadata.modified().ok().map(DateTime::<Utc>::from),
                });
            }
        }

        Ok(hits)
    }
}

#[async_trait]
impl FilesystemSearch for WorkspaceSearch {
    async fn search(&self, text: &str, options: &SourceOptions) -> Result<Vec<FileHit>> {
        let query = SearchQuery::compile(text)?;
        let filters = compile_patterns(&options.file_patterns)?;
        let limit = options.limit;
        let walker = self.clone();

        // Dropping this future cancels the token and stops the walk.
        let cancel = CancellationToken::new();
        let _guard = cancel.clone().drop_guard();

        tokio::task::spawn_blocking(move || walker.walk(&query, &filters, limit, &cancel))
            .await
            .map_err(|e| Error::Internal(format!("Filesystem search task failed: {}", e)))?
    }
}

/// Compile caller-supplied glob filters.
pub fn compile_patterns(patterns: &[String]) -> Result<Vec<Pattern>> {
    patterns
        .iter()
        .map(|p| {
            Pattern::new(p)
                .map_err(|e| Error::InvalidArguments(format!("invalid file pattern {:?}: {}", p, e)))
        })
        .collect()
}

/// Check if a file should be searched based on its extension.
fn should_search_file(path: &Path) -> bool {
    if let Some(ext) = path.extension() {
        let ext_lower = ext.to_string_lossy().to_lowercase();
        return INDEXABLE_EXTENSIONS.contains(&ext_lower.as_str());
    }

    if let Some(name) = path.file_name() {
        let name_lower = name.to_string_lossy().to_lowercase();
        return matches!(
            name_lower.as_str(),
            "dockerfile" | "makefile" | "rakefile" | "gemfile" | "justfile"
        );
    }

    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write(dir: &TempDir, relative: &str, contents: &str) {
        let path = dir.path().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn create_test_workspace() -> TempDir {
        let dir = TempDir::new().expect("Failed to create temp dir");
        write(
            &dir,
            "src/config.rs",
            "use std::path::Path;\n\npub fn load_config(path: &Path) {}\npub fn save() {}\n",
        );
        write(&dir, "src/main.rs", "fn main() {\n    load_config();\n}\n");
        write(&dir, "tests/config_test.rs", "#[test]\nfn loads_config() {}\n");
        write(&dir, "target/debug/build.rs", "fn load_config() {}\n");
        write(&dir, "node_modules/pkg/index.js", "load_config()\n");
        write(&dir, "README.md", "# Demo\n\nA workspace.\n");
        write(&dir, "image.png", "load_config");
        dir
    }

    #[tokio::test]
    async fn test_finds_matching_lines() {
        let dir = create_test_workspace();
        let search = WorkspaceSearch::new(dir.path());

        let hits = search
            .search("load_config", &SourceOptions::default())
            .await
            .unwrap();
        let locations: Vec<_> = hits.iter().map(|h| h.location.as_str()).collect();

        assert_eq!(locations, vec!["src/config.rs", "src/main.rs"]);
        assert_eq!(hits[0].snippet, "pub fn load_config(path: &Path) {}");
        assert_eq!(hits[1].snippet, "    load_config();");
        assert!(hits.iter().all(|h| h.modified_at.is_some()));
    }

    #[tokio::test]
    async fn test_all_terms_must_match_case_insensitively() {
        let dir = create_test_workspace();
        let search = WorkspaceSearch::new(dir.path());

        let hits = search
            .search("PUB  Load", &SourceOptions::default())
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].location, "src/config.rs");
    }

    #[tokio::test]
    async fn test_path_only_match_uses_opening_lines() {
        let dir = create_test_workspace();
        let search = WorkspaceSearch::new(dir.path()).with_snippet_lines(2);

        let hits = search.search("readme", &SourceOptions::default()).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].snippet, "# Demo\nA workspace.");
    }

    #[tokio::test]
    async fn test_file_patterns_restrict_results() {
        let dir = create_test_workspace();
        let search = WorkspaceSearch::new(dir.path());
        let options = SourceOptions {
            limit: None,
            file_patterns: vec!["tests/**/*".to_string()],
            deadline: None,
        };

        let hits = search.search("config", &options).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].location, "tests/config_test.rs");
    }

    #[tokio::test]
    async fn test_limit_is_respected() {
        let dir = create_test_workspace();
        let search = WorkspaceSearch::new(dir.path());
        let options = SourceOptions {
            limit: Some(1),
            file_patterns: Vec::new(),
            deadline: None,
        };

        let hits = search.search("load_config", &options).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn test_gitignore_entries_are_skipped() {
        let dir = create_test_workspace();
        write(&dir, ".gitignore", "# generated\n/generated/\n");
        write(&dir, "generated/config.rs", "pub fn load_config() {}\n");

        let plain = WorkspaceSearch::new(dir.path());
        let with_gitignore = WorkspaceSearch::new(dir.path()).with_gitignore();
        let options = SourceOptions::default();

        assert_eq!(plain.search("load_config", &options).await.unwrap().len(), 3);
        assert_eq!(
            with_gitignore.search("load_config", &options).await.unwrap().len(),
            2
        );
    }

    #[tokio::test]
    async fn test_large_files_are_skipped() {
        let dir = create_test_workspace();
        let search = WorkspaceSearch::new(dir.path()).with_max_file_size(40);

        let hits = search
            .search("load_config", &SourceOptions::default())
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].location, "src/main.rs");
    }

    #[tokio::test]
    async fn test_missing_workspace_fails() {
        let dir = TempDir::new().unwrap();
        let search = WorkspaceSearch::new(dir.path().join("missing"));

        let err = search.search("x", &SourceOptions::default()).await.unwrap_err();
        assert!(matches!(err, Error::WorkspaceNotFound(_)));
    }

    #[tokio::test]
    async fn test_invalid_file_pattern_is_rejected() {
        let dir = create_test_workspace();
        let search = WorkspaceSearch::new(dir.path());
        let options = SourceOptions {
            limit: None,
            file_patterns: vec!["src/[".to_string()],
            deadline: None,
        };

        let err = search.search("x", &options).await.unwrap_err();
        assert!(matches!(err, Error::InvalidArguments(_)));
    }

    #[test]
    fn test_should_search_file() {
        assert!(should_search_file(Path::new("src/main.rs")));
        assert!(should_search_file(Path::new("config.YAML")));
        assert!(should_search_file(Path::new("Makefile")));
        assert!(!should_search_file(Path::new("logo.png")));
        assert!(!should_search_file(Path::new("LICENSE")));
    }
}
