//! Handler definitions loaded from YAML files.
//!
//! Each `*.yaml` / `*.yml` file in the handlers directory declares one
//! preset search:
//!
//! ```yaml
//! name: search_migrations
//! description: Search database migrations
//! file_patterns: ["migrations/**/*.sql"]
//! max_results: 10
//! criteria:
//!   path_boosts:
//!     - pattern: "migrations/**"
//!       boost: 0.1
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::dispatcher::Handler;
use crate::error::{Error, Result};
use crate::handlers::search::SearchHandler;
use crate::scanner::filesystem::compile_patterns;
use crate::scorer::Criteria;

/// A declarative preset search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HandlerDefinition {
    pub name: String,
    pub description: String,
    #[serde(default)]
    pub file_patterns: Vec<String>,
    #[serde(default)]
    pub criteria: Option<Criteria>,
    #[serde(default)]
    pub max_results: Option<usize>,
}

impl HandlerDefinition {
    /// Parse a definition from YAML text.
    pub fn from_yaml(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| Error::InvalidHandlerDefinition(e.to_string()))
    }

    /// Validate and turn the definition into a handler.
    pub fn into_handler(self) -> Result<SearchHandler> {
        compile_patterns(&self.file_patterns)
            .map_err(|e| Error::InvalidHandlerDefinition(format!("{}: {}", self.name, e)))?;

        Ok(SearchHandler::new(self.name, self.description)
            .with_file_patterns(self.file_patterns)
            .with_criteria(self.criteria.unwrap_or_default())
            .with_max_results(self.max_results))
    }
}

fn is_definition_file(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Load every definition in `dir`, sorted by file name. A missing
/// directory yields no handlers.
pub async fn load_definitions(dir: &Path) -> Result<Vec<SearchHandler>> {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            debug!("No handler definitions at {}", dir.display());
            return Ok(Vec::new());
        }
        Err(e) => return Err(e.into()),
    };

    let mut paths: Vec<PathBuf> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if is_definition_file(&path) && entry.file_type().await?.is_file() {
            paths.push(path);
        }
    }
    paths.sort();

    let mut handlers = Vec::with_capacity(paths.len());
    for path in paths {
        let content = tokio::fs::read_to_string(&path).await?;
        let handler = HandlerDefinition::from_yaml(&content)
            .and_then(HandlerDefinition::into_handler)
            .map_err(|e| match e {
                Error::InvalidHandlerDefinition(msg) => {
                    Error::InvalidHandlerDefinition(format!("{}: {}", path.display(), msg))
                }
                other => other,
            })?;

        info!("Loaded handler definition {} from {}", handler.name(), path.display());
        handlers.push(handler);
    }

    Ok(handlers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const MIGRATIONS: &str = r#"
name: search_migrations
description: Search database migrations
file_patterns: ["migrations/**/*.sql"]
max_results: 10
criteria:
  filesystem_weight: 1.0
  path_boosts:
    - pattern: "migrations/**"
      boost: 0.1
"#;

    #[test]
    fn test_parse_definition() {
        let definition = HandlerDefinition::from_yaml(MIGRATIONS).unwrap();
        assert_eq!(definition.name, "search_migrations");
        assert_eq!(definition.max_results, Some(10));

        let handler = definition.into_handler().unwrap();
        assert_eq!(handler.file_patterns(), ["migrations/**/*.sql"]);
        assert_eq!(handler.criteria().path_boosts().len(), 1);
    }

    #[test]
    fn test_minimal_definition() {
        let handler = HandlerDefinition::from_yaml("name: docs\ndescription: Docs search\n")
            .unwrap()
            .into_handler()
            .unwrap();
        assert!(handler.file_patterns().is_empty());
        assert_eq!(handler.max_results(), None);
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let err = HandlerDefinition::from_yaml("name: a\ndescription: b\nprompt: hi\n").unwrap_err();
        assert!(matches!(err, Error::InvalidHandlerDefinition(_)));

        let err =
            HandlerDefinition::from_yaml("name: a\ndescription: b\ncriteria:\n  weight: 2\n")
                .unwrap_err();
        assert!(matches!(err, Error::InvalidHandlerDefinition(_)));
    }

    #[test]
    fn test_invalid_patterns_are_rejected() {
        let err = HandlerDefinition::from_yaml("name: a\ndescription: b\nfile_patterns: ['[']\n")
            .unwrap()
            .into_handler()
            .unwrap_err();
        assert!(matches!(err, Error::InvalidHandlerDefinition(_)));
    }

    #[tokio::test]
    async fn test_load_definitions_from_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b_migrations.yaml"), MIGRATIONS).unwrap();
        std::fs::write(
            dir.path().join("a_docs.yml"),
            "name: search_docs\ndescription: Search docs\nfile_patterns: ['docs/**']\n",
        )
        .unwrap();
        std::fs::write(dir.path().join("notes.txt"), "not a definition").unwrap();

        let handlers = load_definitions(dir.path()).await.unwrap();
        let names: Vec<_> = handlers.iter().map(|h| h.name()).collect();
        assert_eq!(names, vec!["search_docs", "search_migrations"]);
    }

    #[tokio::test]
    async fn test_missing_directory_yields_nothing() {
        let dir = TempDir::new().unwrap();
        let handlers = load_definitions(&dir.path().join("absent")).await.unwrap();
        assert!(handlers.is_empty());
    }

    #[tokio::test]
    async fn test_broken_file_names_the_path() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("broken.yaml"), "name: [unclosed").unwrap();

        let err = load_definitions(dir.path()).await.unwrap_err();
        assert!(matches!(err, Error::InvalidHandlerDefinition(ref msg) if msg.contains("broken.yaml")));
    }
}
