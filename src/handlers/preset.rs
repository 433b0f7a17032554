//! Preset searches restricted to well-known file groups.

use crate::error::Result;
use crate::handlers::search::SearchHandler;
use crate::scorer::Criteria;

/// Preset glob patterns for test files.
pub const TEST_GLOBS: &[&str] = &[
    "tests/**/*",
    "test/**/*",
    "**/*test*.*",
    "**/*_test.*",
    "**/*Test*.*",
    "**/*.test.*",
    "**/*.spec.*",
    "**/test_*.*",
    "**/__tests__/**/*",
];

/// Preset glob patterns for config files.
pub const CONFIG_GLOBS: &[&str] = &[
    "**/*.yaml",
    "**/*.yml",
    "**/*.json",
    "**/*.toml",
    "**/*.ini",
    "**/*.cfg",
    "**/*.conf",
    "**/*.config.*",
    "**/.env*",
    "**/config/**/*",
    "**/configs/**/*",
    "**/settings/**/*",
    "**/*config*.*",
    "**/*settings*.*",
];

/// Added per matching preset glob, so semantic hits outside the group
/// rank below hits inside it.
const PRESET_BOOST: f64 = 0.05;

fn preset(name: &str, description: &str, globs: &[&str]) -> Result<SearchHandler> {
    let criteria = globs
        .iter()
        .try_fold(Criteria::default(), |criteria, glob| {
            criteria.with_path_boost(glob, PRESET_BOOST)
        })?;

    Ok(SearchHandler::new(name, description)
        .with_file_patterns(globs.iter().map(|g| g.to_string()).collect())
        .with_criteria(criteria))
}

/// The `search_tests` handler.
pub fn search_tests() -> Result<SearchHandler> {
    preset(
        "search_tests",
        "Search test files (tests/, *_test.*, *.spec.*, __tests__/ and similar) for a query.",
        TEST_GLOBS,
    )
}

/// The `search_config` handler.
pub fn search_config() -> Result<SearchHandler> {
    preset(
        "search_config",
        "Search configuration files (YAML, JSON, TOML, INI, .env and config directories) for a query.",
        CONFIG_GLOBS,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatcher::Handler;

    #[test]
    fn test_presets_build() {
        let tests = search_tests().unwrap();
        assert_eq!(tests.name(), "search_tests");
        assert_eq!(tests.file_patterns().len(), TEST_GLOBS.len());
        assert_eq!(tests.criteria().path_boosts().len(), TEST_GLOBS.len());

        let config = search_config().unwrap();
        assert_eq!(config.name(), "search_config");
        assert_eq!(config.file_patterns().len(), CONFIG_GLOBS.len());
    }

    #[test]
    fn test_test_globs_match_common_layouts() {
        let criteria = search_tests().unwrap().criteria().clone();
        let matches = |location: &str| {
            criteria
                .path_boosts()
                .iter()
                .any(|b| b.applies_to(location))
        };

        assert!(matches("tests/integration.rs"));
        assert!(matches("src/parser_test.go"));
        assert!(matches("web/app.spec.ts"));
        assert!(matches("pkg/__tests__/util.js"));
        assert!(!matches("src/main.rs"));
    }

    #[test]
    fn test_config_globs_match_common_files() {
        let criteria = search_config().unwrap().criteria().clone();
        let matches = |location: &str| {
            criteria
                .path_boosts()
                .iter()
                .any(|b| b.applies_to(location))
        };

        assert!(matches("Cargo.toml"));
        assert!(matches("deploy/values.yaml"));
        assert!(matches(".env.local"));
        assert!(!matches("src/lib.rs"));
    }
}
