//! Retrieved context items and their scored form.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Where a match was retrieved from.
///
/// Variant order is source precedence: semantic-index sorts before filesystem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchSource {
    SemanticIndex,
    Filesystem,
}

impl MatchSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::SemanticIndex => "semantic-index",
            Self::Filesystem => "filesystem",
        }
    }
}

impl std::fmt::Display for MatchSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single retrieved context item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    /// Source that produced the item
    pub source: MatchSource,
    /// Normalized path or identifier
    pub location: String,
    /// Text excerpt
    pub snippet: String,
    /// Score reported by the source, if any
    #[serde(default, alias = "rawScore", skip_serializing_if = "Option::is_none")]
    pub raw_score: Option<f64>,
    /// Last modification time, if known
    #[serde(default, alias = "modifiedAt", skip_serializing_if = "Option::is_none")]
    pub modified_at: Option<DateTime<Utc>>,
}

impl Match {
    /// Create a match; the location is normalized.
    pub fn new(source: MatchSource, location: &str, snippet: impl Into<String>) -> Self {
        Self {
            source,
            location: normalize_location(location),
            snippet: snippet.into(),
            raw_score: None,
            modified_at: None,
        }
    }

    /// Attach a raw score. Non-finite scores are dropped.
    pub fn with_raw_score(mut self, raw_score: f64) -> Self {
        self.raw_score = raw_score.is_finite().then_some(raw_score);
        self
    }

    /// Attach a modification time.
    pub fn with_modified_at(mut self, modified_at: DateTime<Utc>) -> Self {
        self.modified_at = Some(modified_at);
        self
    }

    /// Merge a duplicate of this match into it.
    ///
    /// Keeps the richer snippet (more characters, ties broken by the
    /// lexicographically greater text), the highest raw score, the
    /// higher-precedence source and the latest modification time. The
    /// result does not depend on argument order, and merging a match with
    /// itself leaves it unchanged.
    pub fn merge(self, other: Match) -> Match {
        debug_assert_eq!(self.location, other.location);

        let snippet = if richer(&other.snippet, &self.snippet) {
            other.snippet
        } else {
            self.snippet
        };

        Match {
            source: self.source.min(other.source),
            location: self.location,
            snippet,
            raw_score: max_option(self.raw_score, other.raw_score, f64::max),
            modified_at: max_option(self.modified_at, other.modified_at, std::cmp::max),
        }
    }
}

fn richer(candidate: &str, current: &str) -> bool {
    let (a, b) = (candidate.chars().count(), current.chars().count());
    a > b || (a == b && candidate > current)
}

fn max_option<T>(a: Option<T>, b: Option<T>, max: impl Fn(T, T) -> T) -> Option<T> {
    match (a, b) {
        (Some(a), Some(b)) => Some(max(a, b)),
        (a, b) => a.or(b),
    }
}

/// Normalize a location so equivalent spellings compare equal.
///
/// Trims whitespace, converts `\` to `/`, strips leading `./`, collapses
/// repeated separators and drops a trailing separator.
pub fn normalize_location(location: &str) -> String {
    let unified = location.trim().replace('\\', "/");

    let mut rest = unified.as_str();
    while let Some(stripped) = rest.strip_prefix("./") {
        rest = stripped.trim_start_matches('/');
    }

    let mut normalized = String::with_capacity(rest.len());
    for ch in rest.chars() {
        if ch == '/' && normalized.ends_with('/') {
            continue;
        }
        normalized.push(ch);
    }

    if normalized.len() > 1 && normalized.ends_with('/') {
        normalized.pop();
    }
    normalized
}

/// Collapse matches that share a normalized location.
///
/// The output is ordered by location.
pub fn merge_matches(matches: impl IntoIterator<Item = Match>) -> Vec<Match> {
    let mut merged: BTreeMap<String, Match> = BTreeMap::new();

    for mut item in matches {
        item.location = normalize_location(&item.location);
        match merged.remove(&item.location) {
            Some(existing) => {
                let combined = existing.merge(item);
                merged.insert(combined.location.clone(), combined);
            }
            None => {
                merged.insert(item.location.clone(), item);
            }
        }
    }

    merged.into_values().collect()
}

/// A match with the score assigned by the scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredMatch {
    #[serde(flatten)]
    pub item: Match,
    /// Relevance score
    pub score: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_normalize_location() {
        assert_eq!(normalize_location("a.ts"), "a.ts");
        assert_eq!(normalize_location("./src/a.ts"), "src/a.ts");
        assert_eq!(normalize_location(" src\\lib\\a.rs "), "src/lib/a.rs");
        assert_eq!(normalize_location("src//nested///a.rs"), "src/nested/a.rs");
    }

    #[test]
    fn test_normalize_location_edges() {
        assert_eq!(normalize_location("././a.ts"), "a.ts");
        assert_eq!(normalize_location("src/"), "src");
        assert_eq!(normalize_location("/abs/path.rs"), "/abs/path.rs");
        assert_eq!(normalize_location("/"), "/");
    }

    #[test]
    fn test_merge_prefers_richer_snippet_and_highest_score() {
        let semantic = Match::new(MatchSource::SemanticIndex, "a.ts", "foo").with_raw_score(0.9);
        let filesystem = Match::new(MatchSource::Filesystem, "./a.ts", "foo bar");

        let merged = semantic.clone().merge(filesystem.clone());
        assert_eq!(merged.location, "a.ts");
        assert_eq!(merged.snippet, "foo bar");
        assert_eq!(merged.raw_score, Some(0.9));
        assert_eq!(merged.source, MatchSource::SemanticIndex);

        assert_eq!(filesystem.merge(semantic), merged);
    }

    #[test]
    fn test_merge_is_idempotent() {
        let item = Match::new(MatchSource::Filesystem, "src/lib.rs", "pub mod scanner;")
            .with_raw_score(0.4)
            .with_modified_at(Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap());

        assert_eq!(item.clone().merge(item.clone()), item);
    }

    #[test]
    fn test_merge_equal_length_snippets_is_order_independent() {
        let a = Match::new(MatchSource::Filesystem, "x.rs", "abc");
        let b = Match::new(MatchSource::Filesystem, "x.rs", "abd");

        assert_eq!(a.clone().merge(b.clone()).snippet, "abd");
        assert_eq!(b.merge(a).snippet, "abd");
    }

    #[test]
    fn test_merge_keeps_latest_modification() {
        let older = Utc.with_ymd_and_hms(2025, 5, 1, 0, 0, 0).unwrap();
        let newer = Utc.with_ymd_and_hms(2026, 5, 1, 0, 0, 0).unwrap();
        let a = Match::new(MatchSource::Filesystem, "x.rs", "a").with_modified_at(older);
        let b = Match::new(MatchSource::SemanticIndex, "x.rs", "a").with_modified_at(newer);

        assert_eq!(a.merge(b).modified_at, Some(newer));
    }

    #[test]
    fn test_merge_matches_removes_duplicates() {
        let merged = merge_matches(vec![
            Match::new(MatchSource::SemanticIndex, "b.rs", "one").with_raw_score(0.2),
            Match::new(MatchSource::Filesystem, "./b.rs", "one two"),
            Match::new(MatchSource::Filesystem, "a.rs", "alpha"),
            Match::new(MatchSource::SemanticIndex, "b.rs", "x").with_raw_score(0.7),
        ]);

        assert_eq!(merged.len(), 2);
        assert_eq!(merged[0].location, "a.rs");
        assert_eq!(merged[1].location, "b.rs");
        assert_eq!(merged[1].snippet, "one two");
        assert_eq!(merged[1].raw_score, Some(0.7));
    }

    #[test]
    fn test_non_finite_raw_score_is_dropped() {
        let item = Match::new(MatchSource::SemanticIndex, "a.rs", "").with_raw_score(f64::NAN);
        assert_eq!(item.raw_score, None);
    }

    #[test]
    fn test_match_source_serialization() {
        assert_eq!(
            serde_json::to_string(&MatchSource::SemanticIndex).unwrap(),
            "\"semantic-index\""
        );
        let parsed: MatchSource = serde_json::from_str("\"filesystem\"").unwrap();
        assert_eq!(parsed, MatchSource::Filesystem);
        assert!(MatchSource::SemanticIndex < MatchSource::Filesystem);
    }

    #[test]
    fn test_match_accepts_camel_case_fields() {
        let item: Match = serde_json::from_value(serde_json::json!({
            "source": "semantic-index",
            "location": "src/lib.rs",
            "snippet": "pub mod scanner;",
            "rawScore": 0.75,
            "modifiedAt": "2026-01-02T03:04:05Z"
        }))
        .unwrap();

        assert_eq!(item.raw_score, Some(0.75));
        assert_eq!(
            item.modified_at,
            Some(Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap())
        );
    }

    #[test]
    fn test_scored_match_flattens_fields() {
        let scored = ScoredMatch {
            item: Match::new(MatchSource::Filesystem, "a.rs", "fn a() {}"),
            score: 0.4,
        };

        let value = serde_json::to_value(&scored).unwrap();
        assert_eq!(value["location"], "a.rs");
        assert_eq!(value["source"], "filesystem");
        assert_eq!(value["score"], 0.4);
        assert!(value.get("raw_score").is_none());
    }

    mod properties {
        use super::*;
        use crate::types::strategies::{arb_matches, arb_same_location};
        use proptest::prelude::*;
        use std::collections::HashSet;

        proptest! {
            #[test]
            fn merge_is_commutative((a, b, _) in arb_same_location()) {
                prop_assert_eq!(a.clone().merge(b.clone()), b.merge(a));
            }

            #[test]
            fn merge_is_associative((a, b, c) in arb_same_location()) {
                let left = a.clone().merge(b.clone()).merge(c.clone());
                let right = a.merge(b.merge(c));
                prop_assert_eq!(left, right);
            }

            #[test]
            fn merge_is_idempotent((a, _, _) in arb_same_location()) {
                prop_assert_eq!(a.clone().merge(a.clone()), a);
            }

            #[test]
            fn merged_locations_are_unique_and_normalized(matches in arb_matches()) {
                let expected: HashSet<String> =
                    matches.iter().map(|m| normalize_location(&m.location)).collect();
                let merged = merge_matches(matches);

                let seen: HashSet<&str> = merged.iter().map(|m| m.location.as_str()).collect();
                prop_assert_eq!(seen.len(), merged.len());
                prop_assert_eq!(seen.len(), expected.len());
                for item in &merged {
                    prop_assert_eq!(normalize_location(&item.location), item.location.clone());
                }
            }

            #[test]
            fn merge_matches_ignores_input_order(matches in arb_matches()) {
                let mut reversed = matches.clone();
                reversed.reverse();
                prop_assert_eq!(merge_matches(matches), merge_matches(reversed));
            }
        }
    }
}
