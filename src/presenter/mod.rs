//! Presenter - renders a ranked sequence in the requested format.
//!
//! Rendering is deterministic: the same ranked sequence and format always
//! produce the same payload. The `json` format is a lossless encoding that
//! [`Presenter::parse_json`] restores exactly.

mod markdown;
mod terminal;

use crate::error::{Error, Result};
use crate::types::{FormatKind, RenderedOutput, ScoredMatch};

/// Stateless renderer.
#[derive(Debug, Clone, Copy, Default)]
pub struct Presenter;

impl Presenter {
    pub fn new() -> Self {
        Self
    }

    /// Render a ranked sequence.
    pub fn format(&self, ranked: &[ScoredMatch], format: FormatKind) -> Result<RenderedOutput> {
        let payload = match format {
            FormatKind::Markdown => markdown::render(ranked),
            FormatKind::Json => serde_json::to_string_pretty(ranked)?,
            FormatKind::Terminal => terminal::render(ranked),
        };
        Ok(RenderedOutput::new(format, payload))
    }

    /// Decode a `json` payload back into the ranked sequence.
    pub fn parse_json(payload: &str) -> Result<Vec<ScoredMatch>> {
        serde_json::from_str(payload).map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Match, MatchSource};
    use chrono::{TimeZone, Utc};

    fn ranked() -> Vec<ScoredMatch> {
        vec![
            ScoredMatch {
                item: Match::new(MatchSource::SemanticIndex, "src/config.rs", "fn load() {}")
                    .with_raw_score(0.1 + 0.2),
                score: 0.1 + 0.2,
            },
            ScoredMatch {
                item: Match::new(MatchSource::Filesystem, "docs/guide.md", "Use `load`.")
                    .with_modified_at(Utc.with_ymd_and_hms(2024, 3, 9, 12, 30, 5).unwrap()),
                score: 1.0 / 3.0,
            },
        ]
    }

    #[test]
    fn test_json_round_trip_is_lossless() {
        let presenter = Presenter::new();
        let input = ranked();

        let output = presenter.format(&input, FormatKind::Json).unwrap();
        assert_eq!(output.format, FormatKind::Json);

        let parsed = Presenter::parse_json(&output.payload).unwrap();
        assert_eq!(parsed, input);
    }

    #[test]
    fn test_json_fields() {
        let output = Presenter::new().format(&ranked(), FormatKind::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&output.payload).unwrap();

        assert_eq!(value[0]["source"], "semantic-index");
        assert_eq!(value[0]["location"], "src/config.rs");
        assert!(value[0].get("modified_at").is_none());
        assert_eq!(value[1]["source"], "filesystem");
        assert!(value[1].get("raw_score").is_none());
    }

    #[test]
    fn test_empty_results_per_format() {
        let presenter = Presenter::new();
        for format in FormatKind::ALL {
            let output = presenter.format(&[], format).unwrap();
            assert!(!output.payload.is_empty(), "{} payload is empty", format);
        }

        let json = presenter.format(&[], FormatKind::Json).unwrap();
        assert_eq!(json.payload, "[]");
        assert!(Presenter::parse_json(&json.payload).unwrap().is_empty());
    }

    #[test]
    fn test_rendering_is_deterministic() {
        let presenter = Presenter::new();
        let input = ranked();
        for format in FormatKind::ALL {
            assert_eq!(
                presenter.format(&input, format).unwrap(),
                presenter.format(&input, format).unwrap()
            );
        }
    }

    #[test]
    fn test_parse_json_rejects_garbage() {
        assert!(matches!(
            Presenter::parse_json("{not json"),
            Err(Error::Json(_))
        ));
    }

    mod properties {
        use super::*;
        use crate::scorer::strategies::arb_criteria;
        use crate::scorer::Scorer;
        use crate::types::strategies::arb_matches;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn json_round_trip_restores_ranking(matches in arb_matches(), criteria in arb_criteria()) {
                let ranked = Scorer::new().rank(&matches, &criteria);
                let output = Presenter::new().format(&ranked, FormatKind::Json).unwrap();

                let parsed = Presenter::parse_json(&output.payload).unwrap();
                prop_assert_eq!(parsed, ranked);
            }

            #[test]
            fn rendering_is_deterministic(matches in arb_matches(), criteria in arb_criteria()) {
                let ranked = Scorer::new().rank(&matches, &criteria);
                let presenter = Presenter::new();
                for format in FormatKind::ALL {
                    prop_assert_eq!(
                        presenter.format(&ranked, format).unwrap(),
                        presenter.format(&ranked, format).unwrap()
                    );
                }
            }
        }
    }
}
