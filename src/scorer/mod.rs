//! Scorer - assigns relevance scores and produces a stable ranking.
//!
//! ```text
//! score = clamp(raw_score | default_raw_score, 0, 1) * weight(source)
//!       + sum(boost for each path boost matching the location)
//!       + recency_boost * 0.5 ^ (age_days / half_life_days)
//! ```
//!
//! Ranking is a pure function of its inputs: score descending, then source
//! precedence, then location ascending.

pub mod criteria;

use chrono::{DateTime, Utc};
use std::cmp::Ordering;

use crate::types::{Match, ScoredMatch};

pub use criteria::{Criteria, PathBoost, CRITERIA_VERSION};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Stateless ranker.
#[derive(Debug, Clone, Copy, Default)]
pub struct Scorer;

impl Scorer {
    pub fn new() -> Self {
        Self
    }

    /// Score and sort matches. The input is left untouched.
    pub fn rank(&self, matches: &[Match], criteria: &Criteria) -> Vec<ScoredMatch> {
        let mut ranked: Vec<ScoredMatch> = matches
            .iter()
            .map(|item| ScoredMatch {
                score: self.score(item, criteria),
                item: item.clone(),
            })
            .collect();

        ranked.sort_by(compare_ranked);
        ranked
    }

    /// Score a single match.
    pub fn score(&self, item: &Match, criteria: &Criteria) -> f64 {
        let base = item
            .raw_score
            .filter(|score| score.is_finite())
            .unwrap_or(criteria.default_raw_score())
            .clamp(0.0, 1.0);
        let weighted = base * criteria.source_weight(item.source);

        let boosts: f64 = criteria
            .path_boosts()
            .iter()
            .filter(|b| b.applies_to(&item.location))
            .map(PathBoost::boost)
            .sum();

        // Bounded criteria keep this finite; the clamp keeps json output parseable.
        (weighted + boosts + recency(item, criteria)).clamp(f64::MIN, f64::MAX)
    }
}

fn recency(item: &Match, criteria: &Criteria) -> f64 {
    let boost = criteria.recency_boost();
    if boost == 0.0 {
        return 0.0;
    }
    match (criteria.reference_time(), item.modified_at) {
        (Some(now), Some(modified)) => {
            let age = age_days(now, modified);
            boost * 0.5f64.powf(age / criteria.recency_half_life_days())
        }
        _ => 0.0,
    }
}

fn age_days(now: DateTime<Utc>, modified: DateTime<Utc>) -> f64 {
    let seconds = (now - modified).num_milliseconds() as f64 / 1000.0;
    (seconds / SECONDS_PER_DAY).max(0.0)
}

fn compare_ranked(a: &ScoredMatch, b: &ScoredMatch) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.item.source.cmp(&b.item.source))
        .then_with(|| a.item.location.cmp(&b.item.location))
}

#[cfg(test)]
pub(crate) mod strategies {
    //! Proptest generators for ranking criteria.

    use super::criteria::{MAX_BOOST, MAX_WEIGHT};
    use super::Criteria;
    use crate::types::strategies::arb_time;
    use crate::types::MatchSource;
    use proptest::prelude::*;

    const PATTERNS: [&str; 4] = ["*", "src/**", "**/*.md", "a*"];

    fn arb_weight() -> impl Strategy<Value = f64> {
        prop_oneof![0.0f64..=2.0, Just(0.0), Just(MAX_WEIGHT)]
    }

    fn arb_boost() -> impl Strategy<Value = f64> {
        prop_oneof![-1.0f64..=1.0, Just(MAX_BOOST), Just(-MAX_BOOST)]
    }

    /// Valid criteria, including values at the accepted limits.
    pub fn arb_criteria() -> impl Strategy<Value = Criteria> {
        (
            arb_weight(),
            arb_weight(),
            0.0f64..=1.0,
            proptest::collection::vec((0..PATTERNS.len(), arb_boost()), 0..4),
            arb_boost(),
            0.5f64..=90.0,
            proptest::option::of(arb_time()),
        )
            .prop_map(
                |(semantic, filesystem, default_raw, boosts, recency, half_life, now)| {
                    let mut criteria = Criteria::default()
                        .with_source_weight(MatchSource::SemanticIndex, semantic)
                        .unwrap()
                        .with_source_weight(MatchSource::Filesystem, filesystem)
                        .unwrap()
                        .with_default_raw_score(default_raw)
                        .unwrap()
                        .with_recency(recency, half_life)
                        .unwrap();
                    for (pattern, boost) in boosts {
                        criteria = criteria.with_path_boost(PATTERNS[pattern], boost).unwrap();
                    }
                    match now {
                        Some(now) => criteria.with_reference_time(now),
                        None => criteria,
                    }
                },
            )
    }
}
