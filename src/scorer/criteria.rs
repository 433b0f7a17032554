//! Ranking criteria.
//!
//! Criteria are a closed, versioned set of options. Deserialization goes
//! through a raw mirror that rejects unknown keys, then validation.

use chrono::{DateTime, Utc};
use glob::Pattern;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result};
use crate::types::MatchSource;

/// Current criteria schema version.
pub const CRITERIA_VERSION: u32 = 1;

const DEFAULT_SEMANTIC_WEIGHT: f64 = 1.0;
const DEFAULT_FILESYSTEM_WEIGHT: f64 = 0.8;
const DEFAULT_RAW_SCORE: f64 = 0.5;
const DEFAULT_HALF_LIFE_DAYS: f64 = 30.0;

/// Largest accepted source weight.
pub const MAX_WEIGHT: f64 = 1_000.0;
/// Largest accepted magnitude for a path or recency boost.
pub const MAX_BOOST: f64 = 1_000.0;
/// Most path boosts one criteria set may carry.
pub const MAX_PATH_BOOSTS: usize = 256;

/// An additive boost for locations matching a glob.
#[derive(Debug, Clone)]
pub struct PathBoost {
    pattern: Pattern,
    boost: f64,
}

impl PathBoost {
    pub fn new(pattern: &str, boost: f64) -> Result<Self> {
        if !boost.is_finite() || boost.abs() > MAX_BOOST {
            return Err(Error::InvalidCriteria(format!(
                "boost for {:?} must be a number within [-{}, {}]",
                pattern, MAX_BOOST, MAX_BOOST
            )));
        }
        let pattern = Pattern::new(pattern).map_err(|e| {
            Error::InvalidCriteria(format!("invalid path pattern {:?}: {}", pattern, e))
        })?;
        Ok(Self { pattern, boost })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn boost(&self) -> f64 {
        self.boost
    }

    pub fn applies_to(&self, location: &str) -> bool {
        self.pattern.matches(location)
    }
}

impl PartialEq for PathBoost {
    fn eq(&self, other: &Self) -> bool {
        self.pattern.as_str() == other.pattern.as_str() && self.boost == other.boost
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawPathBoost {
    pattern: String,
    boost: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawCriteria {
    #[serde(default = "default_version")]
    version: u32,
    #[serde(default = "default_semantic_weight")]
    semantic_weight: f64,
    #[serde(default = "default_filesystem_weight")]
    filesystem_weight: f64,
    #[serde(default = "default_raw_score")]
    default_raw_score: f64,
    #[serde(default)]
    path_boosts: Vec<RawPathBoost>,
    #[serde(default)]
    recency_boost: f64,
    #[serde(default = "default_half_life")]
    recency_half_life_days: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    reference_time: Option<DateTime<Utc>>,
}

fn default_version() -> u32 {
    CRITERIA_VERSION
}

fn default_semantic_weight() -> f64 {
    DEFAULT_SEMANTIC_WEIGHT
}

fn default_filesystem_weight() -> f64 {
    DEFAULT_FILESYSTEM_WEIGHT
}

fn default_raw_score() -> f64 {
    DEFAULT_RAW_SCORE
}

fn default_half_life() -> f64 {
    DEFAULT_HALF_LIFE_DAYS
}

fn too_many_path_boosts() -> Error {
    Error::InvalidCriteria(format!("at most {} path_boosts are allowed", MAX_PATH_BOOSTS))
}

/// Options controlling how matches are ranked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawCriteria", into = "RawCriteria")]
pub struct Criteria {
    semantic_weight: f64,
    filesystem_weight: f64,
    default_raw_score: f64,
    path_boosts: Vec<PathBoost>,
    recency_boost: f64,
    recency_half_life_days: f64,
    reference_time: Option<DateTime<Utc>>,
}

impl Default for Criteria {
    fn default() -> Self {
        Self {
            semantic_weight: DEFAULT_SEMANTIC_WEIGHT,
            filesystem_weight: DEFAULT_FILESYSTEM_WEIGHT,
            default_raw_score: DEFAULT_RAW_SCORE,
            path_boosts: Vec::new(),
            recency_boost: 0.0,
            recency_half_life_days: DEFAULT_HALF_LIFE_DAYS,
            reference_time: None,
        }
    }
}

impl TryFrom<RawCriteria> for Criteria {
    type Error = Error;

    fn try_from(raw: RawCriteria) -> Result<Self> {
        if raw.version != CRITERIA_VERSION {
            return Err(Error::InvalidCriteria(format!(
                "unsupported criteria version {} (expected {})",
                raw.version, CRITERIA_VERSION
            )));
        }

        if raw.path_boosts.len() > MAX_PATH_BOOSTS {
            return Err(too_many_path_boosts());
        }
        let path_boosts = raw
            .path_boosts
            .iter()
            .map(|b| PathBoost::new(&b.pattern, b.boost))
            .collect::<Result<Vec<_>>>()?;

        Criteria {
            path_boosts,
            reference_time: raw.reference_time,
            ..Criteria::default()
        }
        .with_source_weight(MatchSource::SemanticIndex, raw.semantic_weight)?
        .with_source_weight(MatchSource::Filesystem, raw.filesystem_weight)?
        .with_default_raw_score(raw.default_raw_score)?
        .with_recency(raw.recency_boost, raw.recency_half_life_days)
    }
}

impl From<Criteria> for RawCriteria {
    fn from(criteria: Criteria) -> Self {
        Self {
            version: CRITERIA_VERSION,
            semantic_weight: criteria.semantic_weight,
            filesystem_weight: criteria.filesystem_weight,
            default_raw_score: criteria.default_raw_score,
            path_boosts: criteria
                .path_boosts
                .iter()
                .map(|b| RawPathBoost {
                    pattern: b.pattern().to_string(),
                    boost: b.boost,
                })
                .collect(),
            recency_boost: criteria.recency_boost,
            recency_half_life_days: criteria.recency_half_life_days,
            reference_time: criteria.reference_time,
        }
    }
}

impl Criteria {
    /// Parse criteria from a JSON value; `null` yields the defaults.
    pub fn from_value(value: &Value) -> Result<Self> {
        if value.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(value.clone()).map_err(|e| Error::InvalidCriteria(e.to_string()))
    }

    pub fn with_source_weight(mut self, source: MatchSource, weight: f64) -> Result<Self> {
        if !(0.0..=MAX_WEIGHT).contains(&weight) {
            return Err(Error::InvalidCriteria(format!(
                "{} weight must be within [0, {}]",
                source, MAX_WEIGHT
            )));
        }
        match source {
            MatchSource::SemanticIndex => self.semantic_weight = weight,
            MatchSource::Filesystem => self.filesystem_weight = weight,
        }
        Ok(self)
    }

    pub fn with_default_raw_score(mut self, score: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&score) {
            return Err(Error::InvalidCriteria(
                "default_raw_score must be within [0, 1]".to_string(),
            ));
        }
        self.default_raw_score = score;
        Ok(self)
    }

    pub fn with_path_boost(mut self, pattern: &str, boost: f64) -> Result<Self> {
        if self.path_boosts.len() >= MAX_PATH_BOOSTS {
            return Err(too_many_path_boosts());
        }
        self.path_boosts.push(PathBoost::new(pattern, boost)?);
        Ok(self)
    }

    pub fn with_recency(mut self, boost: f64, half_life_days: f64) -> Result<Self> {
        if !boost.is_finite() || boost.abs() > MAX_BOOST {
            return Err(Error::InvalidCriteria(format!(
                "recency_boost must be within [-{}, {}]",
                MAX_BOOST, MAX_BOOST
            )));
        }
        if !half_life_days.is_finite() || half_life_days <= 0.0 {
            return Err(Error::InvalidCriteria(
                "recency_half_life_days must be a positive number".to_string(),
            ));
        }
        self.recency_boost = boost;
        self.recency_half_life_days = half_life_days;
        Ok(self)
    }

    pub fn with_reference_time(mut self, reference_time: DateTime<Utc>) -> Self {
        self.reference_time = Some(reference_time);
        self
    }

    pub fn source_weight(&self, source: MatchSource) -> f64 {
        match source {
            MatchSource::SemanticIndex => self.semantic_weight,
            MatchSource::Filesystem => self.filesystem_weight,
        }
    }

    pub fn default_raw_score(&self) -> f64 {
        self.default_raw_score
    }

    pub fn path_boosts(&self) -> &[PathBoost] {
        &self.path_boosts
    }

    pub fn recency_boost(&self) -> f64 {
        self.recency_boost
    }

    pub fn recency_half_life_days(&self) -> f64 {
        self.recency_half_life_days
    }

    pub fn reference_time(&self) -> Option<DateTime<Utc>> {
        self.reference_time
    }

    /// Whether recency is enabled but has no reference time yet.
    pub fn needs_reference_time(&self) -> bool {
        self.recency_boost != 0.0 && self.reference_time.is_none()
    }
}
