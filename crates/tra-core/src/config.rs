//! Process-wide engine configuration
//!
//! Loaded once, validated once, then shared read-only by every
//! resolution run.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::claim::SourceType;
use crate::error::ConfigError;
use crate::fuzzy::SimilarityMetric;

/// Allowed drift of the index weight sum from 1.0
pub const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Weights of the five index dimensions. Must sum to 1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct IndexWeights {
    pub innovation: f64,
    pub adoption: f64,
    pub influence: f64,
    pub velocity: f64,
    pub selectivity: f64,
}

impl Default for IndexWeights {
    fn default() -> Self {
        Self {
            innovation: 0.25,
            adoption: 0.20,
            influence: 0.25,
            velocity: 0.15,
            selectivity: 0.15,
        }
    }
}

impl IndexWeights {
    pub fn sum(&self) -> f64 {
        self.innovation + self.adoption + self.influence + self.velocity + self.selectivity
    }

    fn entries(&self) -> [(&'static str, f64); 5] {
        [
            ("weights.innovation", self.innovation),
            ("weights.adoption", self.adoption),
            ("weights.influence", self.influence),
            ("weights.velocity", self.velocity),
            ("weights.selectivity", self.selectivity),
        ]
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in self.entries() {
            check_unit(name, value)?;
        }
        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(ConfigError::WeightSum { sum });
        }
        Ok(())
    }
}

/// Recency decay for the confidence scorer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecencyConfig {
    /// Days over which recency decays linearly from 1.0
    pub window_days: f64,
    /// Lowest recency any dated claim can get
    pub floor: f64,
    /// Recency of a group with no dated claim
    pub undated: f64,
}

impl Default for RecencyConfig {
    fn default() -> Self {
        Self {
            window_days: 365.0,
            floor: 0.1,
            undated: 0.5,
        }
    }
}

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub weights: IndexWeights,
    pub source_authority: BTreeMap<SourceType, f64>,
    /// Similarity at which two identifying fields count as the same
    pub fuzzy_match_threshold: f64,
    /// Distinct sources a group needs before it merges without review
    pub min_sources_for_auto_merge: usize,
    /// Authority at which a lone source is trusted on its own
    pub high_authority_threshold: f64,
    /// Stricter bar under which two records' fields count as disagreeing
    pub field_contradiction_threshold: f64,
    pub similarity_metric: SimilarityMetric,
    pub recency: RecencyConfig,
    /// Multiplier for clusters that carry no identifying field
    pub unidentified_penalty: f64,
    /// Claim cards under this confidence are flagged for review
    pub review_confidence_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights: IndexWeights::default(),
            source_authority: SourceType::ALL
                .iter()
                .map(|t| (*t, t.default_authority()))
                .collect(),
            fuzzy_match_threshold: 0.8,
            min_sources_for_auto_merge: 2,
            high_authority_threshold: 0.9,
            field_contradiction_threshold: 0.9,
            similarity_metric: SimilarityMetric::default(),
            recency: RecencyConfig::default(),
            unidentified_penalty: 0.5,
            review_confidence_threshold: 0.7,
        }
    }
}

impl EngineConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json(input: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Authority score of a source type
    pub fn authority(&self, source_type: SourceType) -> f64 {
        self.source_authority
            .get(&source_type)
            .copied()
            .unwrap_or_else(|| source_type.default_authority())
    }

    /// Number of source types corroboration is measured against
    pub fn known_source_types(&self) -> usize {
        SourceType::ALL.len()
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.weights.validate()?;

        for source_type in SourceType::ALL {
            match self.source_authority.get(&source_type) {
                Some(score) => check_unit(&format!("authority.{}", source_type), *score)?,
                None => return Err(ConfigError::MissingAuthority(source_type.to_string())),
            }
        }

        check_unit("fuzzy_match_threshold", self.fuzzy_match_threshold)?;
        check_unit("high_authority_threshold", self.high_authority_threshold)?;
        check_unit(
            "field_contradiction_threshold",
            self.field_contradiction_threshold,
        )?;
        check_unit("unidentified_penalty", self.unidentified_penalty)?;
        check_unit(
            "review_confidence_threshold",
            self.review_confidence_threshold,
        )?;
        check_unit("recency.floor", self.recency.floor)?;
        check_unit("recency.undated", self.recency.undated)?;

        if self.recency.window_days <= 0.0 || !self.recency.window_days.is_finite() {
            return Err(ConfigError::OutOfRange {
                name: "recency.window_days".into(),
                value: self.recency.window_days,
            });
        }
        if self.min_sources_for_auto_merge == 0 {
            return Err(ConfigError::MinSources);
        }

        Ok(())
    }
}

fn check_unit(name: &str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name: name.to_string(),
            value,
        })
    }
}
