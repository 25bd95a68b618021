//! Confidence scoring for claim groups
//!
//! Multi-factor confidence calculation:
//! - Source authority (highest authority attached, weight 0.4)
//! - Corroboration (distinct source types over all known types, weight 0.3)
//! - Extraction confidence (mean per-claim extractor confidence, weight 0.2)
//! - Recency (most recent dated claim, weight 0.1)
//!
//! Scores are a pure function of the group's contents; callers rescore
//! whenever membership changes.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;

use super::temporal::RecencyScorer;
use crate::claim::{Claim, SourceType};
use crate::config::EngineConfig;

const AUTHORITY_WEIGHT: f64 = 0.4;
const CORROBORATION_WEIGHT: f64 = 0.3;
const EXTRACTION_WEIGHT: f64 = 0.2;
const RECENCY_WEIGHT: f64 = 0.1;

/// Every factor of a confidence score, for explanation and tests
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ConfidenceBreakdown {
    pub source_authority: f64,
    pub corroboration: f64,
    pub extraction_confidence: f64,
    pub recency: f64,
    pub score: f64,
}

impl ConfidenceBreakdown {
    fn empty() -> Self {
        Self {
            source_authority: 0.0,
            corroboration: 0.0,
            extraction_confidence: 0.0,
            recency: 0.0,
            score: 0.0,
        }
    }
}

/// Mean extractor confidence of one claim's sources
pub fn claim_extraction_confidence(claim: &Claim) -> f64 {
    if claim.sources.is_empty() {
        return 0.0;
    }
    claim
        .sources
        .iter()
        .map(|s| s.extraction_confidence)
        .sum::<f64>()
        / claim.sources.len() as f64
}

/// Confidence scorer over one engine configuration
pub struct ConfidenceScorer<'a> {
    config: &'a EngineConfig,
    recency: RecencyScorer,
}

impl<'a> ConfidenceScorer<'a> {
    pub fn new(config: &'a EngineConfig, today: NaiveDate) -> Self {
        Self {
            config,
            recency: RecencyScorer::new(config.recency, today),
        }
    }

    /// Score a group of claims (a singleton is a group of one)
    pub fn score(&self, claims: &[&Claim]) -> ConfidenceBreakdown {
        if claims.is_empty() {
            return ConfidenceBreakdown::empty();
        }

        let source_authority = self.source_authority(claims);
        let corroboration = self.corroboration(claims);
        let extraction_confidence = self.extraction_confidence(claims);
        let recency = self
            .recency
            .recency_score(self.recency.most_recent(claims.iter().copied()));

        let total = AUTHORITY_WEIGHT * source_authority
            + CORROBORATION_WEIGHT * corroboration
            + EXTRACTION_WEIGHT * extraction_confidence
            + RECENCY_WEIGHT * recency;

        ConfidenceBreakdown {
            source_authority,
            corroboration,
            extraction_confidence,
            recency,
            score: total.clamp(0.0, 1.0),
        }
    }

    /// Highest authority across every source attached to the group
    fn source_authority(&self, claims: &[&Claim]) -> f64 {
        claims
            .iter()
            .flat_map(|c| c.sources.iter())
            .map(|s| self.config.authority(s.source_type))
            .fold(0.0, f64::max)
    }

    /// Distinct source types over all source types the system knows
    fn corroboration(&self, claims: &[&Claim]) -> f64 {
        let distinct: HashSet<SourceType> = claims
            .iter()
            .flat_map(|c| c.sources.iter())
            .map(|s| s.source_type)
            .collect();
        distinct.len() as f64 / self.config.known_source_types() as f64
    }

    fn extraction_confidence(&self, claims: &[&Claim]) -> f64 {
        claims
            .iter()
            .map(|c| claim_extraction_confidence(c))
            .sum::<f64>()
            / claims.len() as f64
    }
}
