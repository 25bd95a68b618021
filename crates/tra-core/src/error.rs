//! Error types for the resolution engine

use serde::Serialize;
use thiserror::Error;

/// A single claim or record was malformed and has been rejected.
///
/// Rejection is per item: the rest of the batch keeps going.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("invalid item '{item_id}': {reason}")]
pub struct ValidationError {
    pub item_id: String,
    pub reason: String,
}

impl ValidationError {
    pub fn new(item_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            reason: reason.into(),
        }
    }
}

/// Process-wide configuration is unusable. Fatal at start-up.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("index weights sum to {sum}, expected 1.0")]
    WeightSum { sum: f64 },

    #[error("{name} must lie in [0, 1], got {value}")]
    OutOfRange { name: String, value: f64 },

    #[error("no authority score configured for source type '{0}'")]
    MissingAuthority(String),

    #[error("min_sources_for_auto_merge must be at least 1")]
    MinSources,

    #[error("invalid configuration document: {0}")]
    Parse(String),
}

/// Failures scoped to one candidate's resolution run.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ResolutionError {
    /// No usable records or claims. Still yields a zero-confidence candidate.
    #[error("candidate '{candidate_id}' has no usable records")]
    InsufficientData { candidate_id: String },

    /// An index component escaped [0, 1]
    #[error("candidate '{candidate_id}': {dimension} score {value} outside [0, 1]")]
    ScoreOutOfRange {
        candidate_id: String,
        dimension: &'static str,
        value: f64,
    },

    #[error("resolution of candidate '{candidate_id}' was cancelled")]
    Cancelled { candidate_id: String },

    #[error("resolution of candidate '{candidate_id}' timed out after {millis}ms")]
    TimedOut { candidate_id: String, millis: u64 },
}

impl ResolutionError {
    pub fn candidate_id(&self) -> &str {
        match self {
            Self::InsufficientData { candidate_id }
            | Self::ScoreOutOfRange { candidate_id, .. }
            | Self::Cancelled { candidate_id }
            | Self::TimedOut { candidate_id, .. } => candidate_id,
        }
    }
}

/// Attributable rejection reported next to successful results
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ItemError {
    pub item_id: String,
    pub error: String,
}

impl From<ValidationError> for ItemError {
    fn from(err: ValidationError) -> Self {
        Self {
            item_id: err.item_id.clone(),
            error: err.to_string(),
        }
    }
}

impl From<ResolutionError> for ItemError {
    fn from(err: ResolutionError) -> Self {
        Self {
            item_id: err.candidate_id().to_string(),
            error: err.to_string(),
        }
    }
}
