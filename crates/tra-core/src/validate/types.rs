//! Resolution types

use serde::Serialize;

use crate::claim::ClaimId;
use crate::normalize::FactKey;

/// How a fact-key group was resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionKind {
    /// Only one claim asserts this fact
    Singleton,
    /// Several claims agree and were merged into one
    Corroborated,
    /// Claims disagree; a primary was elected
    Contradicted,
}

impl ResolutionKind {
    /// Whether this kind can be settled without a reviewer
    pub fn is_auto_resolvable(&self) -> bool {
        !matches!(self, Self::Contradicted)
    }

    /// Suggested presentation strategy
    pub fn resolution_strategy(&self) -> &'static str {
        match self {
            Self::Singleton => "show_single_source",
            Self::Corroborated => "show_all_sources",
            Self::Contradicted => "flag_for_review",
        }
    }
}

impl std::fmt::Display for ResolutionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Singleton => write!(f, "singleton"),
            Self::Corroborated => write!(f, "corroborated"),
            Self::Contradicted => write!(f, "contradicted"),
        }
    }
}

/// Outcome for one fact-key group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupResolution {
    pub key: FactKey,
    pub kind: ResolutionKind,
    /// The surviving claim asserting the group's value
    pub primary: ClaimId,
    /// Dissenting claims (empty unless contradicted)
    pub contradictions: Vec<ClaimId>,
    /// Duplicates folded into the primary
    pub merged: Vec<ClaimId>,
    pub confidence: f64,
    pub human_review_needed: bool,
}

impl GroupResolution {
    pub fn strategy(&self) -> &'static str {
        if self.human_review_needed && self.kind.is_auto_resolvable() {
            "human_review"
        } else {
            self.kind.resolution_strategy()
        }
    }
}

/// Counters across all groups of one resolution run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionSummary {
    pub total_groups: usize,
    pub auto_resolved: usize,
    pub review_required: usize,
    pub contradicted: usize,
}

impl ResolutionSummary {
    pub(crate) fn record(&mut self, group: &GroupResolution) {
        self.total_groups += 1;
        if group.human_review_needed {
            self.review_required += 1;
        } else {
            self.auto_resolved += 1;
        }
        if group.kind == ResolutionKind::Contradicted {
            self.contradicted += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_contradictions_need_a_reviewer_by_kind() {
        assert!(ResolutionKind::Singleton.is_auto_resolvable());
        assert!(ResolutionKind::Corroborated.is_auto_resolvable());
        assert!(!ResolutionKind::Contradicted.is_auto_resolvable());
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&ResolutionKind::Corroborated).unwrap();
        assert_eq!(json, "\"corroborated\"");
        assert_eq!(ResolutionKind::Contradicted.to_string(), "contradicted");
    }
}
