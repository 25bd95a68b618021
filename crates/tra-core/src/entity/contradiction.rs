//! Contradiction records reported on a processed candidate

use serde::Serialize;

use crate::claim::{Claim, FactType};
use crate::normalize::FactKey;

/// What kind of disagreement was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContradictionKind {
    NameMismatch,
    EmailMismatch,
    SkillConflict,
    ExperienceConflict,
    LocationConflict,
    TimelineConflict,
    CompanyConflict,
    TitleConflict,
    /// Claims about one fact disagree
    FactConflict,
}

impl ContradictionKind {
    /// Kind for a disagreeing record field
    pub fn for_field(field: &str) -> Self {
        match field {
            "name" => Self::NameMismatch,
            "email" => Self::EmailMismatch,
            "skills" | "skill" => Self::SkillConflict,
            "experience" => Self::ExperienceConflict,
            "location" => Self::LocationConflict,
            "timeline" => Self::TimelineConflict,
            "company" => Self::CompanyConflict,
            "title" => Self::TitleConflict,
            _ => Self::FactConflict,
        }
    }

    /// Kind for disagreeing claims of one fact type
    pub fn for_fact(fact_type: &FactType) -> Self {
        match fact_type {
            FactType::Name => Self::NameMismatch,
            FactType::Email => Self::EmailMismatch,
            FactType::Skill => Self::SkillConflict,
            FactType::Role => Self::ExperienceConflict,
            FactType::Location => Self::LocationConflict,
            FactType::Company => Self::CompanyConflict,
            FactType::Title => Self::TitleConflict,
            _ => Self::FactConflict,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
}

/// One disagreement between two sources about a candidate
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Contradiction {
    pub contradiction_id: String,
    pub candidate_id: String,
    #[serde(rename = "contradiction_type")]
    pub kind: ContradictionKind,
    pub field_name: String,
    pub source_1_value: String,
    pub source_2_value: String,
    pub source_1_id: String,
    pub source_2_id: String,
    pub confidence_score: f64,
    pub severity: Severity,
    pub description: String,
}

/// Confidence attached to a field mismatch between two records
const FIELD_MISMATCH_CONFIDENCE: f64 = 0.8;

impl Contradiction {
    /// Two records of one cluster disagree on a field
    pub fn field_mismatch(
        candidate_id: &str,
        field: &str,
        (source_1_id, source_1_value): (&str, &str),
        (source_2_id, source_2_value): (&str, &str),
    ) -> Self {
        Self {
            contradiction_id: format!(
                "contradiction_{}_{}_{}_{}",
                candidate_id, field, source_1_id, source_2_id
            ),
            candidate_id: candidate_id.to_string(),
            kind: ContradictionKind::for_field(field),
            field_name: field.to_string(),
            source_1_value: source_1_value.to_string(),
            source_2_value: source_2_value.to_string(),
            source_1_id: source_1_id.to_string(),
            source_2_id: source_2_id.to_string(),
            confidence_score: FIELD_MISMATCH_CONFIDENCE,
            severity: Severity::Medium,
            description: format!(
                "Conflicting {}: '{}' vs '{}'",
                field, source_1_value, source_2_value
            ),
        }
    }

    /// A dissenting claim disagrees with its group's primary
    pub fn claim_conflict(candidate_id: &str, key: &FactKey, primary: &Claim, dissenter: &Claim) -> Self {
        let source_id = |claim: &Claim| {
            claim
                .sources
                .first()
                .map(|s| s.url.clone())
                .unwrap_or_else(|| claim.id.to_string())
        };
        let primary_value = primary.value.display();
        let dissenter_value = dissenter.value.display();

        Self {
            contradiction_id: format!(
                "contradiction_{}_{}_{}",
                candidate_id, key, dissenter.id.0
            ),
            candidate_id: candidate_id.to_string(),
            kind: ContradictionKind::for_fact(&primary.fact_type),
            field_name: primary.fact_type.as_key().to_string(),
            source_1_value: primary_value.clone(),
            source_2_value: dissenter_value.clone(),
            source_1_id: source_id(primary),
            source_2_id: source_id(dissenter),
            confidence_score: primary.confidence_score,
            severity: Severity::High,
            description: format!(
                "Conflicting {} for {}: '{}' vs '{}'",
                primary.fact_type,
                key.person(),
                primary_value,
                dissenter_value
            ),
        }
    }
}
