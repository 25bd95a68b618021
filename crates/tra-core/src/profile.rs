//! Profile composition: reviewer-facing view of a processed candidate

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::claim::{Claim, ClaimId, ClaimTable, ClaimValue, FactType, SourceType};
use crate::config::EngineConfig;
use crate::pipeline::ProcessedCandidate;

/// Claims at or above this confidence count as high confidence
pub const HIGH_CONFIDENCE: f64 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Citation {
    pub url: String,
    pub title: String,
    pub source_type: SourceType,
    pub credibility_score: f64,
}

/// A dissenting claim as shown next to the asserted one
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DissentSummary {
    pub claim_text: String,
    pub value: String,
    pub confidence_score: f64,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClaimCard {
    pub id: ClaimId,
    pub claim_text: String,
    pub claim_type: FactType,
    pub value: ClaimValue,
    pub confidence_score: f64,
    pub citations: Vec<Citation>,
    pub supporting_snippets: Vec<String>,
    pub contradictory_claims: Vec<DissentSummary>,
    pub needs_human_review: bool,
    pub temporal_context: Option<NaiveDate>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineEvent {
    pub date: NaiveDate,
    pub event: String,
    #[serde(rename = "type")]
    pub fact_type: FactType,
    pub confidence: f64,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    pub candidate_id: String,
    pub name: String,
    /// Mean confidence of the asserted claims
    pub confidence_score: f64,
    pub summary: String,
    pub claim_cards: Vec<ClaimCard>,
    pub timeline: Vec<TimelineEvent>,
    pub sources_searched: Vec<SourceType>,
    pub total_claims: usize,
    pub high_confidence_claims: usize,
    pub conflicting_claims: usize,
    pub human_review_required: bool,
}

fn urls(claim: &Claim) -> Vec<String> {
    claim.sources.iter().map(|s| s.url.clone()).collect()
}

/// Builds [`Profile`]s from processed candidates
pub struct ProfileComposer<'a> {
    config: &'a EngineConfig,
}

impl<'a> ProfileComposer<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    fn needs_review(&self, claim: &Claim) -> bool {
        claim.confidence_score < self.config.review_confidence_threshold
            || claim.has_contradictions()
            || claim.human_review_needed
    }

    pub fn claim_card(&self, claim: &Claim, table: &ClaimTable) -> ClaimCard {
        ClaimCard {
            id: claim.id,
            claim_text: claim.fact_text.clone(),
            claim_type: claim.fact_type.clone(),
            value: claim.value.clone(),
            confidence_score: claim.confidence_score,
            citations: claim
                .sources
                .iter()
                .map(|s| Citation {
                    url: s.url.clone(),
                    title: s.title.clone(),
                    source_type: s.source_type,
                    credibility_score: s.authority_score,
                })
                .collect(),
            supporting_snippets: claim.supporting_snippets.clone(),
            contradictory_claims: table
                .resolve(&claim.contradictions)
                .map(|c| DissentSummary {
                    claim_text: c.fact_text.clone(),
                    value: c.value.display(),
                    confidence_score: c.confidence_score,
                    sources: urls(c),
                })
                .collect(),
            needs_human_review: self.needs_review(claim),
            temporal_context: claim.temporal_context,
            notes: claim.notes.clone(),
        }
    }

    /// Dated claims, oldest first
    pub fn timeline<'c>(&self, claims: impl IntoIterator<Item = &'c Claim>) -> Vec<TimelineEvent> {
        let mut events: Vec<TimelineEvent> = claims
            .into_iter()
            .filter_map(|claim| {
                Some(TimelineEvent {
                    date: claim.temporal_context?,
                    event: claim.fact_text.clone(),
                    fact_type: claim.fact_type.clone(),
                    confidence: claim.confidence_score,
                    sources: urls(claim),
                })
            })
            .collect();
        events.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.event.cmp(&b.event)));
        events
    }

    /// Plain-text overview of roles, publications and patents
    pub fn summary(&self, name: &str, claims: &[&Claim]) -> String {
        let of_type = |t: FactType| claims.iter().filter(move |c| c.fact_type == t);
        let mut parts = vec![format!("Profile Summary for {}:", name)];

        let roles: BTreeSet<String> = of_type(FactType::Role)
            .filter_map(|c| {
                let role = match &c.value {
                    ClaimValue::Text(s) => Some(s.as_str()),
                    value => value.field("role"),
                }?;
                Some(match c.value.field("organization").or_else(|| c.value.field("org")) {
                    Some(org) if !org.is_empty() => format!("{} at {}", role, org),
                    _ => role.to_string(),
                })
            })
            .collect();
        if !roles.is_empty() {
            parts.push(format!("Roles: {}", roles.into_iter().collect::<Vec<_>>().join(", ")));
        }

        let publications = of_type(FactType::Publication).count();
        if publications > 0 {
            parts.push(format!("Publications: {} publications", publications));
            let journals: BTreeSet<&str> = of_type(FactType::Publication)
                .filter_map(|c| c.value.field("journal"))
                .filter(|j| !j.is_empty())
                .collect();
            if !journals.is_empty() {
                parts.push(format!(
                    "Published in: {}",
                    journals.into_iter().collect::<Vec<_>>().join(", ")
                ));
            }
        }

        let patents = of_type(FactType::Patent).count();
        if patents > 0 {
            parts.push(format!("Patents: {} patents as inventor", patents));
        }

        let best_count = of_type(FactType::PatentCount)
            .max_by(|a, b| a.confidence_score.total_cmp(&b.confidence_score))
            .and_then(|c| c.value.as_number());
        if let Some(count) = best_count {
            parts.push(format!("Patent Count: {} patents", count));
        }

        parts.join("\n")
    }

    pub fn compose(&self, candidate: &ProcessedCandidate) -> Profile {
        let primaries: Vec<&Claim> = candidate.claims.primaries().collect();
        let table = &candidate.claims.table;

        let name = candidate
            .resolved_identity
            .name()
            .or_else(|| primaries.first().map(|c| c.person.clone()))
            .unwrap_or_else(|| candidate.candidate_id.clone());

        let total_claims = primaries.len();
        let confidence_score = if total_claims == 0 {
            0.0
        } else {
            primaries.iter().map(|c| c.confidence_score).sum::<f64>() / total_claims as f64
        };

        Profile {
            candidate_id: candidate.candidate_id.clone(),
            summary: self.summary(&name, &primaries),
            name,
            confidence_score,
            claim_cards: primaries.iter().map(|c| self.claim_card(c, table)).collect(),
            timeline: self.timeline(primaries.iter().copied()),
            sources_searched: candidate.source_types(),
            total_claims,
            high_confidence_claims: primaries
                .iter()
                .filter(|c| c.confidence_score >= HIGH_CONFIDENCE)
                .count(),
            conflicting_claims: primaries.iter().filter(|c| c.has_contradictions()).count(),
            human_review_required: total_claims == 0 || primaries.iter().any(|c| self.needs_review(c)),
        }
    }
}
