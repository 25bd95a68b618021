//! Contradiction resolution over fact-key groups
//!
//! Every group collapses to one asserted claim. Agreeing claims are merged
//! into a survivor; disagreeing claims elect a primary and hang the rest
//! off it as contradictions. Provenance is never dropped: the survivor
//! carries every source of its group and is scored over all of them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

use super::confidence::ConfidenceScorer;
use super::types::{GroupResolution, ResolutionKind, ResolutionSummary};
use crate::claim::{Claim, ClaimId, ClaimTable, RawClaim, SourceType};
use crate::config::EngineConfig;
use crate::error::ItemError;
use crate::group::{group_by_fact_key, ClaimGroup};
use crate::normalize::ClaimNormalizer;

/// Note attached to lone low-authority claims
pub const SINGLE_SOURCE_NOTE: &str = "Single source claim - requires human review";

fn contradiction_note(dissenters: usize) -> String {
    format!(
        "Sources disagree; {} contradictory claims found. See evidence for details.",
        dissenters
    )
}

/// Claims of one run, with the outcome of every group
#[derive(Debug, Clone, Default, Serialize)]
pub struct ResolvedClaims {
    /// Every claim of the run; groups and contradictions index into it
    pub table: ClaimTable,
    pub groups: Vec<GroupResolution>,
    pub summary: ResolutionSummary,
}

impl ResolvedClaims {
    /// One asserted claim per fact key, in key order
    pub fn primaries(&self) -> impl Iterator<Item = &Claim> {
        self.groups.iter().filter_map(|g| self.table.get(g.primary))
    }

    /// Total dissenting claims across all groups
    pub fn contradiction_count(&self) -> usize {
        self.groups.iter().map(|g| g.contradictions.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }
}

/// Ordering used to elect a group's primary claim.
///
/// Higher confidence first, then more sources, then the earliest
/// extraction. Value and id close any remaining tie so the outcome never
/// depends on input order.
fn election_order(a: &Claim, b: &Claim) -> Ordering {
    b.confidence_score
        .total_cmp(&a.confidence_score)
        .then_with(|| b.sources.len().cmp(&a.sources.len()))
        .then_with(|| a.earliest_extraction_ms().cmp(&b.earliest_extraction_ms()))
        .then_with(|| a.value.normalized().cmp(&b.value.normalized()))
        .then_with(|| a.id.cmp(&b.id))
}

/// Resolves contradictions within each fact-key group
pub struct ContradictionResolver<'a> {
    config: &'a EngineConfig,
    scorer: ConfidenceScorer<'a>,
}

impl<'a> ContradictionResolver<'a> {
    pub fn new(config: &'a EngineConfig, today: NaiveDate) -> Self {
        Self {
            config,
            scorer: ConfidenceScorer::new(config, today),
        }
    }

    /// Resolve a candidate's normalized claims
    pub fn resolve(&self, claims: Vec<Claim>) -> ResolvedClaims {
        let mut table = ClaimTable::new();
        for mut claim in claims {
            claim.confidence_score = self.scorer.score(&[&claim]).score;
            table.insert(claim);
        }

        let mut groups = Vec::new();
        let mut summary = ResolutionSummary::default();

        for group in group_by_fact_key(&table) {
            if let Some(resolution) = self.resolve_group(&mut table, group) {
                debug!(
                    key = %resolution.key,
                    kind = %resolution.kind,
                    confidence = resolution.confidence,
                    review = resolution.human_review_needed,
                    "group resolved"
                );
                summary.record(&resolution);
                groups.push(resolution);
            }
        }

        ResolvedClaims {
            table,
            groups,
            summary,
        }
    }

    fn resolve_group(&self, table: &mut ClaimTable, group: ClaimGroup) -> Option<GroupResolution> {
        // Snapshot of the original group, before any survivor absorbs provenance
        let mut members: Vec<Claim> = table.resolve(&group.members).cloned().collect();
        members.sort_by(election_order);

        let primary_id = members.first()?.id;
        let others: Vec<ClaimId> = members.iter().skip(1).map(|c| c.id).collect();

        let values: BTreeSet<String> = members.iter().map(|c| c.value.normalized()).collect();
        let kind = match (members.len(), values.len()) {
            (1, _) => ResolutionKind::Singleton,
            (_, 1) => ResolutionKind::Corroborated,
            _ => ResolutionKind::Contradicted,
        };

        let refs: Vec<&Claim> = members.iter().collect();
        let confidence = self.scorer.score(&refs).score;

        let primary = table.get_mut(primary_id)?;
        for other in members.iter().skip(1) {
            primary.absorb_provenance(other);
        }
        primary.confidence_score = confidence;

        let (contradictions, merged) = match kind {
            ResolutionKind::Contradicted => {
                primary.contradictions = others.clone();
                primary.human_review_needed = true;
                primary.notes.push(contradiction_note(others.len()));
                (others, Vec::new())
            }
            _ => {
                self.apply_single_source_policy(primary);
                (Vec::new(), others)
            }
        };

        Some(GroupResolution {
            key: group.key,
            kind,
            primary: primary_id,
            contradictions,
            merged,
            confidence,
            human_review_needed: primary.human_review_needed,
        })
    }

    /// Accept thinly sourced claims only from high-authority outlets
    fn apply_single_source_policy(&self, claim: &mut Claim) {
        let distinct: HashSet<(SourceType, &str)> = claim
            .sources
            .iter()
            .map(|s| (s.source_type, s.url.as_str()))
            .collect();
        if distinct.len() >= self.config.min_sources_for_auto_merge {
            return;
        }
        if claim.max_authority() >= self.config.high_authority_threshold {
            return;
        }
        claim.human_review_needed = true;
        if !claim.notes.iter().any(|n| n == SINGLE_SOURCE_NOTE) {
            claim.notes.push(SINGLE_SOURCE_NOTE.to_string());
        }
    }
}

/// JSON input of [`resolve_claims_json`]
#[derive(Debug, Deserialize)]
pub struct ResolveInput {
    pub claims: Vec<RawClaim>,
    #[serde(default)]
    pub config: Option<EngineConfig>,
    /// Reference date for recency; defaults to the current UTC date
    #[serde(default)]
    pub today: Option<NaiveDate>,
}

/// JSON output of [`resolve_claims_json`]
#[derive(Debug, Serialize)]
pub struct ResolveOutput {
    #[serde(flatten)]
    pub resolved: ResolvedClaims,
    pub rejected: Vec<ItemError>,
}

/// Resolve a JSON batch of raw claims (string in, string out)
pub fn resolve_claims_json(input: &str) -> String {
    let parsed: ResolveInput = match serde_json::from_str(input) {
        Ok(v) => v,
        Err(e) => {
            return format!(
                r#"{{"error":"invalid resolve input: {}"}}"#,
                e.to_string().replace('"', "\\\"")
            );
        }
    };

    let config = parsed.config.unwrap_or_default();
    if let Err(e) = config.validate() {
        return format!(
            r#"{{"error":"invalid configuration: {}"}}"#,
            e.to_string().replace('"', "\\\"")
        );
    }
    let today = parsed
        .today
        .unwrap_or_else(|| chrono::Utc::now().date_naive());

    let (claims, rejected) = ClaimNormalizer::new(&config).normalize_all(parsed.claims);
    let output = ResolveOutput {
        resolved: ContradictionResolver::new(&config, today).resolve(claims),
        rejected: rejected.into_iter().map(ItemError::from).collect(),
    };

    match serde_json::to_string(&output) {
        Ok(json) => json,
        Err(e) => format!(r#"{{"error":"serialization failed: {}"}}"#, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::{ClaimBuilder, Source};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn resolve(raws: Vec<RawClaim>) -> ResolvedClaims {
        let config = EngineConfig::default();
        let (claims, rejected) = ClaimNormalizer::new(&config).normalize_all(raws);
        assert!(rejected.is_empty(), "unexpected rejections: {:?}", rejected);
        ContradictionResolver::new(&config, today()).resolve(claims)
    }

    fn patent_count(n: f64, source_type: SourceType, url: &str, conf: f64, ts: i64) -> RawClaim {
        ClaimBuilder::new()
            .person("Jane Doe")
            .fact_type("patentCount")
            .number(n)
            .source(Source::new(source_type, url, conf, ts))
            .build()
    }

    #[test]
    fn disagreeing_values_elect_highest_confidence() {
        let resolved = resolve(vec![
            patent_count(48.0, SourceType::Uspto, "https://uspto.gov/q", 0.8, 10),
            patent_count(52.0, SourceType::Ibm, "https://ibm.com/pr", 0.9, 20),
        ]);

        assert_eq!(resolved.groups.len(), 1);
        let group = &resolved.groups[0];
        assert_eq!(group.kind, ResolutionKind::Contradicted);

        let primary = resolved.primaries().next().unwrap();
        assert_eq!(primary.value.as_number(), Some(52.0));
        assert_eq!(primary.contradictions, vec![ClaimId(0)]);
        assert!(primary.human_review_needed);
        assert_eq!(primary.sources.len(), 2);
        assert_eq!(
            primary.notes,
            vec!["Sources disagree; 1 contradictory claims found. See evidence for details."]
        );
        assert_eq!(resolved.contradiction_count(), 1);
    }

    #[test]
    fn agreeing_values_merge_into_one_survivor() {
        let resolved = resolve(vec![
            patent_count(52.0, SourceType::Ibm, "https://ibm.com/pr", 0.9, 10),
            ClaimBuilder::new()
                .person("Dr. Jane Doe")
                .fact_type("patent_count")
                .text("52")
                .source(Source::new(SourceType::Uspto, "https://uspto.gov/q", 0.85, 20))
                .build(),
        ]);

        let group = &resolved.groups[0];
        assert_eq!(group.kind, ResolutionKind::Corroborated);
        assert_eq!(group.merged.len(), 1);
        assert!(group.contradictions.is_empty());
        assert!(!group.human_review_needed);

        let primary = resolved.primaries().next().unwrap();
        assert_eq!(primary.sources.len(), 2);
        assert!(primary.contradictions.is_empty());
    }

    #[test]
    fn merged_confidence_is_rescored_over_the_group() {
        let config = EngineConfig::default();
        let scorer = ConfidenceScorer::new(&config, today());
        let resolved = resolve(vec![
            patent_count(52.0, SourceType::Ibm, "https://ibm.com/pr", 0.9, 10),
            patent_count(52.0, SourceType::Uspto, "https://uspto.gov/q", 0.9, 20),
        ]);

        let single = scorer.score(&[resolved.table.get(ClaimId(1)).unwrap()]).score;
        let primary = resolved.primaries().next().unwrap();
        assert!(primary.confidence_score > single);
        assert_eq!(primary.confidence_score, resolved.groups[0].confidence);
    }

    #[test]
    fn lone_high_authority_claim_is_accepted() {
        let resolved = resolve(vec![patent_count(
            52.0,
            SourceType::Nature,
            "https://nature.com/a",
            0.9,
            0,
        )]);
        let primary = resolved.primaries().next().unwrap();
        assert_eq!(resolved.groups[0].kind, ResolutionKind::Singleton);
        assert!(!primary.human_review_needed);
        assert!(primary.notes.is_empty());
    }

    #[test]
    fn lone_low_authority_claim_is_flagged() {
        let resolved = resolve(vec![patent_count(
            52.0,
            SourceType::Twitter,
            "https://twitter.com/x",
            0.9,
            0,
        )]);
        let primary = resolved.primaries().next().unwrap();
        assert!(primary.human_review_needed);
        assert_eq!(primary.notes, vec![SINGLE_SOURCE_NOTE]);
        assert_eq!(resolved.summary.review_required, 1);
    }

    #[test]
    fn republished_copies_count_as_one_source() {
        let resolved = resolve(vec![
            patent_count(52.0, SourceType::Github, "https://github.com/jane", 0.8, 0),
            patent_count(52.0, SourceType::Github, "https://github.com/jane", 0.8, 5),
        ]);
        assert!(resolved.primaries().next().unwrap().human_review_needed);
    }

    #[test]
    fn election_ignores_input_order() {
        let a = patent_count(52.0, SourceType::Ibm, "https://ibm.com/pr", 0.9, 10);
        let b = patent_count(48.0, SourceType::Linkedin, "https://linkedin.com/in/j", 0.7, 5);

        let forward = resolve(vec![a.clone(), b.clone()]);
        let backward = resolve(vec![b, a]);

        let value = |r: &ResolvedClaims| r.primaries().next().unwrap().value.normalized();
        assert_eq!(value(&forward), "52");
        assert_eq!(value(&backward), "52");
    }

    #[test]
    fn equal_confidence_prefers_more_sources() {
        let wider = ClaimBuilder::new()
            .person("Jane Doe")
            .fact_type("patentCount")
            .number(52.0)
            .source(Source::new(SourceType::Github, "https://github.com/jane", 0.8, 20))
            .source(Source::new(SourceType::Github, "https://github.com/jane-doe", 0.8, 20))
            .build();
        let narrow = patent_count(48.0, SourceType::Github, "https://github.com/jd", 0.8, 10);

        let config = EngineConfig::default();
        let scorer = ConfidenceScorer::new(&config, today());
        let (claims, _) = ClaimNormalizer::new(&config).normalize_all(vec![wider.clone(), narrow.clone()]);
        assert_eq!(scorer.score(&[&claims[0]]).score, scorer.score(&[&claims[1]]).score);

        for raws in [vec![wider.clone(), narrow.clone()], vec![narrow, wider]] {
            let resolved = resolve(raws);
            let primary = resolved.primaries().next().unwrap();
            assert_eq!(primary.value.as_number(), Some(52.0));
            assert_eq!(primary.contradictions.len(), 1);
        }
    }

    #[test]
    fn equal_confidence_and_sources_prefers_earliest_extraction() {
        let earlier = patent_count(52.0, SourceType::Github, "https://github.com/jane", 0.8, 10);
        let later = patent_count(48.0, SourceType::Github, "https://github.com/jd", 0.8, 20);

        for raws in [vec![earlier.clone(), later.clone()], vec![later, earlier]] {
            let resolved = resolve(raws);
            let primary = resolved.primaries().next().unwrap();
            assert_eq!(primary.value.as_number(), Some(52.0));
            assert_eq!(primary.earliest_extraction_ms(), 10);
        }
    }

    #[test]
    fn structured_roles_compare_field_by_field() {
        let role = |org: &str, source_type| {
            ClaimBuilder::new()
                .person("Jane Doe")
                .fact_type("role")
                .field("role", json!("CTO"))
                .field("organization", json!(org))
                .field("notes", json!("from bio"))
                .source(Source::new(source_type, "https://x.io", 0.8, 0))
                .build()
        };
        let resolved = resolve(vec![role("IBM", SourceType::Ibm), role("ibm ", SourceType::Linkedin)]);
        assert_eq!(resolved.groups.len(), 1);
        assert_eq!(resolved.groups[0].kind, ResolutionKind::Corroborated);
    }

    #[test]
    fn summary_counts_groups() {
        let resolved = resolve(vec![
            patent_count(52.0, SourceType::Ibm, "https://ibm.com/pr", 0.9, 10),
            patent_count(48.0, SourceType::Uspto, "https://uspto.gov/q", 0.8, 20),
            ClaimBuilder::new()
                .person("Jane Doe")
                .fact_type("email")
                .text("jane@ibm.com")
                .source(Source::new(SourceType::Nature, "https://nature.com/a", 0.9, 0))
                .build(),
        ]);
        assert_eq!(
            resolved.summary,
            ResolutionSummary {
                total_groups: 2,
                auto_resolved: 1,
                review_required: 1,
                contradicted: 1,
            }
        );
    }

    #[test]
    fn json_entry_point() {
        let input = json!({
            "today": "2025-01-01",
            "claims": [
                {
                    "person": "Jane Doe",
                    "fact_type": "patentCount",
                    "value": 52,
                    "sources": [{"url": "https://ibm.com", "source_type": "ibm", "extraction_confidence": 0.9}]
                },
                {
                    "person": "Jane Doe",
                    "fact_type": "patentCount",
                    "value": 48,
                    "sources": [{"url": "https://uspto.gov", "source_type": "patent", "extraction_confidence": 0.8}]
                },
                {"id": "bad", "person": "Jane Doe", "value": 1, "sources": []}
            ]
        });

        let out: serde_json::Value =
            serde_json::from_str(&resolve_claims_json(&input.to_string())).unwrap();
        assert_eq!(out["summary"]["contradicted"], 1);
        assert_eq!(out["groups"][0]["kind"], "contradicted");
        assert_eq!(out["rejected"][0]["item_id"], "bad");
    }

    #[test]
    fn json_entry_point_reports_bad_input() {
        let out = resolve_claims_json("{not json");
        assert!(out.starts_with(r#"{"error":"invalid resolve input"#));
    }
}
