//! Extraordinary Index calculation
//!
//! Five sub-scores, each clamped to [0, 1], combined with the configured
//! weights. Every term is a capped linear contribution of one signal.

use chrono::{DateTime, NaiveDate};
use serde::Serialize;

use crate::claim::{Claim, FactType};
use crate::config::{EngineConfig, IndexWeights};
use crate::entity::ResolvedIdentity;
use crate::error::ResolutionError;

/// Skills that count toward innovation, matched on word boundaries
pub const EMERGING_SKILLS: [&str; 5] = ["ai", "machine learning", "blockchain", "quantum", "robotics"];

/// Employers that earn the adoption bonus
pub const BIG_EMPLOYERS: [&str; 5] = ["google", "microsoft", "amazon", "apple", "meta"];

/// Fields a complete profile carries
pub const REQUIRED_FIELDS: [&str; 4] = ["name", "email", "experience", "skills"];

const PATENT_WEIGHT: f64 = 0.2;
const PAPER_WEIGHT: f64 = 0.1;
const STAR_INNOVATION_WEIGHT: f64 = 0.01;
const EMERGING_SKILL_WEIGHT: f64 = 0.2;
const FOLLOWER_WEIGHT: f64 = 0.001;
const SOCIAL_FOLLOWER_WEIGHT: f64 = 0.0001;
const BIG_EMPLOYER_BONUS: f64 = 0.5;
const CITATION_WEIGHT: f64 = 0.01;
const STAR_INFLUENCE_WEIGHT: f64 = 0.005;
const AWARD_WEIGHT: f64 = 0.2;
const RECENT_REPO_WEIGHT: f64 = 0.1;
const EXPERIENCE_WEIGHT: f64 = 0.1;
const CONTRADICTION_PENALTY: f64 = 0.1;

/// The five-dimension talent score
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ExtraordinaryIndex {
    pub innovation: f64,
    pub adoption: f64,
    pub influence: f64,
    pub velocity: f64,
    pub selectivity: f64,
    pub overall_score: f64,
}

impl ExtraordinaryIndex {
    /// Combine sub-scores with the configured weights
    pub fn from_scores(
        weights: &IndexWeights,
        innovation: f64,
        adoption: f64,
        influence: f64,
        velocity: f64,
        selectivity: f64,
    ) -> Self {
        let overall_score = innovation * weights.innovation
            + adoption * weights.adoption
            + influence * weights.influence
            + velocity * weights.velocity
            + selectivity * weights.selectivity;
        // weights may sum to slightly over one within the validation tolerance
        let overall_score = overall_score.clamp(0.0, 1.0);
        Self {
            innovation,
            adoption,
            influence,
            velocity,
            selectivity,
            overall_score,
        }
    }

    fn dimensions(&self) -> [(&'static str, f64); 6] {
        [
            ("innovation", self.innovation),
            ("adoption", self.adoption),
            ("influence", self.influence),
            ("velocity", self.velocity),
            ("selectivity", self.selectivity),
            ("overall_score", self.overall_score),
        ]
    }

    /// Every dimension must lie in [0, 1]
    pub fn check(&self, candidate_id: &str) -> Result<(), ResolutionError> {
        for (dimension, value) in self.dimensions() {
            if !(0.0..=1.0).contains(&value) {
                return Err(ResolutionError::ScoreOutOfRange {
                    candidate_id: candidate_id.to_string(),
                    dimension,
                    value,
                });
            }
        }
        Ok(())
    }
}

/// Raw counts the sub-scores are computed from
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct IndexSignals {
    pub patents: f64,
    pub papers: f64,
    pub stars: f64,
    pub emerging_skills: usize,
    pub followers: f64,
    pub social_followers: f64,
    pub big_employer: bool,
    pub citations: f64,
    pub awards: f64,
    pub recent_repositories: usize,
    pub experience_entries: usize,
    pub complete_fields: usize,
    pub contradictions: usize,
}

#[inline]
fn capped(count: f64, weight: f64) -> f64 {
    let raw = count * weight;
    if raw.is_nan() {
        return 0.0;
    }
    raw.clamp(0.0, 1.0)
}

/// Lowercase words of a string, split on anything not alphanumeric
fn words(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

/// Whether a skill mentions any emerging technology term as whole words
pub fn is_emerging_skill(skill: &str) -> bool {
    let skill_words = words(skill);
    EMERGING_SKILLS.iter().any(|term| {
        let term_words = words(term);
        skill_words
            .windows(term_words.len())
            .any(|window| window == term_words.as_slice())
    })
}

fn parse_updated_at(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.date_naive())
        .ok()
        .or_else(|| NaiveDate::parse_from_str(trimmed, "%Y-%m-%d").ok())
}

/// Computes the index of one candidate
pub struct IndexCalculator<'a> {
    config: &'a EngineConfig,
    today: NaiveDate,
}

impl<'a> IndexCalculator<'a> {
    pub fn new(config: &'a EngineConfig, today: NaiveDate) -> Self {
        Self { config, today }
    }

    /// Gather signals from the merged identity and the resolved claims.
    ///
    /// Claims raise identity counts when they report more than the records do.
    pub fn signals<'c>(
        &self,
        identity: &ResolvedIdentity,
        claims: impl IntoIterator<Item = &'c Claim>,
        contradictions: usize,
    ) -> IndexSignals {
        let mut patent_claims = 0usize;
        let mut publication_claims = 0usize;
        let mut award_claims = 0usize;
        let mut patent_count = 0.0f64;
        let mut claimed_skills: Vec<String> = Vec::new();

        for claim in claims {
            match claim.fact_type {
                FactType::Patent => patent_claims += 1,
                FactType::Publication => publication_claims += 1,
                FactType::Award => award_claims += 1,
                FactType::PatentCount => {
                    patent_count = patent_count.max(claim.value.as_number().unwrap_or(0.0));
                }
                FactType::Skill => claimed_skills.push(claim.value.display()),
                _ => {}
            }
        }

        let mut skills: Vec<String> = identity.strings("skills").iter().map(|s| s.to_string()).collect();
        for skill in claimed_skills {
            if !skills.iter().any(|s| s.eq_ignore_ascii_case(&skill)) {
                skills.push(skill);
            }
        }

        let social_followers = match identity.get("social_media") {
            Some(serde_json::Value::Object(accounts)) => accounts
                .values()
                .filter_map(|account| account.get("followers"))
                .map(|v| v.as_f64().unwrap_or(0.0))
                .sum(),
            _ => 0.0,
        };

        let big_employer = identity
            .text("company")
            .map(|company| {
                let lower = company.to_lowercase();
                BIG_EMPLOYERS.iter().any(|e| lower.contains(e))
            })
            .unwrap_or(false);

        let recent_repositories = identity
            .list("repositories")
            .iter()
            .filter_map(|repo| repo.get("updated_at")?.as_str().and_then(parse_updated_at))
            .filter(|date| {
                let days = (self.today - *date).num_days();
                (days as f64) <= self.config.recency.window_days
            })
            .count();

        IndexSignals {
            patents: (identity.list("patents").len() as f64)
                .max(patent_claims as f64)
                .max(patent_count),
            papers: (identity.list("papers").len() as f64).max(publication_claims as f64),
            stars: identity.sum_over("repositories", "stargazers_count"),
            emerging_skills: skills.iter().filter(|s| is_emerging_skill(s)).count(),
            followers: identity.number("followers"),
            social_followers,
            big_employer,
            citations: identity.sum_over("papers", "citation_count"),
            awards: (identity.list("awards").len() as f64).max(award_claims as f64),
            recent_repositories,
            experience_entries: identity.list("experience").len(),
            complete_fields: REQUIRED_FIELDS.iter().filter(|f| identity.has(f)).count(),
            contradictions,
        }
    }

    pub fn innovation(&self, s: &IndexSignals) -> f64 {
        (capped(s.patents, PATENT_WEIGHT)
            + capped(s.papers, PAPER_WEIGHT)
            + capped(s.stars, STAR_INNOVATION_WEIGHT)
            + capped(s.emerging_skills as f64, EMERGING_SKILL_WEIGHT))
        .clamp(0.0, 1.0)
    }

    pub fn adoption(&self, s: &IndexSignals) -> f64 {
        let bonus = if s.big_employer { BIG_EMPLOYER_BONUS } else { 0.0 };
        (capped(s.followers, FOLLOWER_WEIGHT)
            + bonus
            + capped(s.social_followers, SOCIAL_FOLLOWER_WEIGHT))
        .clamp(0.0, 1.0)
    }

    pub fn influence(&self, s: &IndexSignals) -> f64 {
        (capped(s.citations, CITATION_WEIGHT)
            + capped(s.stars, STAR_INFLUENCE_WEIGHT)
            + capped(s.awards, AWARD_WEIGHT))
        .clamp(0.0, 1.0)
    }

    pub fn velocity(&self, s: &IndexSignals) -> f64 {
        (capped(s.recent_repositories as f64, RECENT_REPO_WEIGHT)
            + capped(s.experience_entries as f64, EXPERIENCE_WEIGHT))
        .clamp(0.0, 1.0)
    }

    pub fn selectivity(&self, s: &IndexSignals) -> f64 {
        let completeness = s.complete_fields as f64 / REQUIRED_FIELDS.len() as f64;
        let consistency = 1.0 - (CONTRADICTION_PENALTY * s.contradictions as f64).min(1.0);
        (0.5 * completeness + 0.5 * consistency).clamp(0.0, 1.0)
    }

    /// Score signals into an index
    pub fn score(&self, signals: &IndexSignals) -> ExtraordinaryIndex {
        ExtraordinaryIndex::from_scores(
            &self.config.weights,
            self.innovation(signals),
            self.adoption(signals),
            self.influence(signals),
            self.velocity(signals),
            self.selectivity(signals),
        )
    }

    /// Full calculation with the range check
    pub fn calculate<'c>(
        &self,
        candidate_id: &str,
        identity: &ResolvedIdentity,
        claims: impl IntoIterator<Item = &'c Claim>,
        contradictions: usize,
    ) -> Result<ExtraordinaryIndex, ResolutionError> {
        let signals = self.signals(identity, claims, contradictions);
        let index = self.score(&signals);
        index.check(candidate_id)?;
        Ok(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::claim::{ClaimBuilder, Source, SourceType};
    use crate::normalize::ClaimNormalizer;
    use serde_json::{json, Value};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
    }

    fn identity(value: Value) -> ResolvedIdentity {
        match value {
            Value::Object(map) => map.into(),
            _ => panic!("expected object"),
        }
    }

    fn none() -> Vec<&'static Claim> {
        Vec::new()
    }

    #[test]
    fn saturated_scores_stay_in_range_under_tolerated_weight_drift() {
        let mut weights = IndexWeights::default();
        weights.innovation += 9e-7;
        let mut config = EngineConfig::default();
        config.weights = weights;
        assert!(config.validate().is_ok());

        let index = ExtraordinaryIndex::from_scores(&weights, 1.0, 1.0, 1.0, 1.0, 1.0);
        assert_eq!(index.overall_score, 1.0);
        assert!(index.check("candidate_jane_doe").is_ok());
    }

    #[test]
    fn non_numeric_follower_strings_count_as_zero() {
        let config = EngineConfig::default();
        let calc = IndexCalculator::new(&config, today());
        for followers in ["NaN", "inf", "-inf"] {
            let id = identity(json!({"name": "Jane Doe", "followers": followers}));
            let signals = calc.signals(&id, none(), 0);
            assert_eq!(signals.followers, 0.0, "{}", followers);
            let index = calc.score(&signals);
            assert!(index.adoption.is_finite());
            assert!(index.check("candidate_jane_doe").is_ok());
        }
        assert_eq!(capped(f64::NAN, 0.5), 0.0);
    }

    #[test]
    fn emerging_skills_match_whole_words() {
        assert!(is_emerging_skill("AI research"));
        assert!(is_emerging_skill("Applied Machine Learning"));
        assert!(is_emerging_skill("quantum-computing"));
        assert!(!is_emerging_skill("maintenance"));
        assert!(!is_emerging_skill("machine shop"));
    }

    #[test]
    fn innovation_clamps_the_sum() {
        let config = EngineConfig::default();
        let calc = IndexCalculator::new(&config, today());
        let id = identity(json!({
            "patents": ["p1", "p2", "p3"],
            "skills": ["quantum computing", "robotics", "cooking"]
        }));
        let signals = calc.signals(&id, none(), 0);
        assert_eq!(signals.patents, 3.0);
        assert_eq!(signals.emerging_skills, 2);
        assert_eq!(calc.innovation(&signals), 1.0);
    }

    #[test]
    fn claims_raise_identity_counts() {
        let config = EngineConfig::default();
        let source = || Source::new(SourceType::Uspto, "https://uspto.gov/q", 0.9, 0);
        let raws = vec![
            ClaimBuilder::new()
                .person("Jane Doe")
                .fact_type("patentCount")
                .number(4.0)
                .source(source())
                .build(),
            ClaimBuilder::new()
                .person("Jane Doe")
                .fact_type("publication")
                .field("title", json!("Widgets"))
                .source(source())
                .build(),
            ClaimBuilder::new()
                .person("Jane Doe")
                .fact_type("skill")
                .text("Machine Learning")
                .source(source())
                .build(),
        ];
        let (claims, _) = ClaimNormalizer::new(&config).normalize_all(raws);

        let calc = IndexCalculator::new(&config, today());
        let id = identity(json!({"patents": ["p1"], "skills": ["rust"]}));
        let s = calc.signals(&id, &claims, 0);
        assert_eq!(s.patents, 4.0);
        assert_eq!(s.papers, 1.0);
        assert_eq!(s.emerging_skills, 1);
    }

    #[test]
    fn adoption_big_employer_and_followers() {
        let config = EngineConfig::default();
        let calc = IndexCalculator::new(&config, today());
        let id = identity(json!({
            "company": "Google DeepMind",
            "followers": 200,
            "social_media": {"twitter": {"followers": 1000}, "bad": 3}
        }));
        let s = calc.signals(&id, none(), 0);
        assert!(s.big_employer);
        assert!((calc.adoption(&s) - (0.2 + 0.5 + 0.1)).abs() < 1e-9);
    }

    #[test]
    fn influence_terms() {
        let config = EngineConfig::default();
        let calc = IndexCalculator::new(&config, today());
        let id = identity(json!({
            "papers": [{"citation_count": 30}],
            "repositories": [{"stargazers_count": 40}],
            "awards": ["Turing"]
        }));
        let s = calc.signals(&id, none(), 0);
        assert!((calc.influence(&s) - (0.3 + 0.2 + 0.2)).abs() < 1e-9);
    }

    #[test]
    fn velocity_counts_recently_updated_repositories() {
        let config = EngineConfig::default();
        let calc = IndexCalculator::new(&config, today());
        let id = identity(json!({
            "repositories": [
                {"updated_at": "2024-11-02T10:00:00Z"},
                {"updated_at": "2019-01-01T00:00:00Z"},
                {"updated_at": "not a date"},
                {"name": "no timestamp"}
            ],
            "experience": [{"company": "IBM"}, {"company": "Bell Labs"}]
        }));
        let s = calc.signals(&id, none(), 0);
        assert_eq!(s.recent_repositories, 1);
        assert_eq!(s.experience_entries, 2);
        assert!((calc.velocity(&s) - 0.3).abs() < 1e-9);
    }

    #[test]
    fn selectivity_penalizes_contradictions() {
        let config = EngineConfig::default();
        let calc = IndexCalculator::new(&config, today());
        let id = identity(json!({"name": "Jane", "email": "j@x.io"}));

        let clean = calc.signals(&id, none(), 0);
        assert!((calc.selectivity(&clean) - 0.75).abs() < 1e-9);

        let messy = calc.signals(&id, none(), 3);
        assert!((calc.selectivity(&messy) - (0.25 + 0.35)).abs() < 1e-9);

        let hopeless = calc.signals(&id, none(), 40);
        assert!((calc.selectivity(&hopeless) - 0.25).abs() < 1e-9);
    }

    #[test]
    fn empty_identity_scores_only_consistency() {
        let config = EngineConfig::default();
        let calc = IndexCalculator::new(&config, today());
        let index = calc
            .calculate("candidate_x", &ResolvedIdentity::new(), none(), 0)
            .unwrap();
        assert_eq!(index.innovation, 0.0);
        assert_eq!(index.selectivity, 0.5);
        assert!((index.overall_score - 0.075).abs() < 1e-9);
    }

    #[test]
    fn out_of_range_dimension_is_reported() {
        let index = ExtraordinaryIndex {
            influence: 1.5,
            ..ExtraordinaryIndex::default()
        };
        match index.check("candidate_x") {
            Err(ResolutionError::ScoreOutOfRange { dimension, .. }) => assert_eq!(dimension, "influence"),
            other => panic!("expected ScoreOutOfRange, got {:?}", other),
        }
    }
}
