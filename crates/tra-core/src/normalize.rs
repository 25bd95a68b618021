//! Claim normalization and fact keys
//!
//! Turns raw extracted claims into [`Claim`]s and derives the [`FactKey`]
//! that decides which claims talk about the same fact. Claims with
//! different keys are never compared.

use chrono::{DateTime, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::claim::{Claim, ClaimId, ClaimValue, FactType, RawClaim};
use crate::config::EngineConfig;
use crate::error::ValidationError;

/// Honorifics dropped from person names before keying
const HONORIFICS: [&str; 5] = ["dr", "prof", "mr", "ms", "mrs"];

/// Separator between the parts of a fact key
const KEY_SEP: &str = ":";

/// Canonical "same fact" key: `person:fact_type[:discriminator]`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FactKey(String);

impl FactKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Normalized person prefix of the key
    pub fn person(&self) -> &str {
        self.0.split(KEY_SEP).next().unwrap_or_default()
    }
}

impl std::fmt::Display for FactKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strip honorifics, lowercase, collapse internal whitespace
pub fn normalize_person(person: &str) -> String {
    person
        .split_whitespace()
        .filter(|token| {
            let bare = token.trim_end_matches('.').to_lowercase();
            !HONORIFICS.contains(&bare.as_str())
        })
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn normalize_part(value: Option<&str>) -> String {
    value
        .unwrap_or_default()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Primary string of a value: a structured field, or the text itself
fn text_or_field<'a>(value: &'a ClaimValue, key: &str) -> Option<&'a str> {
    match value {
        ClaimValue::Text(s) => Some(s.as_str()),
        _ => value.field(key),
    }
}

/// Discriminator appended after the fact type
fn discriminator(fact_type: &FactType, value: &ClaimValue) -> String {
    match fact_type {
        FactType::Role => {
            let role = normalize_part(text_or_field(value, "role"));
            let org = normalize_part(value.field("organization").or_else(|| value.field("org")));
            format!("{KEY_SEP}{role}{KEY_SEP}{org}")
        }
        FactType::Publication => {
            format!("{KEY_SEP}{}", normalize_part(text_or_field(value, "title")))
        }
        FactType::Patent => {
            let number = text_or_field(value, "patent_number").unwrap_or_default().trim();
            format!("{KEY_SEP}{number}")
        }
        _ => String::new(),
    }
}

/// Compute the fact key of a claim
pub fn fact_key(claim: &Claim) -> FactKey {
    FactKey(format!(
        "{}{KEY_SEP}{}{}",
        normalize_person(&claim.person),
        claim.fact_type.as_key(),
        discriminator(&claim.fact_type, &claim.value)
    ))
}

fn parse_temporal(item_id: &str, raw: &str) -> Result<NaiveDate, ValidationError> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Ok(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .map(|dt| dt.date_naive())
        .map_err(|_| ValidationError::new(item_id, format!("unparseable date '{}'", raw)))
}

/// Validates raw claims and stamps source authority from configuration
pub struct ClaimNormalizer<'a> {
    config: &'a EngineConfig,
}

impl<'a> ClaimNormalizer<'a> {
    pub fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Normalize one claim. `position` names the item when it has no id.
    pub fn normalize(&self, raw: RawClaim, position: usize) -> Result<Claim, ValidationError> {
        let item_id = raw.id.clone().unwrap_or_else(|| format!("claim[{}]", position));

        let fact_type: FactType = raw
            .fact_type
            .as_deref()
            .ok_or_else(|| ValidationError::new(&item_id, "missing fact type"))?
            .parse()
            .map_err(|e: String| ValidationError::new(&item_id, e))?;

        let person = raw
            .person
            .as_deref()
            .or_else(|| raw.value.field("person"))
            .map(str::trim)
            .unwrap_or_default()
            .to_string();
        if normalize_person(&person).is_empty() {
            return Err(ValidationError::new(&item_id, "missing person"));
        }

        if raw.sources.is_empty() {
            return Err(ValidationError::new(&item_id, "claim has no sources"));
        }

        let mut sources = raw.sources;
        for source in &mut sources {
            if !(0.0..=1.0).contains(&source.extraction_confidence) {
                return Err(ValidationError::new(
                    &item_id,
                    format!(
                        "extraction confidence {} outside [0, 1]",
                        source.extraction_confidence
                    ),
                ));
            }
            source.authority_score = self.config.authority(source.source_type);
        }

        let temporal_context = raw
            .temporal_context
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .map(|s| parse_temporal(&item_id, s))
            .transpose()?;

        let mut supporting_snippets = raw.supporting_snippets;
        for snippet in sources.iter().filter_map(|s| s.raw_snippet.as_ref()) {
            if !supporting_snippets.contains(snippet) {
                supporting_snippets.push(snippet.clone());
            }
        }

        let fact_text = if raw.fact_text.trim().is_empty() {
            format!("{} {}: {}", person, fact_type, raw.value.display())
        } else {
            raw.fact_text
        };

        Ok(Claim {
            id: ClaimId(0),
            person,
            fact_text,
            fact_type,
            value: raw.value,
            sources,
            supporting_snippets,
            confidence_score: 0.0,
            contradictions: Vec::new(),
            temporal_context,
            human_review_needed: false,
            notes: Vec::new(),
        })
    }

    /// Normalize a batch, splitting accepted claims from rejections
    pub fn normalize_all(&self, raws: Vec<RawClaim>) -> (Vec<Claim>, Vec<ValidationError>) {
        let mut claims = Vec::with_capacity(raws.len());
        let mut rejected = Vec::new();

        for (position, raw) in raws.into_iter().enumerate() {
            match self.normalize(raw, position) {
                Ok(claim) => claims.push(claim),
                Err(err) => {
                    debug!(item = %err.item_id, reason = %err.reason, "claim rejected");
                    rejected.push(err);
                }
            }
        }

        (claims, rejected)
    }
}
