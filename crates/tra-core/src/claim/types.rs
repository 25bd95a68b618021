//! Claim type definitions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use chrono::NaiveDate;

/// Kind of outlet a piece of evidence came from.
///
/// Authority is fixed per source type (see [`crate::config::EngineConfig`]),
/// never per individual document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Nature,
    Ibm,
    #[serde(alias = "patent")]
    Uspto,
    #[serde(rename = "nytimes")]
    NyTimes,
    Arxiv,
    Github,
    Linkedin,
    Resume,
    Crm,
    Pdf,
    SocialMedia,
    Twitter,
}

impl SourceType {
    /// Every source type known to the system. Corroboration is measured against this.
    pub const ALL: [SourceType; 12] = [
        Self::Nature,
        Self::Ibm,
        Self::Uspto,
        Self::NyTimes,
        Self::Arxiv,
        Self::Github,
        Self::Linkedin,
        Self::Resume,
        Self::Crm,
        Self::Pdf,
        Self::SocialMedia,
        Self::Twitter,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Nature => "nature",
            Self::Ibm => "ibm",
            Self::Uspto => "uspto",
            Self::NyTimes => "nytimes",
            Self::Arxiv => "arxiv",
            Self::Github => "github",
            Self::Linkedin => "linkedin",
            Self::Resume => "resume",
            Self::Crm => "crm",
            Self::Pdf => "pdf",
            Self::SocialMedia => "social_media",
            Self::Twitter => "twitter",
        }
    }

    /// Authority used when no table override exists
    pub fn default_authority(&self) -> f64 {
        match self {
            Self::Nature => 0.98,
            Self::Ibm => 0.90,
            Self::Uspto => 0.88,
            Self::NyTimes => 0.85,
            Self::Arxiv => 0.80,
            Self::Github => 0.70,
            Self::Linkedin => 0.65,
            Self::Crm => 0.60,
            Self::Resume => 0.55,
            Self::Pdf => 0.50,
            Self::SocialMedia => 0.40,
            Self::Twitter => 0.40,
        }
    }
}

impl std::fmt::Display for SourceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        if lower == "patent" {
            return Ok(Self::Uspto);
        }
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == lower)
            .ok_or_else(|| format!("unknown source type '{}'", s))
    }
}

/// Provenance for a claim. Immutable once created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Source {
    pub url: String,
    #[serde(default)]
    pub title: String,
    pub source_type: SourceType,
    /// Overwritten from the authority table during normalization
    #[serde(default)]
    pub authority_score: f64,
    pub extraction_confidence: f64,
    /// Extraction time (Unix timestamp milliseconds)
    #[serde(default)]
    pub timestamp_ms: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_snippet: Option<String>,
}

impl Source {
    pub fn new(
        source_type: SourceType,
        url: impl Into<String>,
        extraction_confidence: f64,
        timestamp_ms: i64,
    ) -> Self {
        Self {
            url: url.into(),
            title: String::new(),
            source_type,
            authority_score: source_type.default_authority(),
            extraction_confidence,
            timestamp_ms,
            raw_snippet: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.raw_snippet = Some(snippet.into());
        self
    }
}

/// What a claim is about. Drives the fact-key discriminator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum FactType {
    Role,
    Publication,
    Patent,
    PatentCount,
    Email,
    Name,
    Location,
    Company,
    Title,
    Skill,
    Award,
    Other(String),
}

impl FactType {
    pub fn as_key(&self) -> &str {
        match self {
            Self::Role => "role",
            Self::Publication => "publication",
            Self::Patent => "patent",
            Self::PatentCount => "patent_count",
            Self::Email => "email",
            Self::Name => "name",
            Self::Location => "location",
            Self::Company => "company",
            Self::Title => "title",
            Self::Skill => "skill",
            Self::Award => "award",
            Self::Other(s) => s,
        }
    }
}

impl FromStr for FactType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        let fact = match lower.as_str() {
            "" => return Err("fact type is empty".to_string()),
            "role" => Self::Role,
            "publication" => Self::Publication,
            "patent" => Self::Patent,
            "patentcount" | "patent_count" => Self::PatentCount,
            "email" => Self::Email,
            "name" => Self::Name,
            "location" => Self::Location,
            "company" => Self::Company,
            "title" => Self::Title,
            "skill" => Self::Skill,
            "award" => Self::Award,
            _ => Self::Other(lower),
        };
        Ok(fact)
    }
}

impl TryFrom<String> for FactType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<FactType> for String {
    fn from(value: FactType) -> Self {
        value.as_key().to_string()
    }
}

impl std::fmt::Display for FactType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_key())
    }
}

/// Keys on structured values that record bookkeeping, not the asserted fact
const BOOKKEEPING_KEYS: [&str; 2] = ["person", "notes"];

/// The asserted value of a claim.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClaimValue {
    Number(f64),
    Text(String),
    Structured(BTreeMap<String, serde_json::Value>),
}

impl ClaimValue {
    /// String field of a structured value
    pub fn field(&self, key: &str) -> Option<&str> {
        match self {
            Self::Structured(map) => map.get(key).and_then(|v| v.as_str()),
            _ => None,
        }
    }

    /// Numeric reading: a number, a numeric string, or a structured `count`
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok().filter(|f| f.is_finite()),
            Self::Structured(map) => map.get("count").and_then(json_number),
        }
    }

    /// Canonical form used to decide whether two claims agree.
    ///
    /// Scalars compare exactly (numeric strings as numbers), strings
    /// case-insensitively after trimming, structured values field by field.
    pub fn normalized(&self) -> String {
        match self {
            Self::Number(n) => format_number(*n),
            Self::Text(s) => normalize_text(s),
            Self::Structured(map) => map
                .iter()
                .filter(|(k, _)| !BOOKKEEPING_KEYS.contains(&k.as_str()))
                .map(|(k, v)| format!("{}={}", k, normalize_json(v)))
                .collect::<Vec<_>>()
                .join(";"),
        }
    }

    /// Short human-readable rendering for notes and contradiction records
    pub fn display(&self) -> String {
        match self {
            Self::Number(n) => format_number(*n),
            Self::Text(s) => s.clone(),
            Self::Structured(map) => {
                let parts: Vec<String> = map
                    .iter()
                    .filter(|(k, _)| !BOOKKEEPING_KEYS.contains(&k.as_str()))
                    .map(|(k, v)| match v {
                        serde_json::Value::String(s) => format!("{}: {}", k, s),
                        other => format!("{}: {}", k, other),
                    })
                    .collect();
                parts.join(", ")
            }
        }
    }
}

fn json_number(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite())
}

fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

fn normalize_text(s: &str) -> String {
    let trimmed = s.trim();
    match trimmed.parse::<f64>() {
        Ok(n) if n.is_finite() => format_number(n),
        _ => trimmed.to_lowercase(),
    }
}

fn normalize_json(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => normalize_text(s),
        serde_json::Value::Number(n) => n.as_f64().map(format_number).unwrap_or_default(),
        other => other.to_string(),
    }
}

/// Index of a claim inside its candidate's [`ClaimTable`](super::ClaimTable)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClaimId(pub usize);

impl std::fmt::Display for ClaimId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "claim#{}", self.0)
    }
}

/// A normalized, typed assertion about one person.
///
/// `confidence_score`, `contradictions`, `human_review_needed` and `notes`
/// are only written by the resolver.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claim {
    pub id: ClaimId,
    pub person: String,
    pub fact_text: String,
    pub fact_type: FactType,
    pub value: ClaimValue,
    pub sources: Vec<Source>,
    #[serde(default)]
    pub supporting_snippets: Vec<String>,
    pub confidence_score: f64,
    /// Disagreeing claims, by id into the same table
    #[serde(default)]
    pub contradictions: Vec<ClaimId>,
    pub temporal_context: Option<NaiveDate>,
    pub human_review_needed: bool,
    #[serde(default)]
    pub notes: Vec<String>,
}

impl Claim {
    /// Highest authority among attached sources
    pub fn max_authority(&self) -> f64 {
        self.sources
            .iter()
            .map(|s| s.authority_score)
            .fold(0.0, f64::max)
    }

    /// Earliest extraction timestamp among attached sources
    pub fn earliest_extraction_ms(&self) -> i64 {
        self.sources
            .iter()
            .map(|s| s.timestamp_ms)
            .min()
            .unwrap_or(i64::MAX)
    }

    pub fn has_contradictions(&self) -> bool {
        !self.contradictions.is_empty()
    }

    /// Append another claim's provenance. Sources only ever grow.
    pub(crate) fn absorb_provenance(&mut self, other: &Claim) {
        self.sources.extend(other.sources.iter().cloned());
        for snippet in &other.supporting_snippets {
            if !self.supporting_snippets.contains(snippet) {
                self.supporting_snippets.push(snippet.clone());
            }
        }
        if other.temporal_context > self.temporal_context {
            self.temporal_context = other.temporal_context;
        }
    }
}

/// Claim as delivered by the upstream extraction stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawClaim {
    /// Caller's identifier, used to attribute rejections
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub person: Option<String>,
    #[serde(default)]
    pub fact_text: String,
    #[serde(default)]
    pub fact_type: Option<String>,
    pub value: ClaimValue,
    #[serde(default)]
    pub sources: Vec<Source>,
    #[serde(default)]
    pub supporting_snippets: Vec<String>,
    /// ISO date or RFC 3339 timestamp
    #[serde(default)]
    pub temporal_context: Option<String>,
}

/// Builder for raw claims
#[derive(Debug)]
pub struct ClaimBuilder {
    claim: RawClaim,
}

impl Default for ClaimBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ClaimBuilder {
    pub fn new() -> Self {
        Self {
            claim: RawClaim {
                id: None,
                person: None,
                fact_text: String::new(),
                fact_type: None,
                value: ClaimValue::Text(String::new()),
                sources: Vec::new(),
                supporting_snippets: Vec::new(),
                temporal_context: None,
            },
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.claim.id = Some(id.into());
        self
    }

    pub fn person(mut self, person: impl Into<String>) -> Self {
        self.claim.person = Some(person.into());
        self
    }

    pub fn fact_type(mut self, fact_type: impl Into<String>) -> Self {
        self.claim.fact_type = Some(fact_type.into());
        self
    }

    pub fn fact_text(mut self, text: impl Into<String>) -> Self {
        self.claim.fact_text = text.into();
        self
    }

    pub fn value(mut self, value: ClaimValue) -> Self {
        self.claim.value = value;
        self
    }

    pub fn number(self, n: f64) -> Self {
        self.value(ClaimValue::Number(n))
    }

    pub fn text(self, s: impl Into<String>) -> Self {
        self.value(ClaimValue::Text(s.into()))
    }

    /// Set one field on a structured value, converting the value if needed
    pub fn field(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        if !matches!(self.claim.value, ClaimValue::Structured(_)) {
            self.claim.value = ClaimValue::Structured(BTreeMap::new());
        }
        if let ClaimValue::Structured(map) = &mut self.claim.value {
            map.insert(key.into(), value);
        }
        self
    }

    pub fn source(mut self, source: Source) -> Self {
        self.claim.sources.push(source);
        self
    }

    pub fn snippet(mut self, snippet: impl Into<String>) -> Self {
        self.claim.supporting_snippets.push(snippet.into());
        self
    }

    pub fn dated(mut self, date: impl Into<String>) -> Self {
        self.claim.temporal_context = Some(date.into());
        self
    }

    pub fn build(self) -> RawClaim {
        self.claim
    }
}
