//! Per-source extracted records

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::claim::{RawClaim, SourceType};
use crate::error::ValidationError;

/// Record as delivered by an upstream extractor. Loosely typed so a bad
/// record can be rejected on its own.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub source_id: String,
    #[serde(default)]
    pub source_type: String,
    #[serde(default, alias = "extracted_content")]
    pub content: Map<String, Value>,
    #[serde(default, alias = "confidence_score")]
    pub extraction_confidence: Option<f64>,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    /// Claims the extractor already derived from this record
    #[serde(default)]
    pub claims: Vec<RawClaim>,
}

impl RawRecord {
    /// Parse one record out of an untyped JSON value
    pub fn from_value(value: Value, position: usize) -> Result<Self, ValidationError> {
        let item_id = value
            .get("source_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| format!("record[{}]", position));
        serde_json::from_value(value).map_err(|e| ValidationError::new(item_id, e.to_string()))
    }

    /// Check required fields and produce a typed record
    pub fn validate(self, position: usize) -> Result<ExtractedRecord, ValidationError> {
        let source_id = self.source_id.trim().to_string();
        let item_id = if source_id.is_empty() {
            format!("record[{}]", position)
        } else {
            source_id.clone()
        };

        if source_id.is_empty() {
            return Err(ValidationError::new(item_id, "missing source_id"));
        }

        let source_type: SourceType = self
            .source_type
            .parse()
            .map_err(|e: String| ValidationError::new(&item_id, e))?;

        let extraction_confidence = self
            .extraction_confidence
            .ok_or_else(|| ValidationError::new(&item_id, "missing extraction confidence"))?;
        if !(0.0..=1.0).contains(&extraction_confidence) {
            return Err(ValidationError::new(
                &item_id,
                format!("extraction confidence {} outside [0, 1]", extraction_confidence),
            ));
        }

        Ok(ExtractedRecord {
            source_id,
            source_type,
            content: self.content,
            extraction_confidence,
            metadata: self.metadata,
            claims: self.claims,
        })
    }
}

/// A validated record from one source about one (unknown) person
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedRecord {
    pub source_id: String,
    pub source_type: SourceType,
    pub content: Map<String, Value>,
    pub extraction_confidence: f64,
    #[serde(default)]
    pub metadata: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub claims: Vec<RawClaim>,
}

impl ExtractedRecord {
    pub fn new(source_id: impl Into<String>, source_type: SourceType, extraction_confidence: f64) -> Self {
        Self {
            source_id: source_id.into(),
            source_type,
            content: Map::new(),
            extraction_confidence,
            metadata: Map::new(),
            claims: Vec::new(),
        }
    }

    /// Set one content field
    pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
        self.content.insert(key.into(), value);
        self
    }

    pub fn with_claim(mut self, claim: RawClaim) -> Self {
        self.claims.push(claim);
        self
    }

    /// Content field rendered as a comparable string, if present and non-empty
    pub fn field_text(&self, key: &str) -> Option<String> {
        scalar_text(self.content.get(key)?)
    }
}

/// Scalar JSON rendered as text; empty strings and non-scalars give `None`
pub(crate) fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
