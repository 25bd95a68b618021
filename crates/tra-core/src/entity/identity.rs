//! Resolved identity: the merged field set of one person

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::record::scalar_text;

/// Fields that can tell two records about different people apart
pub const IDENTIFYING_FIELDS: [&str; 5] = ["email", "name", "username", "phone", "location"];

/// Whether a JSON value carries information (not null, empty, zero or false)
pub fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(false, |f| f != 0.0),
        Value::String(s) => !s.trim().is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Merged fields of one entity cluster
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResolvedIdentity(Map<String, Value>);

impl ResolvedIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.0.insert(key.into(), value);
    }

    pub(crate) fn entry_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.0.get_mut(key)
    }

    /// Whether a field is set to a non-empty value
    pub fn has(&self, key: &str) -> bool {
        self.get(key).map_or(false, is_present)
    }

    /// Scalar field as text
    pub fn text(&self, key: &str) -> Option<String> {
        self.get(key).and_then(scalar_text)
    }

    pub fn name(&self) -> Option<String> {
        self.text("name")
    }

    pub fn email(&self) -> Option<String> {
        self.text("email")
    }

    /// Array field, empty when absent or not a list
    pub fn list(&self, key: &str) -> &[Value] {
        match self.get(key) {
            Some(Value::Array(items)) => items,
            _ => &[],
        }
    }

    /// String entries of an array field
    pub fn strings(&self, key: &str) -> Vec<&str> {
        self.list(key).iter().filter_map(Value::as_str).collect()
    }

    /// Numeric field; numeric strings count, anything else is zero
    pub fn number(&self, key: &str) -> f64 {
        self.get(key).map_or(0.0, json_f64)
    }

    /// Sum of a numeric key over the objects of an array field
    pub fn sum_over(&self, list_key: &str, field: &str) -> f64 {
        self.list(list_key)
            .iter()
            .filter_map(|item| item.get(field))
            .map(json_f64)
            .sum()
    }

    /// How many identifying fields carry a value
    pub fn identifying_field_count(&self) -> usize {
        IDENTIFYING_FIELDS.iter().filter(|f| self.has(f)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }
}

impl From<Map<String, Value>> for ResolvedIdentity {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

pub(crate) fn json_f64(value: &Value) -> f64 {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|f| f.is_finite())
    .unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn identity(value: Value) -> ResolvedIdentity {
        match value {
            Value::Object(map) => map.into(),
            _ => panic!("expected object"),
        }
    }

    #[test]
    fn presence_follows_content() {
        assert!(!is_present(&json!(null)));
        assert!(!is_present(&json!("")));
        assert!(!is_present(&json!([])));
        assert!(!is_present(&json!(0)));
        assert!(is_present(&json!("x")));
        assert!(is_present(&json!({"a": 1})));
    }

    #[test]
    fn typed_accessors() {
        let id = identity(json!({
            "name": "Jane Doe",
            "followers": "1200",
            "skills": ["rust", 7, "quantum computing"],
            "papers": [{"citation_count": 40}, {"citation_count": 12}, "untyped"]
        }));
        assert_eq!(id.name().as_deref(), Some("Jane Doe"));
        assert_eq!(id.email(), None);
        assert_eq!(id.number("followers"), 1200.0);
        assert_eq!(id.strings("skills"), vec!["rust", "quantum computing"]);
        assert_eq!(id.sum_over("papers", "citation_count"), 52.0);
        assert_eq!(id.list("missing").len(), 0);
    }

    #[test]
    fn numbers_ignore_non_finite_strings() {
        assert_eq!(json_f64(&json!("12")), 12.0);
        assert_eq!(json_f64(&json!(" 3.5 ")), 3.5);
        assert_eq!(json_f64(&json!("NaN")), 0.0);
        assert_eq!(json_f64(&json!("inf")), 0.0);
        assert_eq!(json_f64(&json!("-infinity")), 0.0);

        let id = identity(json!({"followers": "NaN", "stargazers": "1e400"}));
        assert_eq!(id.number("followers"), 0.0);
        assert_eq!(id.number("stargazers"), 0.0);
    }

    #[test]
    fn counts_identifying_fields() {
        let id = identity(json!({"name": "Jane", "phone": "", "skills": ["ai"]}));
        assert_eq!(id.identifying_field_count(), 1);
        assert_eq!(ResolvedIdentity::new().identifying_field_count(), 0);
    }
}
