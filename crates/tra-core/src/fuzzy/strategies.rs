//! Field similarity strategies
//!
//! All strategies compare normalized text (lowercase, trimmed, internal
//! whitespace collapsed) and return a score in [0, 1].

use serde::{Deserialize, Serialize};
use strsim::{jaro_winkler, normalized_levenshtein};

/// Which similarity function backs fuzzy field matching
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityMetric {
    /// Character overlap ratio (default)
    #[default]
    CharOverlap,
    JaroWinkler,
    Levenshtein,
}

impl std::fmt::Display for SimilarityMetric {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CharOverlap => write!(f, "char_overlap"),
            Self::JaroWinkler => write!(f, "jaro_winkler"),
            Self::Levenshtein => write!(f, "levenshtein"),
        }
    }
}

/// Lowercase, trim and collapse internal whitespace
pub fn normalize_field(value: &str) -> String {
    value
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// Exact match after normalization (score: 1.0)
#[inline]
pub fn exact_match(a: &str, b: &str) -> Option<f64> {
    if a == b {
        Some(1.0)
    } else {
        None
    }
}

/// Share of `a`'s characters that occur anywhere in `b`, over the longer length.
///
/// Not an edit distance: anagrams score 1.0.
pub fn char_overlap_ratio(a: &str, b: &str) -> f64 {
    let max_len = a.chars().count().max(b.chars().count());
    if max_len == 0 {
        return 0.0;
    }
    let common = a.chars().filter(|c| b.contains(*c)).count();
    common as f64 / max_len as f64
}

/// Character overlap taken in both directions; the smaller ratio wins
#[inline]
pub fn char_overlap(a: &str, b: &str) -> f64 {
    char_overlap_ratio(a, b).min(char_overlap_ratio(b, a))
}

/// Similarity of two raw field values under `metric`
pub fn similarity(metric: SimilarityMetric, a: &str, b: &str) -> f64 {
    let a = normalize_field(a);
    let b = normalize_field(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    if let Some(score) = exact_match(&a, &b) {
        return score;
    }
    match metric {
        SimilarityMetric::CharOverlap => char_overlap(&a, &b),
        SimilarityMetric::JaroWinkler => jaro_winkler(&a, &b),
        SimilarityMetric::Levenshtein => normalized_levenshtein(&a, &b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_field() {
        assert_eq!(normalize_field("  Jane   DOE "), "jane doe");
    }

    #[test]
    fn test_exact_after_normalization() {
        assert_eq!(
            similarity(SimilarityMetric::CharOverlap, "Jane Doe", " jane  doe"),
            1.0
        );
    }

    #[test]
    fn test_empty_never_matches() {
        assert_eq!(similarity(SimilarityMetric::CharOverlap, "", ""), 0.0);
        assert_eq!(similarity(SimilarityMetric::JaroWinkler, "a", " "), 0.0);
    }

    #[test]
    fn test_char_overlap_ratio() {
        // every char of "jon" is in "john", divided by max len 4
        assert!((char_overlap_ratio("jon", "john") - 0.75).abs() < 1e-9);
        // "john" -> 'h' missing from "jon"
        assert!((char_overlap_ratio("john", "jon") - 0.75).abs() < 1e-9);
    }

    #[test]
    fn test_char_overlap_is_symmetric() {
        let ab = char_overlap("jane doe", "jane d.");
        let ba = char_overlap("jane d.", "jane doe");
        assert_eq!(ab, ba);
    }

    #[test]
    fn test_char_overlap_accepts_anagrams() {
        assert_eq!(similarity(SimilarityMetric::CharOverlap, "listen", "silent"), 1.0);
        assert!(similarity(SimilarityMetric::Levenshtein, "listen", "silent") < 0.8);
    }

    #[test]
    fn test_jaro_winkler() {
        let score = similarity(SimilarityMetric::JaroWinkler, "jonathan", "jonathon");
        assert!(score > 0.9, "got {}", score);
    }
}
