//! Fuzzy field matching for entity resolution
//!
//! # Strategies
//!
//! 1. Exact match after normalization (score: 1.0)
//! 2. One configured metric:
//!    - character overlap (default)
//!    - Jaro-Winkler similarity
//!    - normalized Levenshtein
//!
//! # Example
//!
//! ```rust
//! use tra_core::fuzzy::{FieldMatcher, SimilarityMetric};
//!
//! let matcher = FieldMatcher::new(SimilarityMetric::CharOverlap, 0.8);
//! assert!(matcher.matches("Jane Doe", "jane  doe"));
//! assert!(!matcher.matches("Jane Doe", "Bob Smith"));
//! ```

mod strategies;

pub use strategies::{char_overlap, char_overlap_ratio, normalize_field, similarity, SimilarityMetric};

/// A similarity metric paired with the threshold a match must reach
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldMatcher {
    pub metric: SimilarityMetric,
    pub threshold: f64,
}

impl FieldMatcher {
    pub fn new(metric: SimilarityMetric, threshold: f64) -> Self {
        Self { metric, threshold }
    }

    pub fn score(&self, a: &str, b: &str) -> f64 {
        similarity(self.metric, a, b)
    }

    pub fn matches(&self, a: &str, b: &str) -> bool {
        self.score(a, b) >= self.threshold
    }
}
