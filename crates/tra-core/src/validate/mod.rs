//! Claim Cross-Validation & Contradiction Resolution
//!
//! Scores every fact-key group and settles it into one asserted claim:
//!
//! - **Singleton**: one claim, accepted outright only from a high-authority source
//! - **Corroborated**: agreeing claims merged, sources unioned, confidence rescored
//! - **Contradicted**: a primary elected, dissenters attached, review flagged
//!
//! # Confidence
//!
//! ```text
//! 0.4 * max authority + 0.3 * source-type breadth + 0.2 * extraction + 0.1 * recency
//! ```
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use tra_core::claim::{ClaimBuilder, Source, SourceType};
//! use tra_core::config::EngineConfig;
//! use tra_core::normalize::ClaimNormalizer;
//! use tra_core::validate::ContradictionResolver;
//!
//! let config = EngineConfig::default();
//! let raw = ClaimBuilder::new()
//!     .person("Jane Doe")
//!     .fact_type("email")
//!     .text("jane@ibm.com")
//!     .source(Source::new(SourceType::Ibm, "https://ibm.com/jane", 0.9, 0))
//!     .build();
//!
//! let (claims, _) = ClaimNormalizer::new(&config).normalize_all(vec![raw]);
//! let today = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
//! let resolved = ContradictionResolver::new(&config, today).resolve(claims);
//! assert_eq!(resolved.summary.total_groups, 1);
//! ```

pub mod confidence;
mod resolver;
pub mod temporal;
mod types;

pub use confidence::{claim_extraction_confidence, ConfidenceBreakdown, ConfidenceScorer};
pub use resolver::{
    resolve_claims_json, ContradictionResolver, ResolveInput, ResolveOutput, ResolvedClaims,
    SINGLE_SOURCE_NOTE,
};
pub use temporal::RecencyScorer;
pub use types::{GroupResolution, ResolutionKind, ResolutionSummary};
