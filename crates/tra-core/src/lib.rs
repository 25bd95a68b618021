//! TRA Core Engine
//!
//! Talent Resolution & Assessment: turns noisy, per-source extractions about
//! people into validated candidate profiles. Pure computation, designed to
//! run identically in browser (WASM) and server (native) environments.
//!
//! # Pipeline
//!
//! 1. [`entity`] merges per-source records into one identity per person
//! 2. [`normalize`] and [`group`] key claims by person and fact
//! 3. [`validate`] scores every group and settles contradictions
//! 4. [`index`] computes the five-dimension Extraordinary Index
//! 5. [`plan`] and [`profile`] turn the result into actions and a profile
//!
//! [`pipeline::Engine`] runs all of it for a batch.
//!
//! # Features
//!
//! - `native` - Enable all native optimizations
//! - `parallel` - Resolve candidates in parallel via rayon
//! - `wasm` - WASM-compatible build (excludes native-only features)
//!
//! # Example
//!
//! ```rust
//! use chrono::NaiveDate;
//! use serde_json::json;
//! use tra_core::{BatchInput, Engine, EngineConfig, RawRecord};
//!
//! let record: RawRecord = serde_json::from_value(json!({
//!     "source_id": "gh-1",
//!     "source_type": "github",
//!     "content": {"name": "Jane Doe", "email": "jane@example.org"},
//!     "extraction_confidence": 0.9
//! }))
//! .unwrap();
//!
//! let engine = Engine::new(EngineConfig::default())
//!     .unwrap()
//!     .with_today(NaiveDate::from_ymd_opt(2025, 1, 1).unwrap());
//! let output = engine.process(BatchInput { records: vec![record], claims: vec![] });
//!
//! assert_eq!(output.candidates[0].candidate.candidate_id, "candidate_jane_example_org");
//! ```

pub mod claim;
pub mod config;
pub mod entity;
pub mod error;
pub mod fuzzy;
pub mod group;
pub mod index;
pub mod normalize;
pub mod pipeline;
pub mod plan;
pub mod profile;
pub mod validate;

// Re-export main types at crate root
pub use claim::{Claim, ClaimBuilder, ClaimId, ClaimTable, ClaimValue, FactType, RawClaim, Source, SourceType};
pub use config::{EngineConfig, IndexWeights, RecencyConfig};
pub use entity::{
    Contradiction, ContradictionKind, EntityCluster, EntityMerger, ExtractedRecord, RawRecord,
    ResolvedIdentity, Severity,
};
pub use error::{ConfigError, ItemError, ResolutionError, ValidationError};
pub use fuzzy::{FieldMatcher, SimilarityMetric};
pub use group::{group_by_fact_key, ClaimGroup};
pub use index::{ExtraordinaryIndex, IndexCalculator, IndexSignals};
pub use normalize::{fact_key, normalize_person, ClaimNormalizer, FactKey};
pub use pipeline::{
    process_batch_json, BatchInput, BatchOutput, CandidateInput, CandidateReport, Engine,
    PreparedBatch, ProcessedCandidate,
};
pub use plan::{ActionPlan, ActionPlanner, Priority};
pub use profile::{Profile, ProfileComposer};
pub use validate::{resolve_claims_json, ContradictionResolver, ResolvedClaims};
