//! Entity resolution across per-source records
//!
//! Decides which extracted records describe the same person and merges
//! each group into one [`ResolvedIdentity`]:
//!
//! 1. Compare every pair on `email`, `name`, `username`, `phone`, `location`
//! 2. Join matching pairs transitively (union-find)
//! 3. Merge fields in confidence order; lists union, maps merge shallowly
//! 4. Score the cluster and report fields its records disagree on
//!
//! # Example
//!
//! ```rust
//! use serde_json::json;
//! use tra_core::claim::SourceType;
//! use tra_core::config::EngineConfig;
//! use tra_core::entity::{EntityMerger, ExtractedRecord};
//!
//! let config = EngineConfig::default();
//! let clusters = EntityMerger::new(&config).resolve(vec![
//!     ExtractedRecord::new("gh-1", SourceType::Github, 0.9).with("email", json!("jane@x.io")),
//!     ExtractedRecord::new("cv-1", SourceType::Resume, 0.7).with("email", json!("jane@x.io")),
//! ]);
//! assert_eq!(clusters.len(), 1);
//! assert_eq!(clusters[0].candidate_id, "candidate_jane_x_io");
//! ```

mod contradiction;
mod identity;
mod merger;
mod record;

pub use contradiction::{Contradiction, ContradictionKind, Severity};
pub use identity::{is_present, ResolvedIdentity, IDENTIFYING_FIELDS};
pub use merger::{
    candidate_id, merge_records, resolution_confidence, EntityCluster, EntityMatch, EntityMerger,
    ResolutionMetadata, ResolutionMethod, COMPARED_FIELDS,
};
pub use record::{ExtractedRecord, RawRecord};
