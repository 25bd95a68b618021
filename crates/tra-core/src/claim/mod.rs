//! Claim types - the data model of the resolution engine
//!
//! A claim is one typed assertion about a person together with every
//! source that backs it.
//!
//! # Example
//!
//! ```rust
//! use tra_core::claim::{ClaimBuilder, Source, SourceType};
//!
//! let raw = ClaimBuilder::new()
//!     .person("Dr. Jane Doe")
//!     .fact_type("patentCount")
//!     .number(52.0)
//!     .source(Source::new(SourceType::Ibm, "https://ibm.com/pr/1", 0.9, 0))
//!     .build();
//!
//! assert_eq!(raw.fact_type.as_deref(), Some("patentCount"));
//! ```

mod table;
mod types;

pub use table::ClaimTable;
pub use types::{
    Claim, ClaimBuilder, ClaimId, ClaimValue, FactType, RawClaim, Source, SourceType,
};
