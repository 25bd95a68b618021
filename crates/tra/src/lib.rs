//! # TRA Service Library
//!
//! Async shell around [`tra_core`]:
//! - **config**: engine configuration loading and validation
//! - **fetch**: source fetchers and concurrent record gathering
//! - **runner**: per-candidate deadlines on the blocking pool
//! - **error**: common error type
//! - **tracing**: logging setup
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use tra::fetch::{gather_records, JsonFileFetcher, SourceFetcher, DEFAULT_CONCURRENCY};
//! use tra::runner::BatchRunner;
//! use tra_core::Engine;
//!
//! # async fn demo() -> tra::Result<()> {
//! let engine = Engine::new(tra::config::load(None)?)?;
//! let fetchers: Vec<Arc<dyn SourceFetcher>> = vec![Arc::new(JsonFileFetcher::new("records.json"))];
//! let gathered = gather_records(fetchers, DEFAULT_CONCURRENCY).await;
//! let output = BatchRunner::new(engine).run(gathered.batch).await;
//! println!("{} candidates", output.candidates.len());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod fetch;
pub mod runner;
pub mod tracing;

// Re-export commonly used items at crate root
pub use error::{Error, Result};
pub use fetch::{gather_records, FetchFailure, Fetched, Gathered, JsonFileFetcher, SourceFetcher};
pub use runner::{shutdown_signal, BatchRunner, RunReport};
