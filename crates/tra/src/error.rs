//! Error type for the TRA service layer.

use thiserror::Error;
use tra_core::{ConfigError, ResolutionError};

/// Common error type for TRA operations.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration rejected at start-up
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A candidate's resolution run failed
    #[error("resolution error: {0}")]
    Resolution(#[from] ResolutionError),

    /// A source fetcher failed
    #[error("fetch error from '{source_name}': {message}")]
    Fetch { source_name: String, message: String },
}

/// Result type alias using TRA Error.
pub type Result<T> = std::result::Result<T, Error>;
