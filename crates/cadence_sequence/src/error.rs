//! Sequence error types

use cadence_timing::TimingError;
use thiserror::Error;

/// Errors raised while loading or building a sequence
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A duration or delay parameter is out of range
    #[error("Invalid timing in step '{step}': {source}")]
    Timing {
        step: String,
        #[source]
        source: TimingError,
    },

    /// A modifier links to itself
    #[error("Modifier {modifier} of step '{step}' is synced to itself")]
    SelfLink { step: String, modifier: usize },

    /// A modifier links past the end of its step's modifier list
    #[error("Modifier {modifier} of step '{step}' is synced to missing modifier {index} (step has {len})")]
    LinkOutOfRange {
        step: String,
        modifier: usize,
        index: usize,
        len: usize,
    },

    /// Overlap time must be a finite, non-negative number of seconds
    #[error("Invalid overlap time: {0}")]
    OverlapTime(f32),

    /// Malformed JSON document
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed TOML document
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// Configuration could not be written as TOML
    #[error("TOML write error: {0}")]
    TomlWrite(#[from] toml::ser::Error),
}

/// Result type for sequence loading
pub type Result<T> = std::result::Result<T, ConfigError>;
