//! Error types for the extract-load pipeline.

use std::fmt;

use chrono::{DateTime, FixedOffset};
use thiserror::Error;

use crate::models::ResourceKind;

/// Main error type for all pipeline operations.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A page request could not be completed.
    #[error("Fetch error: {0}")]
    FetchError(String),

    /// Invalid or expired access token.
    #[error("Bad credentials: {0}")]
    BadCredentials(String),

    /// Too many requests - rate limited.
    #[error("Quota exceeded: too many requests")]
    QuotaExceeded,

    /// A raw record lacked a mandatory field.
    #[error("Mapping error: {kind} record is missing or has a malformed `{field}`")]
    MappingError { kind: ResourceKind, field: String },

    /// The row collection failed a validation check.
    #[error("Integrity error: {0}")]
    IntegrityError(#[from] IntegrityError),

    /// The warehouse could not write the rows.
    #[error("Load error: {0}")]
    LoadError(String),

    /// Missing or invalid configuration.
    #[error("Config error: {0}")]
    ConfigError(String),

    /// HTTP request failed.
    #[error("Request error: {0}")]
    RequestError(#[from] reqwest::Error),

    /// JSON parsing failed.
    #[error("Parse error: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl PipelineError {
    /// Pipeline stage an error belongs to, used when logging failures.
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::FetchError(_)
            | PipelineError::BadCredentials(_)
            | PipelineError::QuotaExceeded
            | PipelineError::RequestError(_)
            | PipelineError::ParseError(_) => Stage::Fetch,
            PipelineError::MappingError { .. } => Stage::Mapping,
            PipelineError::IntegrityError(_) => Stage::Validate,
            PipelineError::LoadError(_) => Stage::Load,
            PipelineError::ConfigError(_) => Stage::Config,
        }
    }
}

/// Validation failures detected on an assembled row collection.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum IntegrityError {
    /// Two or more rows share a primary-key tuple.
    #[error("primary key violated for ({keys}): {duplicates} duplicate row(s)")]
    DuplicateKey { keys: String, duplicates: usize },

    /// A row holds a null value.
    #[error("null values found in `{field}` (row {row})")]
    NullValue { field: &'static str, row: usize },

    /// A played_at timestamp is older than the lookback interval.
    #[error(
        "timestamp not within the valid interval: {timestamp} is {elapsed_hours}h old, limit is {interval_hours}h"
    )]
    StaleTimestamp {
        timestamp: DateTime<FixedOffset>,
        elapsed_hours: i64,
        interval_hours: i64,
    },
}

/// Pipeline stages, as reported in logs and notifications.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Fetch,
    Mapping,
    Validate,
    Load,
    Config,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Fetch => "fetch",
            Stage::Mapping => "mapping",
            Stage::Validate => "validate",
            Stage::Load => "load",
            Stage::Config => "config",
        };
        f.write_str(name)
    }
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;
