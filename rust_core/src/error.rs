//! Error types for configuration decoding.
//!
//! Unresolved teams and leagues are not errors; the resolver returns `None`
//! and the caller reports them to a diagnostics sink.

use std::path::PathBuf;
use thiserror::Error;

/// Fatal configuration failure. Aborts the run before any matching happens.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("sports config must be a JSON object keyed by league")]
    NotAnObject,

    #[error("league '{league}' is missing required field '{field}'")]
    MissingField { league: String, field: &'static str },

    #[error("league '{league}' is invalid: {source}")]
    InvalidLeague {
        league: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("sports config {path} was missing; wrote a template, edit it before restarting")]
    TemplateWritten { path: PathBuf },
}
