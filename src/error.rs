//! Error type for the fallible edges of the crate.
//!
//! The comparison engine itself never fails.  Loading benefit
//! schedules, persisting history and reading configuration can, and
//! report through [`Error`].

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid JSON in {path:?}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("invalid scenario: {field} {reason}")]
    InvalidScenario { field: &'static str, reason: &'static str },

    #[error("calculation is undefined for these inputs: {0} is not finite")]
    UndefinedResult(&'static str),

    #[error("no benefit schedule for tax year {0}")]
    UnknownTaxYear(String),

    #[error("invalid value for {key}: {reason}")]
    Config { key: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;
