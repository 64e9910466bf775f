//! Error taxonomy for the record store and maintenance passes.
//!
//! The CLI wraps these in `anyhow`; library callers can match on them.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the repository, resolver and flag store.
#[derive(Debug, Error)]
pub enum Error {
    /// No persisted record of this kind exists for the company.
    #[error("No {kind} record found for company '{company}'")]
    NotFound { kind: String, company: String },

    /// Malformed input: unknown category, bad enum value, bad date, empty text.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Read or write failure on the data directory.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A typed record could not be rendered back to text.
    #[error("Failed to serialize record: {0}")]
    Serialize(String),
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn not_found(kind: impl Into<String>, company: impl Into<String>) -> Self {
        Error::NotFound {
            kind: kind.into(),
            company: company.into(),
        }
    }

    /// True for `NotFound`, used by callers that treat a missing record as empty.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
