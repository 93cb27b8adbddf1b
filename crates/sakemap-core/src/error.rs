//! Error types for sakemap.
//!
//! The matching engine itself never fails: malformed records are dropped and
//! empty inputs flow through to empty outputs. Errors only come from the
//! collaborators around it (configuration, catalog sources, preference
//! files, CSV export).

use thiserror::Error;

/// Result type alias for sakemap operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in sakemap collaborators.
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration could not be loaded or failed validation.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A catalog resource could not be retrieved.
    #[error("Catalog error: {resource}: {message}")]
    Catalog {
        /// Resource name (e.g. `brands`).
        resource: String,
        /// What went wrong.
        message: String,
    },

    /// A vector did not have the expected shape.
    #[error("Invalid vector: expected {expected} components, got {actual}")]
    InvalidVector {
        /// Expected number of components.
        expected: usize,
        /// Actual number of components.
        actual: usize,
    },

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writer error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Self::Config(err.to_string())
    }
}

impl Error {
    /// Builds a [`Error::Catalog`] for the given resource.
    pub fn catalog(resource: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Catalog {
            resource: resource.into(),
            message: message.into(),
        }
    }
}
