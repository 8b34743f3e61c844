use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Source document collection is missing or unreadable
    #[error("input not found: {path}")]
    InputNotFound {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Source collection is not a JSON array of valid documents
    #[error("malformed input: {0}")]
    MalformedInput(String),

    /// Artifact could not be written
    #[error("failed to write {path}")]
    WriteFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Artifact is absent or does not define the expected index
    #[error("index not loaded: {0}")]
    IndexNotLoaded(String),

    /// Rejected option value
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedInput(message.into())
    }

    pub fn not_loaded(message: impl Into<String>) -> Self {
        Self::IndexNotLoaded(message.into())
    }
}
