//! Error types for the storage core

use thiserror::Error;

/// Result type alias for storage core operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the storage core
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid component wiring or configuration, raised at construction
    #[error("Configuration error: {0}")]
    Config(String),

    /// One-time setup (index creation, counter binding) failed
    #[error("Initialization failed: {0}")]
    Initialization(String),

    /// The backing store could not be read or written
    #[error("Backend error: {0}")]
    Backend(String),

    /// A change listener failed while handling an event
    #[error("Listener error: {0}")]
    Listener(String),

    /// A pattern or statement does not fit the index layout
    #[error("Invalid pattern: {0}")]
    InvalidPattern(String),

    /// A term cannot be represented by the dictionary
    #[error("Invalid term: {0}")]
    InvalidTerm(String),

    /// Snapshot or configuration (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(String),
}

impl Error {
    /// Whether this error comes from the backing store rather than the caller
    pub fn is_backend(&self) -> bool {
        matches!(self, Error::Backend(_) | Error::Io(_))
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}
