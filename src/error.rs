//! Error types for the posture monitoring library.

use thiserror::Error;

/// Main error type for the library
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed frame or landmark data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration or threshold update rejected
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// YAML or JSON (de)serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Perspective solver could not be constructed
    #[error("Solver error: {0}")]
    Solver(String),

    /// The classification service worker is no longer running
    #[error("Classification service stopped")]
    ServiceStopped,

    /// Generic I/O error with description
    #[error("I/O error: {0}")]
    IoError(String),
}

#[cfg(feature = "opencv")]
impl From<opencv::Error> for Error {
    fn from(err: opencv::Error) -> Self {
        Self::Solver(err.to_string())
    }
}

/// Convenience type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, Error>;
