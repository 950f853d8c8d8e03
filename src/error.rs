//! Error types for the AIRA interview engine

use thiserror::Error;

/// Result type alias for interview operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the interview engine
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Speech synthesis error
    #[error("voice error: {0}")]
    Voice(String),

    /// Speech recognition error
    #[error("recognition error: {0}")]
    Recognition(String),

    /// Question generation error (remote call, empty response)
    #[error("generation error: {0}")]
    Generation(String),

    /// Generation response could not be coerced into questions
    #[error("parse error: {0}")]
    Parse(String),

    /// Resume fetch or extraction error
    #[error("resume error: {0}")]
    Resume(String),

    /// Wrong passcode entered at the gate
    #[error("passcode error: {0}")]
    Passcode(String),

    /// Session already ended or shut down
    #[error("session closed")]
    SessionClosed,

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP error
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("toml error: {0}")]
    Toml(#[from] toml::de::Error),
}
