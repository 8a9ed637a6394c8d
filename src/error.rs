//! Error types for the Murmur assistant

use thiserror::Error;

/// Result type alias for Murmur operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the Murmur assistant
#[derive(Debug, Error)]
pub enum Error {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Audio device error
    #[error("audio error: {0}")]
    Audio(String),

    /// Transport-level speech-to-text failure (network, service)
    ///
    /// Benign capture outcomes (timeout, unrecognized speech) are not
    /// errors; they surface as an empty capture instead.
    #[error("transcription error: {0}")]
    Transcription(String),

    /// Speech synthesis error
    #[error("synthesis error: {0}")]
    Synthesis(String),

    /// Translation service error
    #[error("translation error: {0}")]
    Translation(String),

    /// Transient lookup service failure (weather, stocks, encyclopedia, AI)
    #[error("{capability} lookup failed: {message}")]
    Lookup {
        /// Capability whose lookup failed
        capability: &'static str,
        /// Underlying failure description
        message: String,
    },

    /// Capability is disabled or was never configured
    #[error("{0} is not available")]
    CapabilityUnavailable(&'static str),

    /// System action (open app, volume, shutdown) failed
    #[error("action error: {0}")]
    Action(String),

    /// Arithmetic expression could not be parsed or evaluated
    #[error("invalid expression: {0}")]
    InvalidExpression(String),

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
