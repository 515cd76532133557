//! Global error types for the Cargoline client.
//!
//! All error categories across the client are unified into a single
//! `ClError` enum with conversions from underlying library errors.

use thiserror::Error;

/// Convenience type alias for Results using ClError.
pub type ClResult<T> = Result<T, ClError>;

/// Unified error type covering all error categories in the Cargoline client.
#[derive(Error, Debug)]
pub enum ClError {
    // -- Configuration errors --
    /// Failed to load or parse application configuration.
    #[error("configuration error: {0}")]
    Config(String),

    /// A required configuration value is missing.
    #[error("missing configuration: {0}")]
    MissingConfig(String),

    // -- Realtime transport errors --
    /// Transport-level connection error.
    #[error("transport error: {0}")]
    Transport(String),

    /// The transport connection is closed.
    #[error("transport closed")]
    TransportClosed,

    /// Authentication handshake was rejected by the server.
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    // -- File/IO errors --
    /// File system operation failed.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    // -- Generic --
    /// An unexpected internal error.
    #[error("internal error: {0}")]
    Internal(String),

    /// Wrapping anyhow errors for interop.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<serde_json::Error> for ClError {
    fn from(e: serde_json::Error) -> Self {
        ClError::Serialization(e.to_string())
    }
}

impl From<toml::de::Error> for ClError {
    fn from(e: toml::de::Error) -> Self {
        ClError::Config(e.to_string())
    }
}

impl From<toml::ser::Error> for ClError {
    fn from(e: toml::ser::Error) -> Self {
        ClError::Serialization(e.to_string())
    }
}
