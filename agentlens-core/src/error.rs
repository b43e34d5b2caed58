//! Error types for agentlens-core

use thiserror::Error;

/// Main error type for the agentlens-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Conversation or agent record not found
    #[error("lookup failed: {0}")]
    Lookup(String),

    /// Remote memory initialization failed or returned a negative result
    #[error("initialization failed: {0}")]
    Initialization(String),

    /// Network-level failure talking to the runtime API
    #[error("transport error: {0}")]
    Transport(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for agentlens-core
pub type Result<T> = std::result::Result<T, Error>;
