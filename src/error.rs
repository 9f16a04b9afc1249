//! Error types for scriptrag.

use thiserror::Error;

/// Library-level error type for scriptrag operations.
#[derive(Error, Debug)]
pub enum ScriptRagError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("No episode marker in file name: {0}")]
    UnresolvableEpisode(String),

    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    #[error("Embedding generation failed: {0}")]
    Embedding(String),

    #[error("Vector store error: {0}")]
    VectorStore(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Failed to persist file: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for scriptrag operations.
pub type Result<T> = std::result::Result<T, ScriptRagError>;
