//! Error types for Dubba.

use thiserror::Error;

/// Library-level error type for Dubba operations.
#[derive(Error, Debug)]
pub enum DubbaError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Ledger error: {0}")]
    Ledger(String),

    #[error("Ledger file not found: {0}")]
    LedgerNotFound(String),

    #[error("Audio decode failed: {0}")]
    AudioDecode(String),

    #[error("Audio export failed: {0}")]
    AudioExport(String),

    #[error("Audio processing error: {0}")]
    Audio(String),

    #[error("Diarization failed: {0}")]
    Diarization(String),

    #[error("Speech synthesis failed: {0}")]
    Synthesis(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Dubba operations.
pub type Result<T> = std::result::Result<T, DubbaError>;
