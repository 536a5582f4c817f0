//! Error types for Slowed.

use thiserror::Error;

/// Library-level error type for Slowed operations.
#[derive(Error, Debug)]
pub enum SlowedError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Track source error: {0}")]
    TrackSource(String),

    #[error("No new trending track found")]
    NoTrack,

    #[error("Audio download failed: {0}")]
    AudioDownload(String),

    #[error("Audio processing failed: {0}")]
    Effects(String),

    #[error("History store error: {0}")]
    History(String),

    #[error("Notification failed: {0}")]
    Notify(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("WAV error: {0}")]
    Wav(#[from] hound::Error),

    #[error("External tool not found: {0}. Please install it and ensure it's in your PATH.")]
    ToolNotFound(String),

    #[error("External tool failed: {0}")]
    ToolFailed(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Result type alias for Slowed operations.
pub type Result<T> = std::result::Result<T, SlowedError>;
