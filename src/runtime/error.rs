//! Error types for the tickloop runtime
//!
//! Domain errors use thiserror; `anyhow` is reserved for the outer
//! boundary (storage helpers and the CLI). Activities have no error
//! channel at all and never appear here.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level runtime error
#[derive(Debug, Error)]
pub enum RuntimeError {
    /// Script lookup and decoding errors
    #[error("Script error: {0}")]
    Script(#[from] ScriptError),

    /// Recorder misuse
    #[error("Recorder error: {0}")]
    Recorder(#[from] RecorderError),

    /// Storage-related errors
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Script registry and reel encoding errors
#[derive(Debug, Error)]
pub enum ScriptError {
    /// No script registered under this name
    #[error("No such script: '{0}'")]
    NotFound(String),

    /// Stored text is not a valid reel
    #[error("Script '{name}' could not be decoded: {detail}")]
    Decode {
        /// Script name (or `<inline>` when decoding anonymous text)
        name: String,
        /// Description of the decoding failure
        detail: String,
    },

    /// A snapshot could not be encoded
    #[error("Reel encoding failed: {0}")]
    Encode(String),
}

/// Convenience result alias for script operations
pub type ScriptResult<T> = std::result::Result<T, ScriptError>;

/// Recorder misuse: recording and playback are mutually exclusive
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RecorderError {
    /// Tried to start recording while playing back
    #[error("Cannot start recording while playback is active")]
    PlaybackActive,

    /// Tried to start playback while recording
    #[error("Cannot start playback while recording is active")]
    RecordingActive,
}

/// Convenience result alias for recorder operations
pub type RecorderResult<T> = std::result::Result<T, RecorderError>;

/// Storage-specific errors
#[derive(Debug, Error)]
pub enum StorageError {
    /// Path not found
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Script name is not a single path component
    #[error("Invalid script name: '{0}'")]
    InvalidScriptName(String),

    /// Atomic write failed
    #[error("Atomic write failed for {path}: {detail}")]
    AtomicWriteFailed {
        /// Path where write failed
        path: PathBuf,
        /// Error details
        detail: String,
    },
}

/// Result type using RuntimeError
pub type Result<T> = std::result::Result<T, RuntimeError>;
