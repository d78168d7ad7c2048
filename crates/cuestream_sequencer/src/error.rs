// SPDX-License-Identifier: MIT OR Apache-2.0
//! Error types shared by the sequencer and its collaborators.

/// Error raised by a sound cue collaborator
#[derive(Debug, thiserror::Error)]
pub enum AudioError {
    /// No clip is registered under this name
    #[error("Unknown sound cue: {0}")]
    UnknownCue(String),

    /// The clip name does not end in a supported extension
    #[error("Unsupported audio format: {0} (expected wav, ogg or mp3)")]
    UnsupportedFormat(String),
}

/// Error when looking up sprite animations
#[derive(Debug, thiserror::Error)]
pub enum AnimationError {
    /// No animation is registered under this name
    #[error("Animation not found: {0}")]
    NotFound(String),
}

/// Error when loading configuration files
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid RON for the expected structure
    #[error("Failed to parse config: {0}")]
    Parse(#[from] ron::error::SpannedError),
}
