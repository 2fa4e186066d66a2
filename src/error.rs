//! Error types for playback and command handling.

/// Result type alias for playback operations.
pub type Result<T> = std::result::Result<T, PlaybackError>;

/// Everything that can stop a buffer from becoming audible.
///
/// These never cross into the expression controller: the playback router
/// logs them, fires the completion callback and hands them back to an
/// awaiting caller only.
#[derive(Debug, thiserror::Error)]
pub enum PlaybackError {
    /// Empty or malformed input buffer
    #[error("invalid input buffer: {0}")]
    InvalidInput(String),

    /// Codec failure
    #[error("audio decode failed: {0}")]
    Decode(#[source] anyhow::Error),

    /// Fetching the audio bytes failed before decoding
    #[error("audio fetch failed: {0}")]
    Transport(#[from] FetchError),

    /// Output device could not be opened or written
    #[error("audio device error: {0}")]
    Device(#[source] anyhow::Error),
}

/// Failure while retrieving audio bytes from a URL.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),
}

/// An emotion name outside the known preset set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown emotion preset: {0}")]
pub struct InvalidPresetError(pub String);
