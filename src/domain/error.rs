use thiserror::Error;

/// Classified failures for a single transcription attempt.
///
/// Every lower-layer failure (transport, filesystem, decoder, provider) is
/// normalized into exactly one of these kinds before it reaches the host.
/// All of them are terminal: nothing is retried internally.
#[derive(Error, Debug)]
pub enum TranscribeError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unsupported audio format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to fetch audio: {0}")]
    Fetch(String),

    #[error("Audio payload of {actual_bytes} bytes exceeds the {limit_bytes} byte upload limit")]
    SizeLimit { actual_bytes: u64, limit_bytes: u64 },

    #[error("Transcription API error: {0}")]
    RemoteApi(String),

    #[error("Failed to load speech model: {0}")]
    ModelLoad(String),
}
