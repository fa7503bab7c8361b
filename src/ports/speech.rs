use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::{ModelConfig, ResolvedAudio, TranscribeError};

/// Options for a single inference pass.
#[derive(Debug, Clone)]
pub struct TranscribeOptions {
    /// ISO 639-1 language hint. None lets the model detect the language.
    pub language: Option<String>,
    /// Suppress silence and non-speech segments.
    pub vad_filter: bool,
    /// Decode with the multilingual vocabulary.
    pub multilingual: bool,
}

impl Default for TranscribeOptions {
    fn default() -> Self {
        Self {
            language: None,
            vad_filter: true,
            multilingual: true,
        }
    }
}

/// Port for a loaded local speech-to-text model.
#[async_trait]
pub trait SpeechModel: Send + Sync {
    /// Transcribe the audio payload, returning text segments in decode
    /// order. Callers decide how to join them.
    async fn transcribe(
        &self,
        audio: &ResolvedAudio,
        options: &TranscribeOptions,
    ) -> Result<Vec<String>, TranscribeError>;
}

/// Port for constructing a [`SpeechModel`] from a configuration.
///
/// Implementations own artifact acquisition: probing the model cache
/// directory and downloading when absent, so the final load can run
/// against local files only.
#[async_trait]
pub trait ModelLoader: Send + Sync {
    async fn load(&self, config: &ModelConfig) -> Result<Arc<dyn SpeechModel>, TranscribeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcribe_options_default() {
        let options = TranscribeOptions::default();
        assert!(options.language.is_none());
        assert!(options.vad_filter);
        assert!(options.multilingual);
    }
}
