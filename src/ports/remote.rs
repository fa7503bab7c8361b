use async_trait::async_trait;

use crate::domain::{ApiKey, ResolvedAudio, TranscribeError};

/// Audio payload handed to a remote transcription provider.
#[derive(Debug, Clone)]
pub struct AudioUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl From<ResolvedAudio> for AudioUpload {
    fn from(audio: ResolvedAudio) -> Self {
        let (filename, bytes, mime_type) = audio.into_parts();
        Self {
            filename,
            bytes,
            mime_type,
        }
    }
}

/// Port for a remote transcription API.
///
/// One attempt per call: implementations do not retry and use the
/// transport's default timeout.
#[async_trait]
pub trait RemoteTranscriber: Send + Sync {
    async fn transcribe(
        &self,
        upload: AudioUpload,
        api_key: &ApiKey,
        language: &str,
    ) -> Result<String, TranscribeError>;
}
