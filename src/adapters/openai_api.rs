use async_trait::async_trait;
use reqwest::multipart;
use serde::Deserialize;
use tracing::{debug, info};

use crate::domain::{ApiKey, TranscribeError};
use crate::ports::{AudioUpload, RemoteTranscriber};

/// Default OpenAI transcription endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Fixed remote model identifier sent with every request.
const REMOTE_MODEL: &str = "whisper-1";

#[derive(Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// [`RemoteTranscriber`] backed by the OpenAI audio transcription API.
///
/// One multipart POST per call; no retry, transport-default timeout.
pub struct OpenAiTranscriber {
    client: reqwest::Client,
    endpoint: String,
}

impl OpenAiTranscriber {
    pub fn new() -> Result<Self, TranscribeError> {
        Self::with_endpoint(DEFAULT_ENDPOINT)
    }

    /// Point the client at a different OpenAI-compatible endpoint.
    pub fn with_endpoint(endpoint: impl Into<String>) -> Result<Self, TranscribeError> {
        let client = reqwest::Client::builder()
            .use_rustls_tls()
            .user_agent(format!("sotto/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TranscribeError::RemoteApi(format!("failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    /// Pull the provider's error message out of a non-success body,
    /// falling back to the raw body or bare status.
    fn error_message(status: reqwest::StatusCode, body: &str) -> String {
        match serde_json::from_str::<ErrorResponse>(body) {
            Ok(parsed) => parsed.error.message,
            Err(_) if body.trim().is_empty() => format!("HTTP {status}"),
            Err(_) => format!("HTTP {status}: {}", body.trim()),
        }
    }
}

#[async_trait]
impl RemoteTranscriber for OpenAiTranscriber {
    async fn transcribe(
        &self,
        upload: AudioUpload,
        api_key: &ApiKey,
        language: &str,
    ) -> Result<String, TranscribeError> {
        let file_part = multipart::Part::bytes(upload.bytes)
            .file_name(upload.filename.clone())
            .mime_str(&upload.mime_type)
            .map_err(|e| {
                TranscribeError::RemoteApi(format!(
                    "invalid MIME type '{}': {e}",
                    upload.mime_type
                ))
            })?;

        let form = multipart::Form::new()
            .part("file", file_part)
            .text("model", REMOTE_MODEL)
            .text("language", language.to_string());

        debug!(
            filename = %upload.filename,
            language = language,
            "Sending audio to transcription API"
        );

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(api_key.expose())
            .multipart(form)
            .send()
            .await
            .map_err(|e| TranscribeError::RemoteApi(format!("request failed: {e}")))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TranscribeError::RemoteApi(format!("failed to read response: {e}")))?;

        if !status.is_success() {
            return Err(TranscribeError::RemoteApi(Self::error_message(
                status, &body,
            )));
        }

        let parsed: TranscriptionResponse = serde_json::from_str(&body)
            .map_err(|e| TranscribeError::RemoteApi(format!("malformed response body: {e}")))?;

        info!(chars = parsed.text.len(), "Remote transcription completed");

        Ok(parsed.text)
    }
}
