use std::path::Path;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use tracing::debug;

use crate::domain::audio::{extension_for_subtype, mime_for_extension};
use crate::domain::{AudioReference, ResolvedAudio, TranscribeError};
use crate::ports::HttpClient;

/// MIME type assumed when a server omits the content-type header.
const FALLBACK_MIME: &str = "application/octet-stream";

/// Normalizes an [`AudioReference`] into a buffered payload with a
/// filename hint and MIME type.
///
/// Remote and local payloads are read fully into memory; the practical
/// maximum file size is bounded by available memory, not by the remote
/// upload limit enforced later.
pub struct InputResolver {
    http: Arc<dyn HttpClient>,
}

impl InputResolver {
    pub fn new(http: Arc<dyn HttpClient>) -> Self {
        Self { http }
    }

    pub async fn resolve(
        &self,
        reference: &AudioReference,
    ) -> Result<ResolvedAudio, TranscribeError> {
        match reference {
            AudioReference::DataUri { subtype, payload } => Self::resolve_data_uri(subtype, payload),
            AudioReference::RemoteUrl(url) => self.resolve_url(url).await,
            AudioReference::LocalPath(path) => Self::resolve_local(path).await,
        }
    }

    fn resolve_data_uri(subtype: &str, payload: &str) -> Result<ResolvedAudio, TranscribeError> {
        let extension = extension_for_subtype(subtype).ok_or_else(|| {
            TranscribeError::UnsupportedFormat(format!(
                "unsupported data URI subtype 'audio/{subtype}'"
            ))
        })?;

        let bytes = BASE64.decode(payload).map_err(|e| {
            TranscribeError::UnsupportedFormat(format!("invalid base64 payload: {e}"))
        })?;

        debug!(subtype = subtype, bytes = bytes.len(), "Resolved data URI");

        Ok(ResolvedAudio::new(
            bytes,
            format!("audio.{extension}"),
            format!("audio/{subtype}"),
        ))
    }

    async fn resolve_url(&self, url: &str) -> Result<ResolvedAudio, TranscribeError> {
        let fetched = self.http.get_bytes(url).await?;

        let filename = url::Url::parse(url)
            .ok()
            .and_then(|parsed| {
                parsed
                    .path_segments()
                    .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
                    .map(str::to_string)
            })
            .unwrap_or_else(|| "audio".to_string());

        // The declared content type is trusted as-is, not re-validated.
        let mime_type = fetched
            .content_type
            .unwrap_or_else(|| FALLBACK_MIME.to_string());

        debug!(url = url, filename = %filename, mime = %mime_type, bytes = fetched.bytes.len(), "Resolved remote URL");

        Ok(ResolvedAudio::new(fetched.bytes, filename, mime_type))
    }

    async fn resolve_local(path: &Path) -> Result<ResolvedAudio, TranscribeError> {
        let bytes = tokio::fs::read(path).await.map_err(|e| {
            TranscribeError::Fetch(format!("failed to read {}: {e}", path.display()))
        })?;

        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| "audio".to_string());

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_lowercase)
            .ok_or_else(|| {
                TranscribeError::UnsupportedFormat(format!(
                    "{} has no file extension",
                    path.display()
                ))
            })?;

        let mime_type = mime_for_extension(&extension).ok_or_else(|| {
            TranscribeError::UnsupportedFormat(format!("unsupported file extension '.{extension}'"))
        })?;

        debug!(path = %path.display(), mime = mime_type, bytes = bytes.len(), "Resolved local file");

        Ok(ResolvedAudio::new(bytes, filename, mime_type))
    }
}
