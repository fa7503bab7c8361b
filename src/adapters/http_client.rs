use std::path::Path;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info};

use crate::domain::TranscribeError;
use crate::ports::{FetchedBody, HttpClient};

/// reqwest-backed implementation of the [`HttpClient`] port.
///
/// Stateless apart from the connection pool; safe to share across
/// concurrent transcription calls.
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    pub fn new() -> Result<Self, TranscribeError> {
        let client = Client::builder()
            .use_rustls_tls()
            .user_agent(format!("sotto/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TranscribeError::Fetch(format!("failed to create HTTP client: {e}")))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpClient for ReqwestClient {
    async fn get_bytes(&self, url: &str) -> Result<FetchedBody, TranscribeError> {
        debug!(url = url, "Fetching URL");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| TranscribeError::Fetch(format!("GET {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranscribeError::Fetch(format!(
                "GET {url} returned HTTP {status}"
            )));
        }

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);

        let bytes = response
            .bytes()
            .await
            .map_err(|e| TranscribeError::Fetch(format!("failed to read body of {url}: {e}")))?;

        debug!(url = url, bytes = bytes.len(), content_type = ?content_type, "Fetch complete");

        Ok(FetchedBody {
            bytes: bytes.to_vec(),
            content_type,
        })
    }

    async fn download_file(&self, url: &str, path: &Path) -> Result<(), TranscribeError> {
        use futures_util::StreamExt;
        use tokio::io::AsyncWriteExt;

        let response = self
            .client
            .get(url)
            .timeout(std::time::Duration::from_secs(3600)) // 1 hour timeout for large models
            .send()
            .await
            .map_err(|e| TranscribeError::Fetch(format!("GET {url} failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(TranscribeError::Fetch(format!(
                "GET {url} returned HTTP {status}"
            )));
        }

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| TranscribeError::Fetch(format!("failed to create {parent:?}: {e}")))?;
        }

        // Write to a temp file first, then rename atomically so a partial
        // download never masquerades as a finished artifact.
        let temp_path = path.with_extension("download");

        let cleanup_temp = || {
            let temp = temp_path.clone();
            async move {
                let _ = tokio::fs::remove_file(&temp).await;
            }
        };

        let mut file = match tokio::fs::File::create(&temp_path).await {
            Ok(f) => f,
            Err(e) => {
                cleanup_temp().await;
                return Err(TranscribeError::Fetch(format!(
                    "failed to create {temp_path:?}: {e}"
                )));
            }
        };

        let mut downloaded: u64 = 0;
        let mut stream = response.bytes_stream();

        while let Some(chunk_result) = stream.next().await {
            let chunk = match chunk_result {
                Ok(c) => c,
                Err(e) => {
                    drop(file);
                    cleanup_temp().await;
                    return Err(TranscribeError::Fetch(format!(
                        "download of {url} interrupted: {e}"
                    )));
                }
            };

            if let Err(e) = file.write_all(&chunk).await {
                drop(file);
                cleanup_temp().await;
                return Err(TranscribeError::Fetch(format!(
                    "failed to write {temp_path:?}: {e}"
                )));
            }

            downloaded += chunk.len() as u64;
        }

        if let Err(e) = file.flush().await {
            drop(file);
            cleanup_temp().await;
            return Err(TranscribeError::Fetch(format!(
                "failed to flush {temp_path:?}: {e}"
            )));
        }
        drop(file);

        if let Err(e) = tokio::fs::rename(&temp_path, path).await {
            cleanup_temp().await;
            return Err(TranscribeError::Fetch(format!(
                "failed to move download into place at {path:?}: {e}"
            )));
        }

        info!(path = ?path, size = downloaded, "File downloaded successfully");
        Ok(())
    }
}
