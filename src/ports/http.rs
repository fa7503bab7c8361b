use std::path::Path;

use async_trait::async_trait;

use crate::domain::TranscribeError;

/// Body of a buffered GET, plus the content type the server declared.
#[derive(Debug, Clone)]
pub struct FetchedBody {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

/// HTTP client port for plain fetches: remote audio references and model
/// artifact downloads. The transcription API has its own port.
#[async_trait]
pub trait HttpClient: Send + Sync {
    /// GET a URL and buffer the full response body in memory.
    /// Non-2xx responses fail with [`TranscribeError::Fetch`].
    async fn get_bytes(&self, url: &str) -> Result<FetchedBody, TranscribeError>;

    /// Download a URL to a file on disk, streaming the body.
    async fn download_file(&self, url: &str, path: &Path) -> Result<(), TranscribeError>;
}
