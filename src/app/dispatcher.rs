use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info};

use crate::adapters::{OpenAiTranscriber, ReqwestClient, WhisperCppLoader};
use crate::app::model_cache::ModelCache;
use crate::app::resolver::InputResolver;
use crate::domain::{AudioReference, ResolvedAudio, TranscribeError, TranscriptionSettings};
use crate::ports::{HttpClient, ModelLoader, RemoteTranscriber, TranscribeOptions};

/// Maximum payload the remote endpoint accepts. Larger files would need
/// chunked splitting, which is deliberately out of scope.
const MAX_REMOTE_UPLOAD_BYTES: u64 = 25_000_000;

/// Entry point of the transcription core.
///
/// Resolves an audio reference, routes it to the resident local model or
/// the remote API, and normalizes every lower-layer failure into one
/// [`TranscribeError`] kind. The host owns presentation and logging of
/// the returned error; nothing is retried here.
pub struct TranscriptionService {
    resolver: InputResolver,
    remote: Arc<dyn RemoteTranscriber>,
    models: ModelCache,
}

impl TranscriptionService {
    /// Assemble a service from explicit port implementations.
    pub fn new(
        http: Arc<dyn HttpClient>,
        remote: Arc<dyn RemoteTranscriber>,
        loader: Arc<dyn ModelLoader>,
    ) -> Self {
        Self {
            resolver: InputResolver::new(http),
            remote,
            models: ModelCache::new(loader),
        }
    }

    /// Wire the default stack: reqwest fetches, the OpenAI transcription
    /// endpoint, and whisper.cpp models cached under `models_dir`.
    pub fn with_defaults(models_dir: PathBuf) -> Result<Self, TranscribeError> {
        let http: Arc<dyn HttpClient> = Arc::new(ReqwestClient::new()?);
        let remote: Arc<dyn RemoteTranscriber> = Arc::new(OpenAiTranscriber::new()?);
        let loader: Arc<dyn ModelLoader> =
            Arc::new(WhisperCppLoader::new(Arc::clone(&http), models_dir));
        Ok(Self::new(http, remote, loader))
    }

    /// Transcribe one audio reference with the given settings snapshot.
    pub async fn transcribe(
        &self,
        reference: &AudioReference,
        settings: &TranscriptionSettings,
    ) -> Result<String, TranscribeError> {
        let audio = self.resolver.resolve(reference).await?;

        debug!(
            filename = %audio.filename(),
            mime = %audio.mime_type(),
            bytes = audio.len(),
            local = settings.use_local_model,
            "Audio resolved"
        );

        // `audio` is moved into exactly one branch and dropped there on
        // success and failure alike.
        if settings.use_local_model {
            self.transcribe_local(audio, settings).await
        } else {
            self.transcribe_remote(audio, settings).await
        }
    }

    async fn transcribe_local(
        &self,
        audio: ResolvedAudio,
        settings: &TranscriptionSettings,
    ) -> Result<String, TranscribeError> {
        let model = self.models.acquire(settings).await?;

        let options = TranscribeOptions {
            language: Some(settings.language.clone()),
            vad_filter: true,
            multilingual: true,
        };

        let segments = model.transcribe(&audio, &options).await?;
        let text = segments.concat();

        info!(segments = segments.len(), chars = text.len(), "Transcription finished locally");

        Ok(text)
    }

    async fn transcribe_remote(
        &self,
        audio: ResolvedAudio,
        settings: &TranscriptionSettings,
    ) -> Result<String, TranscribeError> {
        if settings.api_key.is_empty() {
            return Err(TranscribeError::Config(
                "an API key is required for remote transcription".to_string(),
            ));
        }

        let actual_bytes = audio.len() as u64;
        if actual_bytes > MAX_REMOTE_UPLOAD_BYTES {
            return Err(TranscribeError::SizeLimit {
                actual_bytes,
                limit_bytes: MAX_REMOTE_UPLOAD_BYTES,
            });
        }

        let text = self
            .remote
            .transcribe(audio.into(), &settings.api_key, &settings.language)
            .await?;

        info!(chars = text.len(), "Transcription finished remotely");

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::path::Path;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use crate::domain::{ApiKey, ModelConfig};
    use crate::ports::{AudioUpload, FetchedBody, SpeechModel};

    struct StubHttp;

    #[async_trait]
    impl HttpClient for StubHttp {
        async fn get_bytes(&self, url: &str) -> Result<FetchedBody, TranscribeError> {
            Err(TranscribeError::Fetch(format!(
                "GET {url} returned HTTP 503"
            )))
        }

        async fn download_file(&self, _url: &str, _path: &Path) -> Result<(), TranscribeError> {
            unimplemented!("not used in dispatcher tests")
        }
    }

    /// Remote stub that records invocations and returns a canned body.
    struct StubRemote {
        calls: AtomicUsize,
    }

    impl StubRemote {
        fn new() -> Arc<Self> {
            Arc::new(Self {
                calls: AtomicUsize::new(0),
            })
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl RemoteTranscriber for StubRemote {
        async fn transcribe(
            &self,
            _upload: AudioUpload,
            api_key: &ApiKey,
            _language: &str,
        ) -> Result<String, TranscribeError> {
            assert!(!api_key.is_empty(), "dispatcher must gate on the key");
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok("hello world".to_string())
        }
    }

    /// Local model stub producing fixed segments.
    struct SegmentsModel(Vec<&'static str>);

    #[async_trait]
    impl SpeechModel for SegmentsModel {
        async fn transcribe(
            &self,
            _audio: &ResolvedAudio,
            options: &TranscribeOptions,
        ) -> Result<Vec<String>, TranscribeError> {
            assert!(options.vad_filter);
            assert!(options.multilingual);
            Ok(self.0.iter().map(|s| s.to_string()).collect())
        }
    }

    struct SegmentsLoader(Vec<&'static str>);

    #[async_trait]
    impl ModelLoader for SegmentsLoader {
        async fn load(
            &self,
            _config: &ModelConfig,
        ) -> Result<Arc<dyn SpeechModel>, TranscribeError> {
            Ok(Arc::new(SegmentsModel(self.0.clone())))
        }
    }

    fn service(remote: Arc<StubRemote>, segments: Vec<&'static str>) -> TranscriptionService {
        TranscriptionService::new(Arc::new(StubHttp), remote, Arc::new(SegmentsLoader(segments)))
    }

    fn remote_settings() -> TranscriptionSettings {
        TranscriptionSettings {
            use_local_model: false,
            api_key: ApiKey::new("sk-x"),
            language: "en".to_string(),
            ..Default::default()
        }
    }

    async fn write_temp_wav(name: &str, size: usize) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(name);
        tokio::fs::write(&path, vec![0u8; size]).await.unwrap();
        path
    }

    #[tokio::test]
    async fn test_remote_mode_end_to_end() {
        let remote = StubRemote::new();
        let service = service(remote.clone(), vec![]);
        let path = write_temp_wav("sotto_dispatch_clip.wav", 1000).await;

        let text = service
            .transcribe(&AudioReference::LocalPath(path.clone()), &remote_settings())
            .await
            .unwrap();

        assert_eq!(text, "hello world");
        assert_eq!(remote.call_count(), 1);

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_remote_mode_requires_api_key_before_any_call() {
        let remote = StubRemote::new();
        let service = service(remote.clone(), vec![]);
        let path = write_temp_wav("sotto_dispatch_nokey.wav", 100).await;

        let mut settings = remote_settings();
        settings.api_key = ApiKey::default();

        let result = service
            .transcribe(&AudioReference::LocalPath(path.clone()), &settings)
            .await;

        assert!(matches!(result, Err(TranscribeError::Config(_))));
        assert_eq!(remote.call_count(), 0);

        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_remote_size_limit_is_inclusive() {
        let remote = StubRemote::new();
        let service = service(remote.clone(), vec![]);

        // Exactly at the limit passes.
        let path = write_temp_wav("sotto_dispatch_at_limit.wav", 25_000_000).await;
        let text = service
            .transcribe(&AudioReference::LocalPath(path.clone()), &remote_settings())
            .await
            .unwrap();
        assert_eq!(text, "hello world");
        let _ = tokio::fs::remove_file(&path).await;

        // One byte over fails without touching the API.
        let path = write_temp_wav("sotto_dispatch_over_limit.wav", 25_000_001).await;
        let result = service
            .transcribe(&AudioReference::LocalPath(path.clone()), &remote_settings())
            .await;
        assert!(matches!(
            result,
            Err(TranscribeError::SizeLimit {
                actual_bytes: 25_000_001,
                limit_bytes: 25_000_000,
            })
        ));
        assert_eq!(remote.call_count(), 1);
        let _ = tokio::fs::remove_file(&path).await;
    }

    #[tokio::test]
    async fn test_local_mode_joins_segments_without_separator() {
        let remote = StubRemote::new();
        let service = service(remote.clone(), vec!["foo ", "bar"]);

        let settings = TranscriptionSettings {
            use_local_model: true,
            ..Default::default()
        };
        let reference = AudioReference::DataUri {
            subtype: "wav".to_string(),
            payload: "UklGRg==".to_string(),
        };

        let text = service.transcribe(&reference, &settings).await.unwrap();
        assert_eq!(text, "foo bar");
        assert_eq!(remote.call_count(), 0);
    }

    #[tokio::test]
    async fn test_unsupported_data_uri_subtype() {
        let service = service(StubRemote::new(), vec![]);

        let reference = AudioReference::parse("data:audio/flac;base64,AAAA").unwrap();
        let result = service.transcribe(&reference, &remote_settings()).await;

        assert!(matches!(
            result,
            Err(TranscribeError::UnsupportedFormat(_))
        ));
    }

    #[tokio::test]
    async fn test_remote_url_fetch_failure_propagates() {
        let service = service(StubRemote::new(), vec![]);

        let reference = AudioReference::RemoteUrl("https://example.com/clip.mp3".to_string());
        let result = service.transcribe(&reference, &remote_settings()).await;

        assert!(matches!(result, Err(TranscribeError::Fetch(_))));
    }
}
