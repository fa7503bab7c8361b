use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::adapters::pcm;
use crate::domain::{Device, ModelConfig, ModelSource, ResolvedAudio, TranscribeError};
use crate::ports::{HttpClient, ModelLoader, SpeechModel, TranscribeOptions};

/// No-speech probability threshold for silence suppression.
/// Default from whisper.cpp recommendations.
const VAD_NO_SPEECH_THRESHOLD: f32 = 0.6;
/// Entropy threshold for detecting non-speech.
const VAD_ENTROPY_THRESHOLD: f32 = 2.4;

/// Resolve a worker count of 0 to a per-machine default (cores - 1).
fn effective_threads(worker_count: u32) -> u32 {
    if worker_count == 0 {
        std::thread::available_parallelism()
            .map(|p| std::cmp::max(1, p.get() as u32 - 1))
            .unwrap_or(1)
    } else {
        worker_count
    }
}

/// File extension of a filename hint, lowercased.
fn extension_hint(filename: &str) -> Option<String> {
    std::path::Path::new(filename)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
}

/// [`ModelLoader`] that materializes ggml artifacts on disk and builds
/// whisper.cpp contexts from them.
pub struct WhisperCppLoader {
    http: Arc<dyn HttpClient>,
    models_dir: PathBuf,
}

impl WhisperCppLoader {
    pub fn new(http: Arc<dyn HttpClient>, models_dir: PathBuf) -> Self {
        Self { http, models_dir }
    }

    /// Make sure the artifact for `config` exists locally, downloading it
    /// into the models directory when absent. The returned path is always
    /// a local file, so the context load below never touches the network.
    async fn ensure_artifact(&self, config: &ModelConfig) -> Result<PathBuf, TranscribeError> {
        match config.source()? {
            ModelSource::LocalFile(path) => {
                debug!(model = %config.model_id, path = ?path, "Using model file in place");
                Ok(path)
            }
            ModelSource::Download { filename, url } => {
                let target = self.models_dir.join(&filename);
                if target.is_file() {
                    debug!(model = %config.model_id, path = ?target, "Model artifact already cached");
                    return Ok(target);
                }

                info!(model = %config.model_id, url = %url, target = ?target, "Downloading model artifact");
                self.http.download_file(&url, &target).await.map_err(|e| {
                    TranscribeError::ModelLoad(format!(
                        "failed to download model '{}': {e}",
                        config.model_id
                    ))
                })?;
                Ok(target)
            }
        }
    }
}

#[async_trait]
impl ModelLoader for WhisperCppLoader {
    async fn load(&self, config: &ModelConfig) -> Result<Arc<dyn SpeechModel>, TranscribeError> {
        let artifact = self.ensure_artifact(config).await?;

        let use_gpu = !matches!(config.device, Device::Cpu);
        let path_str = artifact.to_string_lossy().to_string();

        info!(model = %config.model_id, path = ?artifact, use_gpu = use_gpu, "Loading whisper model");

        // Context load reads the whole artifact; keep it off the async
        // threads.
        let context = tokio::task::spawn_blocking(move || {
            let mut params = WhisperContextParameters::default();
            params.use_gpu(use_gpu);
            WhisperContext::new_with_params(&path_str, params).map_err(|e| {
                TranscribeError::ModelLoad(format!("failed to load model: {e}"))
            })
        })
        .await
        .map_err(|e| TranscribeError::ModelLoad(format!("model load task failed: {e}")))??;

        info!(model = %config.model_id, "Whisper model loaded");

        Ok(Arc::new(WhisperCppModel {
            context: Arc::new(context),
            threads: effective_threads(config.worker_count),
        }))
    }
}

/// [`SpeechModel`] backed by a loaded whisper.cpp context.
///
/// The context is immutable after load; dropping the model releases it.
pub struct WhisperCppModel {
    context: Arc<WhisperContext>,
    threads: u32,
}

#[async_trait]
impl SpeechModel for WhisperCppModel {
    async fn transcribe(
        &self,
        audio: &ResolvedAudio,
        options: &TranscribeOptions,
    ) -> Result<Vec<String>, TranscribeError> {
        let bytes = audio.bytes().to_vec();
        let hint = extension_hint(audio.filename());
        let context = Arc::clone(&self.context);
        let threads = self.threads;
        let language = options.language.clone();
        let vad_filter = options.vad_filter;

        debug!(
            bytes = bytes.len(),
            filename = %audio.filename(),
            threads = threads,
            "Starting local transcription"
        );

        // Decode and inference are CPU-bound; run the whole pass on a
        // blocking task.
        let segments = tokio::task::spawn_blocking(move || {
            let samples = pcm::decode_pcm_16k_mono(&bytes, hint.as_deref())?;

            let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
            params.set_n_threads(threads as i32);
            params.set_translate(false);
            params.set_print_progress(false);
            params.set_print_realtime(false);
            params.set_print_timestamps(false);

            // Language hint; None lets multilingual models detect.
            params.set_language(language.as_deref());

            if vad_filter {
                params.set_no_speech_thold(VAD_NO_SPEECH_THRESHOLD);
                params.set_entropy_thold(VAD_ENTROPY_THRESHOLD);
                params.set_suppress_non_speech_tokens(true);
            }

            let mut state = context.create_state().map_err(|e| {
                TranscribeError::ModelLoad(format!("failed to create whisper state: {e}"))
            })?;

            state.full(params, &samples).map_err(|e| {
                TranscribeError::ModelLoad(format!("transcription failed: {e}"))
            })?;

            let segment_count = state.full_n_segments().map_err(|e| {
                TranscribeError::ModelLoad(format!("failed to get segment count: {e}"))
            })?;

            let mut segments = Vec::with_capacity(segment_count as usize);
            for i in 0..segment_count {
                let text = state.full_get_segment_text(i).map_err(|e| {
                    TranscribeError::ModelLoad(format!("failed to read segment {i}: {e}"))
                })?;
                segments.push(text);
            }

            Ok::<Vec<String>, TranscribeError>(segments)
        })
        .await
        .map_err(|e| TranscribeError::ModelLoad(format!("transcription task failed: {e}")))??;

        info!(segments = segments.len(), "Local transcription complete");

        Ok(segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_effective_threads_explicit() {
        assert_eq!(effective_threads(4), 4);
        assert_eq!(effective_threads(1), 1);
    }

    #[test]
    fn test_effective_threads_auto() {
        assert!(effective_threads(0) >= 1);
    }

    #[test]
    fn test_extension_hint() {
        assert_eq!(extension_hint("audio.WAV"), Some("wav".to_string()));
        assert_eq!(extension_hint("clip.tar.mp3"), Some("mp3".to_string()));
        assert_eq!(extension_hint("noext"), None);
    }
}
