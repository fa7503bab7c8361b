use std::path::{Path, PathBuf};

use crate::domain::settings::{ComputeType, Device, ModelSize, TranscriptionSettings};
use crate::domain::TranscribeError;

/// ggml artifacts for the named model sizes, as published on Hugging Face
/// under ggerganov/whisper.cpp. The bare `large` size aliases the newest
/// large checkpoint.
const GGML_ARTIFACTS: &[(&str, &str)] = &[
    ("tiny", "ggml-tiny.bin"),
    ("tiny.en", "ggml-tiny.en.bin"),
    ("base", "ggml-base.bin"),
    ("base.en", "ggml-base.en.bin"),
    ("small", "ggml-small.bin"),
    ("small.en", "ggml-small.en.bin"),
    ("medium", "ggml-medium.bin"),
    ("medium.en", "ggml-medium.en.bin"),
    ("large-v1", "ggml-large-v1.bin"),
    ("large-v2", "ggml-large-v2.bin"),
    ("large-v3", "ggml-large-v3.bin"),
    ("large", "ggml-large-v3.bin"),
];

const HUGGING_FACE_BASE: &str = "https://huggingface.co";

/// Identity of a loaded local model.
///
/// This is the cache key for the resident model: two configurations are
/// interchangeable only when every field matches.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    /// Effective model identifier: a named size, a filesystem path, or a
    /// Hugging Face repo id.
    pub model_id: String,
    pub device: Device,
    pub compute_type: ComputeType,
    pub worker_count: u32,
}

impl ModelConfig {
    /// Compute the effective configuration from a settings snapshot.
    ///
    /// The `other` sentinel switches to the free-form custom field, which
    /// must then be non-empty.
    pub fn from_settings(settings: &TranscriptionSettings) -> Result<Self, TranscribeError> {
        let model_id = if settings.model_size == ModelSize::Other {
            let custom = settings.model_path_or_id.trim();
            if custom.is_empty() {
                return Err(TranscribeError::Config(
                    "a custom model path or id is required when model size is 'other'"
                        .to_string(),
                ));
            }
            custom.to_string()
        } else {
            settings.model_size.as_str().to_string()
        };

        Ok(Self {
            model_id,
            device: settings.device,
            compute_type: settings.compute_type,
            worker_count: settings.worker_count,
        })
    }

    /// Resolve where this configuration's artifact comes from.
    pub fn source(&self) -> Result<ModelSource, TranscribeError> {
        if let Some((_, filename)) = GGML_ARTIFACTS.iter().find(|(id, _)| *id == self.model_id) {
            return Ok(ModelSource::Download {
                filename: (*filename).to_string(),
                url: format!(
                    "{HUGGING_FACE_BASE}/ggerganov/whisper.cpp/resolve/main/{filename}"
                ),
            });
        }

        let path = Path::new(&self.model_id);
        if path.is_file() {
            return Ok(ModelSource::LocalFile(path.to_path_buf()));
        }

        // Treat owner/repo ids as Hugging Face repos carrying a single
        // ggml-model.bin, cached under a name derived from the repo id.
        if self.model_id.contains('/') && !self.model_id.starts_with('/') {
            let filename = format!("{}.bin", self.model_id.replace('/', "-"));
            return Ok(ModelSource::Download {
                url: format!(
                    "{HUGGING_FACE_BASE}/{}/resolve/main/ggml-model.bin",
                    self.model_id
                ),
                filename,
            });
        }

        Err(TranscribeError::ModelLoad(format!(
            "unknown model '{}': not an existing file, a known size, or a Hugging Face repo id",
            self.model_id
        )))
    }
}

/// Where a model artifact lives, or can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelSource {
    /// Existing file on disk, used in place without copying.
    LocalFile(PathBuf),
    /// File under the shared model cache directory, downloadable from
    /// `url` when absent.
    Download { filename: String, url: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings_with(size: ModelSize) -> TranscriptionSettings {
        TranscriptionSettings {
            model_size: size,
            ..Default::default()
        }
    }

    #[test]
    fn test_from_settings_named_size() {
        let config = ModelConfig::from_settings(&settings_with(ModelSize::TinyEn)).unwrap();
        assert_eq!(config.model_id, "tiny.en");
    }

    #[test]
    fn test_from_settings_custom_id() {
        let mut settings = settings_with(ModelSize::Other);
        settings.model_path_or_id = "  acme/whisper-tiny-it  ".to_string();
        let config = ModelConfig::from_settings(&settings).unwrap();
        assert_eq!(config.model_id, "acme/whisper-tiny-it");
    }

    #[test]
    fn test_from_settings_missing_custom_id() {
        let result = ModelConfig::from_settings(&settings_with(ModelSize::Other));
        assert!(matches!(result, Err(TranscribeError::Config(_))));
    }

    #[test]
    fn test_config_equality_is_field_exact() {
        let base = ModelConfig::from_settings(&settings_with(ModelSize::Tiny)).unwrap();
        let mut other = base.clone();
        assert_eq!(base, other);

        other.worker_count = 4;
        assert_ne!(base, other);
    }

    #[test]
    fn test_source_named_size() {
        let config = ModelConfig::from_settings(&settings_with(ModelSize::Small)).unwrap();
        match config.source().unwrap() {
            ModelSource::Download { filename, url } => {
                assert_eq!(filename, "ggml-small.bin");
                assert_eq!(
                    url,
                    "https://huggingface.co/ggerganov/whisper.cpp/resolve/main/ggml-small.bin"
                );
            }
            other => panic!("expected download source, got {other:?}"),
        }
    }

    #[test]
    fn test_source_large_alias() {
        let config = ModelConfig::from_settings(&settings_with(ModelSize::Large)).unwrap();
        match config.source().unwrap() {
            ModelSource::Download { filename, .. } => assert_eq!(filename, "ggml-large-v3.bin"),
            other => panic!("expected download source, got {other:?}"),
        }
    }

    #[test]
    fn test_source_existing_file() {
        let path = std::env::temp_dir().join("sotto_model_source_test.bin");
        std::fs::write(&path, b"ggml").unwrap();

        let mut settings = settings_with(ModelSize::Other);
        settings.model_path_or_id = path.to_string_lossy().to_string();
        let config = ModelConfig::from_settings(&settings).unwrap();
        assert_eq!(config.source().unwrap(), ModelSource::LocalFile(path.clone()));

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_source_repo_id() {
        let mut settings = settings_with(ModelSize::Other);
        settings.model_path_or_id = "NbAiLab/nb-whisper-base".to_string();
        let config = ModelConfig::from_settings(&settings).unwrap();
        match config.source().unwrap() {
            ModelSource::Download { filename, url } => {
                assert_eq!(filename, "NbAiLab-nb-whisper-base.bin");
                assert_eq!(
                    url,
                    "https://huggingface.co/NbAiLab/nb-whisper-base/resolve/main/ggml-model.bin"
                );
            }
            other => panic!("expected download source, got {other:?}"),
        }
    }

    #[test]
    fn test_source_unknown_id() {
        let mut settings = settings_with(ModelSize::Other);
        settings.model_path_or_id = "no-such-model".to_string();
        let config = ModelConfig::from_settings(&settings).unwrap();
        assert!(matches!(
            config.source(),
            Err(TranscribeError::ModelLoad(_))
        ));
    }
}
