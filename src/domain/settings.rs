use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::domain::TranscribeError;

/// API key wrapper that never appears in debug output and zeroes its
/// memory on drop.
#[derive(Clone, Default, Serialize, Deserialize, Zeroize)]
#[zeroize(drop)]
#[serde(transparent)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Access the raw secret. Callers must not log the returned value.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(<redacted>)")
    }
}

impl From<&str> for ApiKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

/// Whisper model size, as exposed in the host settings schema.
///
/// `Other` switches model selection to the free-form `model_path_or_id`
/// field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelSize {
    #[serde(rename = "tiny")]
    Tiny,
    #[serde(rename = "tiny.en")]
    TinyEn,
    #[serde(rename = "base")]
    Base,
    #[serde(rename = "base.en")]
    BaseEn,
    #[serde(rename = "small")]
    Small,
    #[serde(rename = "small.en")]
    SmallEn,
    #[serde(rename = "medium")]
    Medium,
    #[serde(rename = "medium.en")]
    MediumEn,
    #[serde(rename = "large-v1")]
    LargeV1,
    #[serde(rename = "large-v2")]
    LargeV2,
    #[serde(rename = "large-v3")]
    LargeV3,
    #[serde(rename = "large")]
    Large,
    #[serde(rename = "other")]
    Other,
}

impl ModelSize {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelSize::Tiny => "tiny",
            ModelSize::TinyEn => "tiny.en",
            ModelSize::Base => "base",
            ModelSize::BaseEn => "base.en",
            ModelSize::Small => "small",
            ModelSize::SmallEn => "small.en",
            ModelSize::Medium => "medium",
            ModelSize::MediumEn => "medium.en",
            ModelSize::LargeV1 => "large-v1",
            ModelSize::LargeV2 => "large-v2",
            ModelSize::LargeV3 => "large-v3",
            ModelSize::Large => "large",
            ModelSize::Other => "other",
        }
    }
}

impl std::fmt::Display for ModelSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Processing device for local inference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    Cpu,
    Cuda,
    Auto,
}

/// Requested compute precision for local inference.
///
/// ggml weights are quantized ahead of time, so the whisper.cpp backend
/// cannot re-quantize at load; the value still participates in cache
/// identity so a change forces a reload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComputeType {
    #[serde(rename = "int8")]
    Int8,
    #[serde(rename = "int8_float32")]
    Int8Float32,
    #[serde(rename = "int8_float16")]
    Int8Float16,
    #[serde(rename = "int8_bfloat16")]
    Int8Bfloat16,
    #[serde(rename = "int16")]
    Int16,
    #[serde(rename = "float16")]
    Float16,
    #[serde(rename = "bfloat16")]
    Bfloat16,
    #[serde(rename = "float32")]
    Float32,
}

/// Immutable configuration snapshot for one transcription call.
///
/// Produced by the host from its settings store; field names and enum
/// values match the host settings schema.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscriptionSettings {
    /// Transcribe with the locally resident model instead of the cloud API.
    pub use_local_model: bool,
    /// API key for the cloud endpoint. Required only in remote mode.
    pub api_key: ApiKey,
    /// Primary language of the audio (ISO 639-1 two-letter code).
    pub language: String,
    /// Model size for local inference.
    pub model_size: ModelSize,
    /// Custom model path or Hugging Face id, used when `model_size` is
    /// `other`.
    pub model_path_or_id: String,
    /// Processing device for local inference.
    pub device: Device,
    /// Requested compute precision for local inference.
    pub compute_type: ComputeType,
    /// Inference worker threads. 0 selects a per-machine default.
    pub worker_count: u32,
    /// Message field under which the host looks up audio references.
    /// Consumed by the host, carried here so one snapshot describes the
    /// whole plugin configuration.
    pub audio_key: String,
}

impl Default for TranscriptionSettings {
    fn default() -> Self {
        Self {
            use_local_model: true,
            api_key: ApiKey::default(),
            language: "en".to_string(),
            model_size: ModelSize::Base,
            model_path_or_id: String::new(),
            device: Device::Auto,
            compute_type: ComputeType::Float32,
            worker_count: 0,
            audio_key: "audio".to_string(),
        }
    }
}

impl TranscriptionSettings {
    /// Validate cross-field invariants.
    ///
    /// The host enforces the same rules at settings-save time; the
    /// dispatcher re-checks the remote-mode key before any network call.
    pub fn validate(&self) -> Result<(), TranscribeError> {
        if !self.use_local_model && self.api_key.is_empty() {
            return Err(TranscribeError::Config(
                "an API key is required for remote transcription".to_string(),
            ));
        }
        if self.model_size == ModelSize::Other && self.model_path_or_id.trim().is_empty() {
            return Err(TranscribeError::Config(
                "a custom model path or id is required when model size is 'other'".to_string(),
            ));
        }
        Ok(())
    }
}
