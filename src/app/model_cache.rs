use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::domain::{ModelConfig, TranscribeError, TranscriptionSettings};
use crate::ports::{ModelLoader, SpeechModel};

struct CacheSlot {
    config: ModelConfig,
    model: Arc<dyn SpeechModel>,
}

/// Cache of the single resident speech model.
///
/// At most one model is alive at a time and at most one load is in
/// flight: one async lock guards the slot and is held across the whole
/// miss path (artifact probe, download, context load). Model loads are
/// rare relative to transcription calls, so serializing them is a fair
/// trade for never duplicating a download.
///
/// The cache is an explicit, injectable object owned by the dispatcher
/// rather than process-global state.
pub struct ModelCache {
    loader: Arc<dyn ModelLoader>,
    slot: Mutex<Option<CacheSlot>>,
}

impl ModelCache {
    pub fn new(loader: Arc<dyn ModelLoader>) -> Self {
        Self {
            loader,
            slot: Mutex::new(None),
        }
    }

    /// Return the resident model for `settings`, loading it first when the
    /// requested configuration differs from the cached one.
    ///
    /// A cached handle is reused only when the whole configuration tuple
    /// matches; any change discards the previous model before the new one
    /// is built.
    pub async fn acquire(
        &self,
        settings: &TranscriptionSettings,
    ) -> Result<Arc<dyn SpeechModel>, TranscribeError> {
        let config = ModelConfig::from_settings(settings)?;

        let mut slot = self.slot.lock().await;

        if let Some(cached) = slot.as_ref() {
            if cached.config == config {
                debug!(model = %config.model_id, "Reusing resident speech model");
                return Ok(Arc::clone(&cached.model));
            }
        }

        // Free the previous model before loading so only one set of model
        // resources is held at any point.
        if let Some(previous) = slot.take() {
            info!(model = %previous.config.model_id, "Releasing previous speech model");
        }

        info!(
            model = %config.model_id,
            device = ?config.device,
            compute_type = ?config.compute_type,
            "Loading speech model"
        );

        let model = self.loader.load(&config).await?;
        *slot = Some(CacheSlot {
            config,
            model: Arc::clone(&model),
        });

        Ok(model)
    }
}
