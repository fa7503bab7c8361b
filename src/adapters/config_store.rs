use std::fs;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::domain::{AppConfig, TranscribeError};
use crate::ports::ConfigStore;

/// TOML-based configuration store with OS-specific paths.
pub struct TomlConfigStore {
    data_dir: PathBuf,
}

impl TomlConfigStore {
    /// Create a new TomlConfigStore.
    /// Uses OS-specific application data directories.
    pub fn new() -> Result<Self, TranscribeError> {
        let data_dir = Self::get_data_dir()?;

        fs::create_dir_all(&data_dir)
            .map_err(|e| TranscribeError::Config(format!("failed to create {data_dir:?}: {e}")))?;

        info!(data_dir = ?data_dir, "ConfigStore initialized");

        Ok(Self { data_dir })
    }

    /// Store rooted at an explicit directory, for hosts that manage their
    /// own plugin data layout.
    pub fn with_data_dir(data_dir: PathBuf) -> Result<Self, TranscribeError> {
        fs::create_dir_all(&data_dir)
            .map_err(|e| TranscribeError::Config(format!("failed to create {data_dir:?}: {e}")))?;
        Ok(Self { data_dir })
    }

    /// Get the OS-specific application data directory.
    /// - macOS: ~/Library/Application Support/sotto/
    /// - Windows: %APPDATA%\sotto\
    /// - Linux: ~/.config/sotto/
    fn get_data_dir() -> Result<PathBuf, TranscribeError> {
        #[cfg(target_os = "macos")]
        {
            dirs::data_dir().map(|p| p.join("sotto")).ok_or_else(|| {
                TranscribeError::Config("could not find application data directory".to_string())
            })
        }

        #[cfg(target_os = "windows")]
        {
            dirs::config_dir().map(|p| p.join("sotto")).ok_or_else(|| {
                TranscribeError::Config("could not find application data directory".to_string())
            })
        }

        #[cfg(target_os = "linux")]
        {
            dirs::config_dir().map(|p| p.join("sotto")).ok_or_else(|| {
                TranscribeError::Config("could not find application data directory".to_string())
            })
        }

        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        {
            Err(TranscribeError::Config(
                "unsupported operating system".to_string(),
            ))
        }
    }

    /// Get the OS-specific log directory.
    fn get_logs_dir(&self) -> PathBuf {
        #[cfg(target_os = "macos")]
        {
            self.data_dir.join("logs")
        }

        #[cfg(target_os = "windows")]
        {
            dirs::data_local_dir()
                .map(|p| p.join("sotto").join("logs"))
                .unwrap_or_else(|| self.data_dir.join("logs"))
        }

        #[cfg(target_os = "linux")]
        {
            dirs::data_dir()
                .map(|p| p.join("sotto").join("logs"))
                .unwrap_or_else(|| self.data_dir.join("logs"))
        }

        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        {
            self.data_dir.join("logs")
        }
    }
}

impl ConfigStore for TomlConfigStore {
    fn load(&self) -> Result<AppConfig, TranscribeError> {
        let config_path = self.config_path();

        if config_path.exists() {
            debug!(path = ?config_path, "Loading configuration");
            let content = fs::read_to_string(&config_path)
                .map_err(|e| TranscribeError::Config(format!("failed to read config: {e}")))?;
            let config: AppConfig = toml::from_str(&content)
                .map_err(|e| TranscribeError::Config(format!("invalid config file: {e}")))?;
            info!(path = ?config_path, "Configuration loaded");
            Ok(config)
        } else {
            info!(path = ?config_path, "Configuration file not found, creating default");
            let config = AppConfig::new();
            self.save(&config)?;
            Ok(config)
        }
    }

    fn save(&self, config: &AppConfig) -> Result<(), TranscribeError> {
        let config_path = self.config_path();

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| TranscribeError::Config(format!("failed to create {parent:?}: {e}")))?;
        }

        let content = toml::to_string_pretty(config)
            .map_err(|e| TranscribeError::Config(format!("failed to serialize config: {e}")))?;
        fs::write(&config_path, content)
            .map_err(|e| TranscribeError::Config(format!("failed to write config: {e}")))?;

        info!(path = ?config_path, "Configuration saved");
        Ok(())
    }

    fn config_path(&self) -> PathBuf {
        self.data_dir.join("config.toml")
    }

    fn data_dir(&self) -> PathBuf {
        self.data_dir.clone()
    }

    fn models_dir(&self) -> PathBuf {
        self.data_dir.join("models")
    }

    fn logs_dir(&self) -> PathBuf {
        self.get_logs_dir()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_store_paths() {
        let temp_dir = std::env::temp_dir().join("sotto_config_paths_test");
        let store = TomlConfigStore::with_data_dir(temp_dir.clone()).unwrap();

        assert!(store.config_path().ends_with("config.toml"));
        assert!(store.models_dir().ends_with("models"));

        let _ = fs::remove_dir_all(&temp_dir);
    }

    #[test]
    fn test_config_roundtrip() {
        let temp_dir = std::env::temp_dir().join("sotto_config_roundtrip_test");
        let _ = fs::remove_dir_all(&temp_dir);

        let store = TomlConfigStore::with_data_dir(temp_dir.clone()).unwrap();

        let mut config = AppConfig::new();
        config.logging.level = "debug".to_string();
        config.transcription.use_local_model = false;
        config.transcription.api_key = "sk-x".into();

        store.save(&config).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.logging.level, "debug");
        assert!(!loaded.transcription.use_local_model);
        assert_eq!(loaded.transcription.api_key.expose(), "sk-x");

        let _ = fs::remove_dir_all(&temp_dir);
    }

    #[test]
    fn test_load_creates_default_config() {
        let temp_dir = std::env::temp_dir().join("sotto_config_default_test");
        let _ = fs::remove_dir_all(&temp_dir);

        let store = TomlConfigStore::with_data_dir(temp_dir.clone()).unwrap();
        let config = store.load().unwrap();

        assert!(config.transcription.use_local_model);
        assert!(store.config_path().exists());

        let _ = fs::remove_dir_all(&temp_dir);
    }
}
