//! Persisted defaults for the Moondream CLI.
//! Stored in the platform-specific config directory via `directories::ProjectDirs`.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::vision::{
    CaptionLength, ClientConfig, DEFAULT_AUTH_HEADER, DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES,
    DEFAULT_RETRY_DELAY, DEFAULT_TIMEOUT,
};

/// Application settings that can be saved and loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// API base URL
    pub base_url: String,
    /// Per-attempt timeout in seconds
    pub timeout_secs: u64,
    /// Maximum retries for API requests
    pub max_retries: u32,
    /// Base retry delay in milliseconds
    pub retry_delay_ms: u64,
    /// Header carrying the API key
    pub auth_header: String,
    /// Caption length used when none is given on the command line
    pub caption_length: CaptionLength,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT.as_secs(),
            max_retries: DEFAULT_MAX_RETRIES,
            retry_delay_ms: DEFAULT_RETRY_DELAY.as_millis() as u64,
            auth_header: DEFAULT_AUTH_HEADER.to_string(),
            caption_length: CaptionLength::default(),
        }
    }
}

impl AppSettings {
    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        directories::ProjectDirs::from("ai", "moondream", "moondream")
            .map(|dirs| dirs.config_dir().to_path_buf())
    }

    /// Get the settings file path.
    pub fn settings_path() -> Option<PathBuf> {
        Self::config_dir().map(|dir| dir.join("settings.json"))
    }

    /// Load settings from the config file, falling back to defaults.
    pub fn load() -> Self {
        Self::settings_path()
            .map(|path| Self::load_from(&path))
            .unwrap_or_default()
    }

    /// Load settings from `path`, falling back to defaults.
    pub fn load_from(path: &Path) -> Self {
        fs::read_to_string(path)
            .map(|content| Self::from_json(&content))
            .unwrap_or_default()
    }

    /// Parse settings, backfilling fields older files leave empty.
    pub fn from_json(content: &str) -> Self {
        let defaults = Self::default();
        let mut loaded: Self = match serde_json::from_str(content) {
            Ok(settings) => settings,
            Err(e) => {
                tracing::warn!("Ignoring malformed settings file: {}", e);
                return defaults;
            }
        };

        if loaded.base_url.is_empty() {
            loaded.base_url = defaults.base_url;
        }
        if loaded.auth_header.is_empty() {
            loaded.auth_header = defaults.auth_header;
        }
        if loaded.timeout_secs == 0 {
            loaded.timeout_secs = defaults.timeout_secs;
        }

        loaded
    }

    /// Save settings to the config file, returning where they were written.
    pub fn save(&self) -> Result<PathBuf, String> {
        let path = Self::settings_path().ok_or("Cannot determine config directory")?;
        self.save_to(&path)?;
        Ok(path)
    }

    /// Save settings to `path`, creating its directory if needed.
    pub fn save_to(&self, path: &Path) -> Result<(), String> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .map_err(|e| format!("Failed to create config directory: {}", e))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| format!("Failed to serialize settings: {}", e))?;

        fs::write(path, content).map_err(|e| format!("Failed to write settings file: {}", e))?;

        Ok(())
    }

    /// Build a client configuration from these settings.
    pub fn client_config(&self) -> ClientConfig {
        ClientConfig::default()
            .with_base_url(&self.base_url)
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_max_retries(self.max_retries)
            .with_retry_delay(Duration::from_millis(self.retry_delay_ms))
            .with_auth_header(&self.auth_header)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings_match_client_defaults() {
        let config = AppSettings::default().client_config();
        assert_eq!(config, ClientConfig::default());
    }

    #[test]
    fn test_partial_file_backfills_defaults() {
        let settings = AppSettings::from_json(r#"{"max_retries": 5, "base_url": ""}"#);
        assert_eq!(settings.max_retries, 5);
        assert_eq!(settings.base_url, DEFAULT_BASE_URL);
        assert_eq!(settings.caption_length, CaptionLength::Long);
    }

    #[test]
    fn test_malformed_file_uses_defaults() {
        assert_eq!(AppSettings::from_json("not json"), AppSettings::default());
    }

    #[test]
    fn test_settings_json_shape() {
        let settings = AppSettings {
            caption_length: CaptionLength::Short,
            retry_delay_ms: 250,
            ..AppSettings::default()
        };
        let value = serde_json::to_value(&settings).unwrap();
        assert_eq!(value["caption_length"], "short");
        assert_eq!(value["retry_delay_ms"], 250);

        let config = settings.client_config();
        assert_eq!(config.retry_delay, Duration::from_millis(250));
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = AppSettings {
            base_url: "http://localhost:2020/v1".to_string(),
            max_retries: 7,
            caption_length: CaptionLength::Normal,
            ..AppSettings::default()
        };

        settings.save_to(&path).unwrap();
        assert_eq!(AppSettings::load_from(&path), settings);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loaded = AppSettings::load_from(&dir.path().join("absent.json"));
        assert_eq!(loaded, AppSettings::default());
    }
}
