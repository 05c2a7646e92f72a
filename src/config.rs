//! Application configuration.
//!
//! Loaded from a TOML file (`{config_dir}/cogni/config.toml` unless a path is
//! given), then overridden by `OPENAI_API_KEY` / `OPENAI_BASE_URL`.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::study::ProcessingMode;

pub const API_KEY_ENV: &str = "OPENAI_API_KEY";
pub const BASE_URL_ENV: &str = "OPENAI_BASE_URL";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },

    #[error("Could not determine the local data directory")]
    DataDirNotFound,
}

pub type Result<T> = std::result::Result<T, ConfigError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct AppConfig {
    /// API key for the completion/image service. `OPENAI_API_KEY` wins.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub base_url: String,
    /// Where the SQLite database lives. Defaults to `{data_local_dir}/cogni`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<PathBuf>,
    pub models: ModelConfig,
    pub study: StudyConfig,
    pub rewards: RewardConfig,
    pub timeouts: TimeoutConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com/v1".to_string(),
            data_dir: None,
            models: ModelConfig::default(),
            study: StudyConfig::default(),
            rewards: RewardConfig::default(),
            timeouts: TimeoutConfig::default(),
        }
    }
}

/// Model names per tier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub high_fidelity: String,
    pub fast: String,
    pub image: String,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            high_fidelity: "gpt-4o".to_string(),
            fast: "gpt-4o-mini".to_string(),
            image: "dall-e-3".to_string(),
        }
    }
}

impl ModelConfig {
    pub fn for_mode(&self, mode: ProcessingMode) -> &str {
        match mode {
            ProcessingMode::HighFidelity => &self.high_fidelity,
            ProcessingMode::Fast => &self.fast,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StudyConfig {
    /// Maximum characters per chunk sent to the model
    pub chunk_size: usize,
    /// Default creativity (temperature), 0.0 - 1.0
    pub creativity: f64,
    #[serde(default)]
    pub mode: ProcessingMode,
}

impl Default for StudyConfig {
    fn default() -> Self {
        Self {
            chunk_size: 6000,
            creativity: 0.7,
            mode: ProcessingMode::default(),
        }
    }
}

/// XP granted per action
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct RewardConfig {
    pub synthesis: u32,
    pub review: u32,
}

impl Default for RewardConfig {
    fn default() -> Self {
        Self {
            synthesis: 30,
            review: 5,
        }
    }
}

/// HTTP timeouts in seconds
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    pub connect_secs: u64,
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            request_secs: 120,
        }
    }
}

impl AppConfig {
    /// Default config file location
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("cogni").join("config.toml"))
    }

    /// Load configuration from `path`, or from the default location when it
    /// exists, then apply environment overrides and validate.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => match Self::default_path() {
                Some(p) if p.exists() => Self::from_file(&p)?,
                _ => Self::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML config file without env overrides
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&content)?;
        log::debug!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Apply environment overrides using the given lookup
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup(API_KEY_ENV).filter(|k| !k.trim().is_empty()) {
            self.api_key = Some(key);
        }
        if let Some(url) = lookup(BASE_URL_ENV).filter(|u| !u.trim().is_empty()) {
            self.base_url = url;
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.study.chunk_size == 0 {
            return Err(ConfigError::Invalid {
                field: "study.chunk_size",
                reason: "must be greater than zero".to_string(),
            });
        }
        if !(0.0..=1.0).contains(&self.study.creativity) {
            return Err(ConfigError::Invalid {
                field: "study.creativity",
                reason: format!("{} is outside 0.0 - 1.0", self.study.creativity),
            });
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::Invalid {
                field: "base_url",
                reason: "URL must start with http:// or https://".to_string(),
            });
        }
        Ok(())
    }

    /// Resolved data directory
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => dirs::data_local_dir()
                .map(|p| p.join("cogni"))
                .ok_or(ConfigError::DataDirNotFound),
        }
    }

    /// Path of the SQLite database holding cards and the profile
    pub fn database_path(&self) -> Result<PathBuf> {
        Ok(self.data_dir()?.join("cogni.db"))
    }
}
