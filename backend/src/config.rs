use serde::{Deserialize, Serialize};
use shared::Locale;
use std::path::Path;
use std::str::FromStr;

use crate::detector::preprocess::InputSpec;

const DEFAULT_CONFIG_PATH: &str = "config/app.yaml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("Invalid value for {key}: {value:?}")]
    InvalidOverride { key: &'static str, value: String },
    #[error("Invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub model: ModelConfig,
    pub image: InputSpec,
    pub detection: DetectionConfig,
    pub upload: UploadConfig,
    pub locale: LocaleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub frontend_dir: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    pub path: String,
    pub labels_path: String,
    pub metadata_path: String,
    pub apply_softmax: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    pub confidence_threshold: f32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    pub dir: String,
    pub max_bytes: usize,
    pub retention: Retention,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct LocaleConfig {
    pub default: Locale,
}

/// What happens to an upload after a successful detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Retention {
    #[default]
    Delete,
    Public,
}

impl FromStr for Retention {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "delete" => Ok(Retention::Delete),
            "public" => Ok(Retention::Public),
            _ => Err(()),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5000,
            frontend_dir: "static".to_string(),
        }
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: "models/banana_classifier.pt".to_string(),
            labels_path: "config/labels.json".to_string(),
            metadata_path: "config/metadata.json".to_string(),
            apply_softmax: false,
        }
    }
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            confidence_threshold: 0.5,
        }
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            dir: "uploads".to_string(),
            max_bytes: 16 * 1024 * 1024,
            retention: Retention::default(),
        }
    }
}

impl AppConfig {
    /// Reads `BANANA_CONFIG` (or `config/app.yaml`), then applies environment overrides.
    pub fn load() -> Result<Self, ConfigError> {
        let explicit = std::env::var("BANANA_CONFIG").ok();
        let path = explicit.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);

        let mut config = if explicit.is_some() || Path::new(path).exists() {
            log::info!("Loading config from {}", path);
            Self::from_file(Path::new(path))?
        } else {
            log::info!("No config file at {}, using defaults", path);
            Self::default()
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&raw)
    }

    pub fn from_yaml_str(raw: &str) -> Result<Self, ConfigError> {
        Ok(serde_yaml::from_str(raw)?)
    }

    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidOverride { key, value })
        }

        if let Some(v) = lookup("PORT") {
            self.server.port = parsed("PORT", v)?;
        }
        if let Some(v) = lookup("BANANA_FRONTEND_DIR") {
            self.server.frontend_dir = v;
        }
        if let Some(v) = lookup("BANANA_MODEL_PATH") {
            self.model.path = v;
        }
        if let Some(v) = lookup("BANANA_LABELS_PATH") {
            self.model.labels_path = v;
        }
        if let Some(v) = lookup("BANANA_METADATA_PATH") {
            self.model.metadata_path = v;
        }
        if let Some(v) = lookup("BANANA_UPLOAD_DIR") {
            self.upload.dir = v;
        }
        if let Some(v) = lookup("BANANA_CONFIDENCE_THRESHOLD") {
            self.detection.confidence_threshold = parsed("BANANA_CONFIDENCE_THRESHOLD", v)?;
        }
        if let Some(v) = lookup("BANANA_MAX_UPLOAD_BYTES") {
            self.upload.max_bytes = parsed("BANANA_MAX_UPLOAD_BYTES", v)?;
        }
        if let Some(v) = lookup("BANANA_RETENTION") {
            self.upload.retention = parsed("BANANA_RETENTION", v)?;
        }
        if let Some(v) = lookup("BANANA_DEFAULT_LOCALE") {
            self.locale.default = parsed("BANANA_DEFAULT_LOCALE", v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let threshold = self.detection.confidence_threshold;
        if !(0.0..=1.0).contains(&threshold) {
            return Err(ConfigError::Invalid(format!(
                "confidence_threshold must be within [0, 1], got {}",
                threshold
            )));
        }
        if self.upload.max_bytes == 0 {
            return Err(ConfigError::Invalid("upload.max_bytes must be positive".into()));
        }
        if self.image.width == 0 || self.image.height == 0 {
            return Err(ConfigError::Invalid(format!(
                "image size must be positive, got {}x{}",
                self.image.width, self.image.height
            )));
        }
        if self.upload.dir.trim().is_empty() {
            return Err(ConfigError::Invalid("upload.dir must not be empty".into()));
        }
        Ok(())
    }
}
