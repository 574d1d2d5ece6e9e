use std::path::{Path, PathBuf};

use passcan_core::Language;
use passcan_ocr::{ExtractionConfig, ExtractionConfigError, PreprocessOptions};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("Invalid config file {}: {source}", path.display())]
    Invalid {
        path: PathBuf,
        #[source]
        source: ExtractionConfigError,
    },
}

/// Settings read from `config.toml`. Every key is optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Recognition language code used when `--lang` is not given.
    pub language: Language,
    /// Normalize the image before handing it to the engine.
    pub preprocess: bool,
    /// Directory holding Tesseract `.traineddata` files.
    pub tessdata_dir: Option<PathBuf>,
    pub preprocess_options: PreprocessOptions,
    pub extraction: ExtractionConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            language: Language::Eng,
            preprocess: true,
            tessdata_dir: None,
            preprocess_options: PreprocessOptions::default(),
            extraction: ExtractionConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = toml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.extraction.validate().map_err(|source| ConfigError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(config)
    }

    /// `config.toml` under the platform config directory.
    pub fn default_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "passcan", "Passcan")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// An explicit path must exist. Otherwise the default location is used
    /// when present, falling back to built-in defaults.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        if let Some(path) = explicit {
            return Self::load(path);
        }
        match Self::default_path() {
            Some(path) if path.is_file() => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::load(&path)
            }
            _ => Ok(Self::default()),
        }
    }
}
