//! Runtime configuration: API keys, model overrides and analysis defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ai::provider::DEFAULT_TIMEOUT_SECS;

/// Looked up in the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "dxfguard.json";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DxfGuardConfig {
    pub openai_api_key: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub openai_model: Option<String>,
    pub claude_model: Option<String>,
    pub gemini_model: Option<String>,
    pub preferred_provider: Option<String>,
    pub request_timeout_secs: u64,
    pub default_material: String,
    pub default_machine: String,
    pub min_text_height: f64,
}

impl Default for DxfGuardConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            anthropic_api_key: None,
            google_api_key: None,
            openai_model: None,
            claude_model: None,
            gemini_model: None,
            preferred_provider: None,
            request_timeout_secs: DEFAULT_TIMEOUT_SECS,
            default_material: "aluminum".to_string(),
            default_machine: "3axis_mill".to_string(),
            min_text_height: 2.5,
        }
    }
}

impl DxfGuardConfig {
    /// Read `path`, or `dxfguard.json` in the working directory when it
    /// exists, or fall back to defaults. Environment overrides are applied
    /// on top.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(p) => Self::from_file(p)?,
            None => {
                let local = Path::new(DEFAULT_CONFIG_FILE);
                if local.is_file() {
                    Self::from_file(local)?
                } else {
                    Self::default()
                }
            }
        };
        config.apply_env();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Overlay non-empty values returned by `lookup` for the known
    /// environment variable names.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("OPENAI_API_KEY") {
            self.openai_api_key = Some(v);
        }
        if let Some(v) = get("ANTHROPIC_API_KEY") {
            self.anthropic_api_key = Some(v);
        }
        if let Some(v) = get("GOOGLE_API_KEY") {
            self.google_api_key = Some(v);
        }
        if let Some(v) = get("DXFGUARD_AI_PROVIDER") {
            self.preferred_provider = Some(v.to_lowercase());
        }
    }
}
