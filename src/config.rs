// src/config.rs

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::PathBuf};

use crate::predict::client::DEFAULT_PREDICT_URL;

/// Names a YAML file to load before env overrides are applied.
pub const CONFIG_ENV: &str = "BATCHPREDICT_CONFIG";
pub const URL_ENV: &str = "BATCHPREDICT_URL";
pub const EXPORT_DIR_ENV: &str = "BATCHPREDICT_EXPORT_DIR";
pub const SESSION_FILE_ENV: &str = "BATCHPREDICT_SESSION";
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkspaceConfig {
    /// Batch prediction endpoint; `/health` and `/user/login` are resolved against its origin.
    pub predict_url: String,
    pub export_dir: PathBuf,
    pub session_file: PathBuf,
    /// `EnvFilter` directive used when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for WorkspaceConfig {
    fn default() -> Self {
        Self {
            predict_url: DEFAULT_PREDICT_URL.to_string(),
            export_dir: PathBuf::from("exports"),
            session_file: PathBuf::from(".batchpredict-session.json"),
            log_filter: "info".to_string(),
        }
    }
}

impl WorkspaceConfig {
    /// Defaults, then the YAML file named by `BATCHPREDICT_CONFIG`, then env overrides.
    pub fn load() -> Result<Self> {
        let mut config = match env::var(CONFIG_ENV) {
            Ok(path) => Self::from_yaml_file(&path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|key| env::var(key).ok());
        Ok(config)
    }

    pub fn from_yaml_file(path: &str) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("reading config {}", path))?;
        Self::from_yaml(&text).with_context(|| format!("parsing config {}", path))
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Overlay values from `lookup`; blank values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = get(URL_ENV) {
            self.predict_url = url;
        }
        if let Some(dir) = get(EXPORT_DIR_ENV) {
            self.export_dir = PathBuf::from(dir);
        }
        if let Some(file) = get(SESSION_FILE_ENV) {
            self.session_file = PathBuf::from(file);
        }
        if let Some(level) = get(LOG_LEVEL_ENV) {
            self.log_filter = level;
        }
    }
}
