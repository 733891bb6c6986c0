use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::config;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    pub base_url: String,
    pub api_token: Option<String>,
    pub page_size: u32,
    pub reconnect_delay_ms: u64,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            base_url: config::DEFAULT_BASE_URL.to_string(),
            api_token: None,
            page_size: config::DEFAULT_PAGE_SIZE,
            reconnect_delay_ms: config::DEFAULT_RECONNECT_DELAY_MS,
        }
    }
}

impl EngineSettings {
    /// Page size actually requested from the backend; never zero.
    pub fn effective_page_size(&self) -> u32 {
        self.page_size.max(1)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).context("Failed to parse settings")
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read settings from {}", path.display()))?;
        Self::from_json(&json)
    }

    /// Reads `path` (or the default location), falling back to defaults when
    /// the file is missing or malformed, then applies env overrides.
    pub fn load(path: Option<&Path>) -> Self {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// `load` with an injectable environment lookup.
    pub fn load_with<F>(path: Option<&Path>, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = path.map(Path::to_path_buf).or_else(settings_path);
        let mut settings = match path {
            Some(path) if path.exists() => match Self::load_from_path(&path) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!("Using default settings: {:#}", e);
                    Self::default()
                }
            },
            _ => Self::default(),
        };
        settings.apply_env_overrides(lookup);
        settings
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(config::ENV_BASE_URL).filter(|v| !v.is_empty()) {
            self.base_url = base_url;
        }
        if let Some(token) = lookup(config::ENV_TOKEN).filter(|v| !v.is_empty()) {
            self.api_token = Some(token);
        }
    }
}

fn settings_path() -> Option<PathBuf> {
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .or_else(|_| std::env::var("HOME").map(|home| PathBuf::from(home).join(".config")))
        .ok()?;
    Some(config_dir.join(config::APP_DIR).join("settings.json"))
}
