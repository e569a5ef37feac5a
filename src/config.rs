// SPDX-License-Identifier: GPL-3.0-or-later
// src/config.rs
//
// Global configuration for the application, stored as JSON in the config dir.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::constant::{
    API_KEY_ENV, APP_DIR, CONFIG_FILE, DEFAULT_ENDPOINT, DEFAULT_MODEL, STORAGE_FILE,
};

/// Global configuration for the application.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// API key for the hosted model. Environment variables take priority.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Base URL of the model API.
    pub endpoint: String,
    /// Image model name.
    pub model: String,
    /// Request timeout in seconds (0 disables the timeout).
    pub request_timeout_secs: u64,
    /// Directory results are written to when no output path is given.
    pub output_dir: Option<PathBuf>,
    /// Local storage file holding user scenarios.
    pub storage_path: Option<PathBuf>,
    /// Default brush diameter of the mask editor.
    pub brush_size: f32,
    /// Size of the area the mask editor renders the target into.
    pub mask_view_width: f32,
    pub mask_view_height: f32,
    /// Size of the area the cropper renders the source into.
    pub crop_view_width: f32,
    pub crop_view_height: f32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout_secs: 120,
            output_dir: dirs::picture_dir().or_else(dirs::home_dir),
            storage_path: None,
            brush_size: 40.0,
            mask_view_width: 1024.0,
            mask_view_height: 576.0,
            crop_view_width: 1024.0,
            crop_view_height: 768.0,
        }
    }
}

impl AppConfig {
    /// Default location of the config file.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join(CONFIG_FILE))
    }

    /// Load the config from `path`, or from the default location.
    ///
    /// A missing file yields the defaults. A file that fails to parse is
    /// reported and replaced by the defaults, so a broken config never blocks
    /// the application.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) else {
            return Self::default();
        };

        match Self::read(&path) {
            Ok(Some(config)) => config,
            Ok(None) => Self::default(),
            Err(e) => {
                log::warn!("Ignoring config {}: {:#}", path.display(), e);
                Self::default()
            }
        }
    }

    fn read(path: &Path) -> anyhow::Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        let config = serde_json::from_str(&raw).context("parsing config")?;
        Ok(Some(config))
    }

    /// API key from the environment, falling back to the config file.
    pub fn resolve_api_key(&self) -> Option<String> {
        API_KEY_ENV
            .iter()
            .find_map(|name| std::env::var(name).ok())
            .or_else(|| self.api_key.clone())
            .filter(|key| !key.trim().is_empty())
    }

    /// Local storage file, defaulting to the platform data directory.
    pub fn resolve_storage_path(&self) -> PathBuf {
        self.storage_path.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join(APP_DIR)
                .join(STORAGE_FILE)
        })
    }

    /// Directory generated files land in.
    pub fn resolve_output_dir(&self) -> PathBuf {
        self.output_dir
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
