//! Host configuration.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HostConfig {
    /// The directory holding the bundled content and assets.
    pub asset_dir: PathBuf,
    /// The directory where storage scopes are kept.
    pub data_dir: PathBuf,
    /// The name of the storage scope for settings.
    pub settings_scope: String,
    /// Whether the simulated OS starts with the location permission granted.
    pub location_granted: bool,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            asset_dir: "assets".into(),
            data_dir: "data".into(),
            settings_scope: "AppSettings".into(),
            location_granted: false,
        }
    }
}

impl HostConfig {
    /// Load the configuration from a JSON file, or use the defaults if there is no file.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let json = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        serde_json::from_str(&json).with_context(|| format!("Bad config {}", path.display()))
    }
}
