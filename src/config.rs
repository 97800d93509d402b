use crate::color::Palette;
use crate::error::{FieldError, Result};
use crate::settings::FieldSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Complete application configuration for export/import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Version field for future compatibility
    pub version: u32,
    /// All field settings
    pub settings: FieldSettings,
    /// Color palette
    pub palette: Palette,
    /// Fixed RNG seed for reproducible fields
    pub seed: Option<u64>,
}

impl AppConfig {
    /// Default config location, e.g. `~/.config/particle-field/config.json`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("particle-field").join("config.json"))
    }

    /// Export config to a JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Import config from a JSON file; out-of-range settings are pulled back in
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        let mut config: AppConfig = serde_json::from_str(&content)?;
        config.settings = config.settings.sanitized();
        Ok(config)
    }

    /// Load `path` when given, otherwise the default location if it exists
    pub fn resolve(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_file(path),
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::load_from_file(&path),
                _ => Ok(Self::default()),
            },
        }
    }

    /// Save to the default location
    pub fn save_default(&self) -> Result<PathBuf> {
        let path = Self::default_path().ok_or(FieldError::NoConfigDir)?;
        self.save_to_file(&path)?;
        Ok(path)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            settings: FieldSettings::default(),
            palette: Palette::default(),
            seed: None,
        }
    }
}
