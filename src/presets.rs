use crate::color::Palette;
use crate::error::{FieldError, Result};
use crate::settings::FieldSettings;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

/// A named preset containing field settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub description: String,
    pub settings: FieldSettings,
    pub palette: Palette,
}

impl Preset {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        settings: FieldSettings,
        palette: Palette,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            settings,
            palette,
        }
    }
}

/// Manager for loading and saving presets
pub struct PresetManager {
    /// Built-in presets that ship with the app
    pub builtin: Vec<Preset>,
    /// User-created presets loaded from disk
    pub user: Vec<Preset>,
    dir: Option<PathBuf>,
}

impl Default for PresetManager {
    fn default() -> Self {
        Self::new()
    }
}

impl PresetManager {
    /// Built-ins plus user presets from the config directory
    pub fn new() -> Self {
        Self::with_dir(Self::presets_dir())
    }

    /// Built-ins plus user presets from `dir` (none when `dir` is None)
    pub fn with_dir(dir: Option<PathBuf>) -> Self {
        let mut manager = Self {
            builtin: builtin_presets(),
            user: Vec::new(),
            dir,
        };
        manager.load_user_presets();
        manager
    }

    /// Get the presets directory path
    fn presets_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("particle-field").join("presets"))
    }

    /// Load user presets from disk; unreadable files are skipped
    fn load_user_presets(&mut self) {
        let Some(dir) = &self.dir else { return };
        let Ok(entries) = fs::read_dir(dir) else { return };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.extension().is_some_and(|e| e == "json") {
                continue;
            }
            match fs::read_to_string(&path)
                .map_err(FieldError::from)
                .and_then(|content| serde_json::from_str::<Preset>(&content).map_err(FieldError::from))
            {
                Ok(mut preset) => {
                    preset.settings = preset.settings.sanitized();
                    self.user.push(preset);
                }
                Err(err) => tracing::warn!(path = %path.display(), %err, "skipping unreadable preset"),
            }
        }
        self.user.sort_by(|a, b| a.name.cmp(&b.name));
    }

    fn file_for(&self, name: &str) -> Result<PathBuf> {
        let dir = self.dir.as_ref().ok_or(FieldError::NoConfigDir)?;

        // Sanitize filename
        let filename = name
            .chars()
            .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
            .collect::<String>();

        Ok(dir.join(format!("{}.json", filename)))
    }

    /// Save a preset to disk, replacing a user preset of the same name
    pub fn save_preset(&mut self, preset: Preset) -> Result<PathBuf> {
        let path = self.file_for(&preset.name)?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }

        let json = serde_json::to_string_pretty(&preset)?;
        fs::write(&path, json)?;

        match self.user.iter_mut().find(|p| p.name == preset.name) {
            Some(existing) => *existing = preset,
            None => self.user.push(preset),
        }

        Ok(path)
    }

    /// Delete a user preset; returns whether anything was removed
    pub fn delete_preset(&mut self, name: &str) -> Result<bool> {
        let path = self.file_for(name)?;

        let before = self.user.len();
        self.user.retain(|p| p.name != name);
        let mut removed = self.user.len() != before;

        if path.exists() {
            fs::remove_file(&path)?;
            removed = true;
        }

        Ok(removed)
    }

    /// Get all presets (builtin + user)
    pub fn all_presets(&self) -> impl Iterator<Item = &Preset> {
        self.builtin.iter().chain(self.user.iter())
    }

    pub fn len(&self) -> usize {
        self.builtin.len() + self.user.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Preset at `index` in display order
    pub fn get(&self, index: usize) -> Option<&Preset> {
        self.all_presets().nth(index)
    }

    /// Find a preset by name
    pub fn find(&self, name: &str) -> Option<&Preset> {
        self.all_presets().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    #[cfg(test)]
    /// Get preset names for display
    pub fn preset_names(&self) -> Vec<&str> {
        self.all_presets().map(|p| p.name.as_str()).collect()
    }
}

fn builtin_presets() -> Vec<Preset> {
    vec![
        // Neural - default settings
        Preset::new(
            "Neural",
            "Slow indigo/cyan drift with soft connections",
            FieldSettings::default(),
            Palette::Neural,
        ),
        // Drift - calm, sparse and slow
        Preset::new(
            "Drift",
            "Barely moving particles, gentle pointer response",
            FieldSettings {
                max_drift: 0.1,
                repel_strength: 0.2,
                pointer_radius: 120.0,
                ..Default::default()
            },
            Palette::Aurora,
        ),
        // Storm - fast and jumpy
        Preset::new(
            "Storm",
            "Fast particles that scatter hard from the pointer",
            FieldSettings {
                max_drift: 1.2,
                repel_strength: 1.5,
                pointer_radius: 220.0,
                energized_radius_scale: 3.0,
                ..Default::default()
            },
            Palette::Ember,
        ),
        // Sparse - few particles, long reach
        Preset::new(
            "Sparse",
            "A handful of particles with long connections",
            FieldSettings {
                narrow_count: 15,
                wide_count: 30,
                ambient_link_distance: 220.0,
                ambient_link_opacity: 0.25,
                ..Default::default()
            },
            Palette::Mono,
        ),
        // Web - dense mesh at the particle cap
        Preset::new(
            "Web",
            "Dense mesh of short links",
            FieldSettings {
                narrow_count: 70,
                wide_count: 110,
                ambient_link_distance: 80.0,
                ambient_link_opacity: 0.3,
                ..Default::default()
            },
            Palette::Neural,
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::MAX_PARTICLES;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_presets_are_valid() {
        let manager = PresetManager::with_dir(None);
        assert_eq!(manager.len(), 5);
        for preset in manager.all_presets() {
            assert_eq!(preset.settings.clone().sanitized(), preset.settings, "{}", preset.name);
            assert!(preset.settings.wide_count <= MAX_PARTICLES);
        }
    }

    #[test]
    fn test_find_is_case_insensitive() {
        let manager = PresetManager::with_dir(None);
        assert_eq!(manager.find("storm").map(|p| p.palette), Some(Palette::Ember));
        assert!(manager.find("missing").is_none());
        assert_eq!(manager.get(0).map(|p| p.name.as_str()), Some("Neural"));
    }

    #[test]
    fn test_save_load_and_delete_user_preset() {
        let dir = TempDir::new().unwrap();
        let mut manager = PresetManager::with_dir(Some(dir.path().to_path_buf()));

        let preset = Preset::new("My Field!", "custom", FieldSettings::default(), Palette::Mono);
        let path = manager.save_preset(preset.clone()).unwrap();
        assert_eq!(path.file_name().unwrap(), "My_Field_.json");

        // A fresh manager sees it on disk
        let reloaded = PresetManager::with_dir(Some(dir.path().to_path_buf()));
        assert_eq!(reloaded.user, vec![preset]);
        assert!(reloaded.preset_names().contains(&"My Field!"));

        assert!(manager.delete_preset("My Field!").unwrap());
        assert!(!path.exists());
        assert!(!manager.delete_preset("My Field!").unwrap());
    }

    #[test]
    fn test_saving_same_name_replaces() {
        let dir = TempDir::new().unwrap();
        let mut manager = PresetManager::with_dir(Some(dir.path().to_path_buf()));

        manager
            .save_preset(Preset::new("a", "one", FieldSettings::default(), Palette::Mono))
            .unwrap();
        manager
            .save_preset(Preset::new("a", "two", FieldSettings::default(), Palette::Ember))
            .unwrap();

        assert_eq!(manager.user.len(), 1);
        assert_eq!(manager.user[0].description, "two");
    }

    #[test]
    fn test_broken_preset_file_is_skipped() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("broken.json"), "{").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let manager = PresetManager::with_dir(Some(dir.path().to_path_buf()));
        assert!(manager.user.is_empty());
    }

    #[test]
    fn test_no_dir_cannot_save() {
        let mut manager = PresetManager::with_dir(None);
        let preset = Preset::new("x", "", FieldSettings::default(), Palette::Neural);
        assert!(matches!(manager.save_preset(preset), Err(FieldError::NoConfigDir)));
    }
}
