use crate::settings::{EngineSettings, LineStyle};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum PresetError {
    #[error("could not determine config directory")]
    NoConfigDir,

    #[error("preset I/O failed for '{path}': {source}")]
    Io { path: PathBuf, source: io::Error },

    #[error("failed to serialize preset: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A named look for the particle field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preset {
    pub name: String,
    pub description: String,
    /// Area dimensions in here are ignored; the drawing surface decides them
    pub settings: EngineSettings,
}

impl Preset {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        settings: EngineSettings,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            settings,
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

/// Turn a preset name into a safe file stem
fn file_stem(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect()
}

impl PresetManager {
    /// Manager backed by the user's config directory
    pub fn new() -> Self {
        Self::with_dir(Self::default_dir())
    }

    /// Manager backed by an explicit directory (`None` keeps only built-ins)
    pub fn with_dir(dir: Option<PathBuf>) -> Self {
        let mut manager = Self {
            builtin: Self::builtin_presets(),
            user: Vec::new(),
            dir,
        };
        manager.load_user_presets();
        manager
    }

    fn builtin_presets() -> Vec<Preset> {
        vec![
            Preset::new(
                "Constellation",
                "Sparse, slow stars with faint links",
                EngineSettings::default(),
            ),
            Preset::new(
                "Web",
                "Dense field with long, strong links",
                EngineSettings {
                    particle_count: 220,
                    link_distance: 40.0,
                    line_style: LineStyle::Strong,
                    radius: 1.0,
                    ..Default::default()
                },
            ),
            Preset::new(
                "Fireflies",
                "Translucent particles of mixed sizes, few links",
                EngineSettings {
                    particle_count: 120,
                    link_distance: 14.0,
                    radius: 2.5,
                    radius_variance: 0.6,
                    alpha_min: Some(0.2),
                    ..Default::default()
                },
            ),
            Preset::new(
                "Rush",
                "Fast particles streaming through the frame",
                EngineSettings {
                    particle_count: 100,
                    min_speed: 1.5,
                    max_speed: 3.0,
                    link_distance: 25.0,
                    ..Default::default()
                },
            ),
            Preset::new(
                "Dust",
                "Many tiny particles without links",
                EngineSettings {
                    particle_count: 400,
                    link_distance: 0.0,
                    radius: 0.5,
                    min_speed: 0.05,
                    max_speed: 0.3,
                    ..Default::default()
                },
            ),
        ]
    }

    fn default_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("particle-field").join("presets"))
    }

    /// Load user presets from disk; unreadable files are skipped
    fn load_user_presets(&mut self) {
        let Some(dir) = &self.dir else {
            return;
        };
        let Ok(entries) = fs::read_dir(dir) else {
            return;
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if !path.extension().is_some_and(|e| e == "json") {
                continue;
            }
            match fs::read_to_string(&path)
                .ok()
                .and_then(|content| serde_json::from_str::<Preset>(&content).ok())
            {
                Some(preset) => {
                    debug!(name = %preset.name, "Loaded user preset");
                    self.user.push(preset);
                }
                None => warn!(path = %path.display(), "Skipping unreadable preset"),
            }
        }
    }

    /// Save a preset to disk
    pub fn save_preset(&mut self, preset: Preset) -> Result<(), PresetError> {
        let dir = self.dir.clone().ok_or(PresetError::NoConfigDir)?;

        fs::create_dir_all(&dir).map_err(|source| PresetError::Io {
            path: dir.clone(),
            source,
        })?;

        let path = dir.join(format!("{}.json", file_stem(&preset.name)));
        let json = serde_json::to_string_pretty(&preset)?;
        fs::write(&path, json).map_err(|source| PresetError::Io {
            path: path.clone(),
            source,
        })?;

        match self.user.iter_mut().find(|p| p.name == preset.name) {
            Some(existing) => *existing = preset,
            None => self.user.push(preset),
        }

        Ok(())
    }

    /// Delete a user preset
    pub fn delete_preset(&mut self, name: &str) -> Result<(), PresetError> {
        let dir = self.dir.clone().ok_or(PresetError::NoConfigDir)?;

        if let Some(pos) = self.user.iter().position(|p| p.name == name) {
            self.user.remove(pos);
        }

        let path = dir.join(format!("{}.json", file_stem(name)));
        if path.exists() {
            fs::remove_file(&path).map_err(|source| PresetError::Io {
                path: path.clone(),
                source,
            })?;
        }

        Ok(())
    }

    /// Get all presets (builtin + user)
    pub fn all_presets(&self) -> impl Iterator<Item = &Preset> {
        self.builtin.iter().chain(self.user.iter())
    }

    /// Find a preset by name
    pub fn find(&self, name: &str) -> Option<&Preset> {
        self.all_presets().find(|p| p.name.eq_ignore_ascii_case(name))
    }

    /// Get preset names for display
    pub fn preset_names(&self) -> Vec<&str> {
        self.all_presets().map(|p| p.name.as_str()).collect()
    }
}
