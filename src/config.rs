use crate::settings::{EngineSettings, LineStyle};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while exporting or importing a configuration file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write config file '{path}': {source}")]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to parse config file '{path}': {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Complete host configuration for export/import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Version field for future compatibility
    pub version: u32,
    /// Engine settings (area dimensions are replaced by the drawing surface)
    pub settings: EngineSettings,
    /// Milliseconds between frame requests
    pub tick_ms: u64,
    /// RGB color of particles
    pub particle_color: [u8; 3],
    /// RGB color of connecting lines
    pub line_color: [u8; 3],
}

impl AppConfig {
    pub fn line_style(&self) -> LineStyle {
        self.settings.line_style
    }

    /// Export config to a JSON file
    pub fn save_to_file(&self, path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Import config from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: 1,
            settings: EngineSettings::default(),
            tick_ms: 16,
            particle_color: [255, 255, 255],
            line_color: [120, 200, 255],
        }
    }
}
