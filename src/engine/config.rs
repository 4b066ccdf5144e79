// Configuration for clipdeck's cache, graphics, storage and logging layers
// Defaults are the tuned constants of the image delivery path

use crate::engine::error::ConfigError;
use crate::rendering::capability::GraphicsMode;
use crate::rendering::kitty::{ScaleUnit, MAX_CHUNK};
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "clipdeck";

/// Image cache sizing around the list cursor
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Prefetch radius R around the cursor (default 10)
    pub radius: usize,

    /// Distance E beyond which cached images are dropped (default 2R)
    pub eviction_distance: usize,

    /// Background preload threads
    pub workers: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            radius: 10,
            eviction_distance: 20,
            workers: 2,
        }
    }
}

/// Inline graphics settings
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GraphicsConfig {
    /// `auto` probes the environment, `kitty`/`none` force the decision
    pub mode: GraphicsMode,

    /// Assumed pixels per terminal column (terminals do not report this without a round trip)
    pub cell_width_px: u32,

    /// Assumed pixels per terminal row
    pub cell_height_px: u32,

    /// Maximum base64 bytes per protocol frame
    pub chunk_size: usize,

    /// Whether frames carry the scale target in pixels or cells
    pub scale: ScaleUnit,
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            mode: GraphicsMode::Auto,
            cell_width_px: 10,
            cell_height_px: 18,
            chunk_size: 4096,
            scale: ScaleUnit::Pixels,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub history_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Explicit history directory, else `<data_dir>/clipdeck/history`
    pub fn history_dir(&self) -> PathBuf {
        match &self.history_dir {
            Some(dir) => dir.clone(),
            None => dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR)
                .join("history"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level for clipdeck's own targets; `RUST_LOG` takes precedence
    pub level: String,

    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            directory: None,
        }
    }
}

impl LoggingConfig {
    /// Explicit log directory, else the platform state (or cache) directory
    pub fn log_dir(&self) -> PathBuf {
        match &self.directory {
            Some(dir) => dir.clone(),
            None => dirs::state_dir()
                .or_else(dirs::cache_dir)
                .unwrap_or_else(|| PathBuf::from("."))
                .join(APP_DIR),
        }
    }
}

/// Master configuration combining all clipdeck settings
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct Config {
    pub cache: CacheConfig,
    pub graphics: GraphicsConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

impl Config {
    /// `<config_dir>/clipdeck/config.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
    }

    /// Load configuration from `path`, or from the default location.
    ///
    /// An explicit path must exist. A missing file at the default location
    /// yields the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (path, required) = match path {
            Some(path) => (path.to_path_buf(), true),
            None => match Self::default_path() {
                Some(path) => (path, false),
                None => return Ok(Self::default()),
            },
        };

        match fs::read_to_string(&path) {
            Ok(contents) => Self::from_toml_str(&contents),
            Err(err) if err.kind() == io::ErrorKind::NotFound && !required => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read { path, source }),
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let config: Config = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let cache = &self.cache;
        if cache.radius == 0 {
            return Err(ConfigError::Invalid("cache.radius must be at least 1".into()));
        }
        if cache.eviction_distance < cache.radius {
            return Err(ConfigError::Invalid(format!(
                "cache.eviction_distance ({}) must not be smaller than cache.radius ({})",
                cache.eviction_distance, cache.radius
            )));
        }
        if cache.workers == 0 {
            return Err(ConfigError::Invalid("cache.workers must be at least 1".into()));
        }

        let graphics = &self.graphics;
        if graphics.cell_width_px == 0 || graphics.cell_height_px == 0 {
            return Err(ConfigError::Invalid(
                "graphics cell metrics must be non-zero".into(),
            ));
        }
        // Kitty requires every non-final chunk to be a multiple of 4 bytes
        if graphics.chunk_size == 0 || graphics.chunk_size % 4 != 0 {
            return Err(ConfigError::Invalid(format!(
                "graphics.chunk_size ({}) must be a positive multiple of 4",
                graphics.chunk_size
            )));
        }
        if graphics.chunk_size > MAX_CHUNK {
            return Err(ConfigError::Invalid(format!(
                "graphics.chunk_size ({}) exceeds the protocol limit of {MAX_CHUNK}",
                graphics.chunk_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_constants() {
        let config = Config::default();
        assert_eq!(config.cache.radius, 10);
        assert_eq!(config.cache.eviction_distance, 20);
        assert_eq!(config.graphics.cell_width_px, 10);
        assert_eq!(config.graphics.cell_height_px, 18);
        assert_eq!(config.graphics.chunk_size, 4096);
        assert_eq!(config.graphics.mode, GraphicsMode::Auto);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::from_toml_str(
            r#"
            [cache]
            radius = 4
            eviction_distance = 8

            [graphics]
            mode = "none"
            scale = "cells"
            "#,
        )
        .unwrap();

        assert_eq!(config.cache.radius, 4);
        assert_eq!(config.cache.eviction_distance, 8);
        assert_eq!(config.cache.workers, 2);
        assert_eq!(config.graphics.mode, GraphicsMode::None);
        assert_eq!(config.graphics.scale, ScaleUnit::Cells);
        assert_eq!(config.graphics.chunk_size, 4096);
    }

    #[test]
    fn test_rejects_eviction_inside_window() {
        let result = Config::from_toml_str("[cache]\nradius = 10\neviction_distance = 5\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_unaligned_chunk_size() {
        let result = Config::from_toml_str("[graphics]\nchunk_size = 4095\n");
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_rejects_oversized_chunk_size() {
        let result = Config::from_toml_str("[graphics]\nchunk_size = 8192\n");
        assert!(matches!(result, Err(ConfigError::Invalid(msg)) if msg.contains("4096")));

        let config = Config::from_toml_str("[graphics]\nchunk_size = 4096\n").unwrap();
        assert_eq!(config.graphics.chunk_size, 4096);
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let result = Config::from_toml_str("[cache\nradius = ");
        assert!(matches!(result, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn test_explicit_missing_path_is_error() {
        let result = Config::load(Some(Path::new("/nonexistent/clipdeck/config.toml")));
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn test_load_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[storage]\nhistory_dir = \"/tmp/clips\"\n").unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.storage.history_dir(), PathBuf::from("/tmp/clips"));
    }
}
