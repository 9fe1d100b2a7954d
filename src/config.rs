//! Engine configuration.
//!
//! The configuration is plain data handed to [`crate::Editor::new`]. It can be
//! exported to and imported from JSON, and loaded from the user's config
//! directory by the command line front end.

use std::collections::BTreeMap;
use std::path::Path;

use annotator_geometry::InterpolationAlgorithm;
use serde::{Deserialize, Serialize};

use crate::constants;
use crate::keybindings::KeyChord;
use crate::model::MeasureUnit;

/// Log level setting for the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Get the display name for this log level.
    pub fn name(&self) -> &'static str {
        match self {
            LogLevel::Error => "Error",
            LogLevel::Warn => "Warn",
            LogLevel::Info => "Info",
            LogLevel::Debug => "Debug",
            LogLevel::Trace => "Trace",
        }
    }

    /// Get all log levels in order from least to most verbose.
    pub fn all() -> &'static [LogLevel] {
        &[
            LogLevel::Error,
            LogLevel::Warn,
            LogLevel::Info,
            LogLevel::Debug,
            LogLevel::Trace,
        ]
    }

    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Version of the configuration file format
    pub version: u32,

    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,

    #[serde(default)]
    pub history: HistoryConfig,

    #[serde(default)]
    pub editing: EditingConfig,

    #[serde(default)]
    pub interpolation: InterpolationConfig,

    #[serde(default)]
    pub measures: MeasuresConfig,

    #[serde(default)]
    pub video: VideoConfig,

    /// Chords replacing the default bindings of a command, keyed by command id
    #[serde(default)]
    pub keybindings: BTreeMap<String, Vec<KeyChord>>,
}

/// Undo history settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HistoryConfig {
    /// Oldest actions are dropped beyond this many
    #[serde(default = "default_max_history")]
    pub max_history: usize,
}

fn default_max_history() -> usize {
    constants::DEFAULT_MAX_HISTORY
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            max_history: default_max_history(),
        }
    }
}

/// Pointer interaction thresholds. Radii are in canvas pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EditingConfig {
    #[serde(default = "default_vertex_hit_radius")]
    pub vertex_hit_radius: f64,

    /// Clicking this close to the first vertex closes a polygon
    #[serde(default = "default_polygon_close_threshold")]
    pub polygon_close_threshold: f64,

    /// Boxes smaller than this (image pixels) are discarded
    #[serde(default = "default_min_bbox_size")]
    pub min_bbox_size: f64,

    #[serde(default = "default_annotation_hit_radius")]
    pub annotation_hit_radius: f64,
}

fn default_vertex_hit_radius() -> f64 {
    constants::DEFAULT_VERTEX_HIT_RADIUS
}

fn default_polygon_close_threshold() -> f64 {
    constants::DEFAULT_POLYGON_CLOSE_THRESHOLD
}

fn default_min_bbox_size() -> f64 {
    constants::DEFAULT_MIN_BBOX_SIZE
}

fn default_annotation_hit_radius() -> f64 {
    constants::DEFAULT_ANNOTATION_HIT_RADIUS
}

impl Default for EditingConfig {
    fn default() -> Self {
        Self {
            vertex_hit_radius: default_vertex_hit_radius(),
            polygon_close_threshold: default_polygon_close_threshold(),
            min_bbox_size: default_min_bbox_size(),
            annotation_hit_radius: default_annotation_hit_radius(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct InterpolationConfig {
    /// Algorithm stamped on newly created video annotations
    #[serde(default)]
    pub default_algorithm: InterpolationAlgorithm,
}

/// Physical size of one image pixel, used by the measures sub-annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasuresConfig {
    #[serde(default = "default_pixel_spacing")]
    pub pixel_spacing: PixelSpacing,

    #[serde(default = "default_unit")]
    pub unit: MeasureUnit,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PixelSpacing {
    pub x: f64,
    pub y: f64,
}

fn default_pixel_spacing() -> PixelSpacing {
    PixelSpacing { x: 1.0, y: 1.0 }
}

fn default_unit() -> MeasureUnit {
    MeasureUnit {
        x: "px".to_string(),
        y: "px".to_string(),
    }
}

impl Default for MeasuresConfig {
    fn default() -> Self {
        Self {
            pixel_spacing: default_pixel_spacing(),
            unit: default_unit(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VideoConfig {
    #[serde(default = "default_fps")]
    pub fps: f64,
}

fn default_fps() -> f64 {
    constants::DEFAULT_VIDEO_FPS
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self { fps: default_fps() }
    }
}

impl EngineConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            log_level: LogLevel::default(),
            history: HistoryConfig::default(),
            editing: EditingConfig::default(),
            interpolation: InterpolationConfig::default(),
            measures: MeasuresConfig::default(),
            video: VideoConfig::default(),
            keybindings: BTreeMap::new(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        // Validate version compatibility
        if config.version > CONFIG_VERSION {
            return Err(ConfigError::VersionTooNew {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }

        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Write the configuration, creating parent directories if needed.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let json = self.to_json()?;
        std::fs::write(path, json)?;
        log::info!("Saved configuration to {:?}", path);
        Ok(())
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "annotator-config.json"
    }

    /// Get the default config file path.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<std::path::PathBuf> {
        // Try to use XDG config directory, fall back to home directory
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("annotator").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("annotator")
                    .join(Self::default_filename())
            })
        }
    }

    /// Load from the default path, falling back to defaults when the file is
    /// missing or unreadable.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::default();
        };
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return Self::default();
        }

        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                Self::default()
            }
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// JSON parsing error
    #[error("Failed to parse configuration: {0}")]
    ParseError(#[from] serde_json::Error),

    /// Configuration version is newer than supported
    #[error(
        "Configuration file version {file_version} is newer than supported version {supported_version}"
    )]
    VersionTooNew {
        file_version: u32,
        supported_version: u32,
    },

    /// I/O error when reading/writing config
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}
