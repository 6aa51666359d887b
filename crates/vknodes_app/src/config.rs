// SPDX-License-Identifier: MIT OR Apache-2.0
//! Editor configuration file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use vknodes_graph::layout::LAYOUT_FILE_NAME;

/// Current config format version
pub const CONFIG_FORMAT_VERSION: u32 = 1;

/// Default config file name
pub const CONFIG_FILE_NAME: &str = "vknodes.ron";

/// Error when loading or saving the config
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("Config I/O error on {path:?}: {source}")]
    Io {
        /// Config path
        path: PathBuf,
        /// Underlying error
        source: std::io::Error,
    },

    /// File is not valid RON
    #[error("Config parse error: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Config could not be encoded
    #[error("Config encode error: {0}")]
    Encode(#[from] ron::Error),

    /// File is newer than this build
    #[error("Config version {found} is newer than supported version {supported}")]
    Version {
        /// Version in the file
        found: u32,
        /// Newest version this build reads
        supported: u32,
    },
}

/// Main window settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowSettings {
    /// Window title
    pub title: String,
    /// Initial width in points
    pub width: f32,
    /// Initial height in points
    pub height: f32,
}

impl Default for WindowSettings {
    fn default() -> Self {
        Self {
            title: "vknodes".to_string(),
            width: 1280.0,
            height: 720.0,
        }
    }
}

/// Graph canvas settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CanvasSettings {
    /// Draw the background grid
    pub show_grid: bool,
    /// Draw the minimap
    pub show_minimap: bool,
    /// Snap dropped nodes to the grid
    pub snap_to_grid: bool,
    /// Snap step in graph units
    pub snap_size: f32,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            show_grid: true,
            show_minimap: true,
            snap_to_grid: false,
            snap_size: 20.0,
        }
    }
}

/// Editor configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    /// Format version
    pub version: u32,
    /// Window settings
    pub window: WindowSettings,
    /// Canvas settings
    pub editor: CanvasSettings,
    /// Where Ctrl+S / Ctrl+L write and read node positions
    pub layout_file: PathBuf,
    /// Default tracing filter, overridden by `RUST_LOG`
    pub log_filter: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_FORMAT_VERSION,
            window: WindowSettings::default(),
            editor: CanvasSettings::default(),
            layout_file: PathBuf::from(LAYOUT_FILE_NAME),
            log_filter: "vknodes=debug".to_string(),
        }
    }
}

impl EditorConfig {
    /// Load the config from a RON file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: EditorConfig = ron::from_str(&content)?;

        if config.version > CONFIG_FORMAT_VERSION {
            return Err(ConfigError::Version {
                found: config.version,
                supported: CONFIG_FORMAT_VERSION,
            });
        }

        Ok(config)
    }

    /// Load the config, falling back to the default when the file does not exist
    ///
    /// The default is written back to `path`. Failing to write it only logs a
    /// warning; read and parse errors of an existing file are returned.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            return Self::load(path);
        }

        let config = Self::default();
        match config.save(path) {
            Ok(()) => tracing::info!("Wrote default config to {:?}", path),
            Err(err) => tracing::warn!("Using default config, could not write it: {err}"),
        }
        Ok(config)
    }

    /// Save the config to a RON file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let pretty = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        let content = ron::ser::to_string_pretty(self, pretty)?;
        std::fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }
}
