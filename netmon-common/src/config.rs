use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable text format (default).
    #[default]
    Text,
    /// Structured JSON format.
    Json,
}

/// Common logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error".
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log output format: "text" or "json".
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: LogFormat::default(),
        }
    }
}

/// Connection settings for the device catalog and topology storage service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Base URL of the REST API, e.g. `http://localhost:8000/api`.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Branch whose devices and topologies are edited.
    #[serde(default = "default_branch_id")]
    pub branch_id: u64,

    /// CSRF token sent on every mutating call.
    #[serde(default)]
    pub csrf_token: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://localhost:8000/api".to_string()
}

fn default_branch_id() -> u64 {
    1
}

fn default_timeout_secs() -> u64 {
    15
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            branch_id: default_branch_id(),
            csrf_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

/// Tunables of the topology canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Lower zoom bound.
    #[serde(default = "default_min_zoom")]
    pub min_zoom: f64,

    /// Upper zoom bound.
    #[serde(default = "default_max_zoom")]
    pub max_zoom: f64,

    /// Zoom factor applied per wheel line or keyboard step.
    #[serde(default = "default_wheel_zoom_step")]
    pub wheel_zoom_step: f64,

    /// Node hit radius in graph units.
    #[serde(default = "default_node_radius")]
    pub node_radius: f64,

    /// Edge hit distance in screen pixels.
    #[serde(default = "default_edge_hit_tolerance")]
    pub edge_hit_tolerance: f64,

    /// How long connection feedback stays visible.
    #[serde(default = "default_feedback_millis")]
    pub feedback_millis: u64,

    /// Maximum number of devices listed in the palette.
    #[serde(default = "default_palette_limit")]
    pub palette_limit: usize,
}

fn default_min_zoom() -> f64 {
    0.1
}

fn default_max_zoom() -> f64 {
    4.0
}

fn default_wheel_zoom_step() -> f64 {
    1.1
}

fn default_node_radius() -> f64 {
    28.0
}

fn default_edge_hit_tolerance() -> f64 {
    6.0
}

fn default_feedback_millis() -> u64 {
    500
}

fn default_palette_limit() -> usize {
    50
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            min_zoom: default_min_zoom(),
            max_zoom: default_max_zoom(),
            wheel_zoom_step: default_wheel_zoom_step(),
            node_radius: default_node_radius(),
            edge_hit_tolerance: default_edge_hit_tolerance(),
            feedback_millis: default_feedback_millis(),
            palette_limit: default_palette_limit(),
        }
    }
}

impl EditorConfig {
    /// Reject bounds the viewport cannot honour.
    pub fn validate(&self) -> Result<()> {
        if !(self.min_zoom > 0.0 && self.min_zoom <= self.max_zoom) {
            return Err(Error::Config(format!(
                "Invalid zoom range [{}, {}]",
                self.min_zoom, self.max_zoom
            )));
        }
        if self.wheel_zoom_step <= 1.0 {
            return Err(Error::Config(
                "wheel_zoom_step must be greater than 1.0".to_string(),
            ));
        }
        if self.node_radius <= 0.0 {
            return Err(Error::Config("node_radius must be positive".to_string()));
        }
        Ok(())
    }
}

/// Configuration of the netmon topology editor.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NetmonConfig {
    /// Storage service settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Canvas settings.
    #[serde(default)]
    pub editor: EditorConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Default configuration file location (`<config dir>/netmon/config.json5`).
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("netmon").join("config.json5"))
}

/// Load a configuration file in JSON5 format.
pub fn load_config<T: for<'de> Deserialize<'de>>(path: impl AsRef<Path>) -> Result<T> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!(
            "Failed to read config file '{}': {}",
            path.display(),
            e
        ))
    })?;

    json5::from_str(&content).map_err(|e| {
        Error::Config(format!(
            "Failed to parse config file '{}': {}",
            path.display(),
            e
        ))
    })
}

/// Load a configuration from a JSON5 string.
pub fn parse_config<T: for<'de> Deserialize<'de>>(content: &str) -> Result<T> {
    json5::from_str(content).map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))
}
