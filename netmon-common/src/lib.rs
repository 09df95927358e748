//! Netmon Common Library
//!
//! This crate provides shared types and utilities for the netmon topology editor:
//!
//! - [`geometry`] - Planar points shared by graph space and screen space
//! - [`device`] - Device catalog records and node display snapshots
//! - [`document`] - Wire types of the topology storage service (`canvas_data`, envelopes)
//! - [`client`] - Device catalog and topology storage clients
//! - [`config`] - Configuration loading (JSON5 format)
//! - [`error`] - Error types

pub mod client;
pub mod config;
pub mod device;
pub mod document;
pub mod error;
pub mod geometry;

// Re-export commonly used types at the crate root
pub use client::{CSRF_HEADER, DeviceCatalog, HttpClient, TopologyStore};
pub use config::{
    EditorConfig, LogFormat, LoggingConfig, NetmonConfig, StorageConfig, default_config_path,
    load_config, parse_config,
};
pub use device::{DeviceCategory, DeviceId, DeviceRecord, DisplayData};
pub use document::{
    CanvasDocument, CanvasEdge, CanvasNode, DeviceLink, EdgeKind, ExportDocument, NodeData,
    PlacedDevice, TopologyId, TopologyPayload, TopologyRecord, TopologySummary,
};
pub use error::{Error, Result};
pub use geometry::Point;

/// Initialize tracing with the given configuration.
///
/// Supports two output formats:
/// - `LogFormat::Text` (default): Human-readable text format
/// - `LogFormat::Json`: Structured JSON format for log aggregation systems
///
/// `RUST_LOG` takes precedence over the configured level.
///
/// # Example
///
/// ```ignore
/// use netmon_common::{LoggingConfig, LogFormat, init_tracing};
///
/// let config = LoggingConfig {
///     level: "info".to_string(),
///     format: LogFormat::Json,
/// };
/// init_tracing(&config)?;
/// ```
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer())
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json())
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
    }

    Ok(())
}
