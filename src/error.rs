// Error types for configuration loading and snapshot export.
// The simulation core itself has no fallible operations.

use std::path::PathBuf;
use thiserror::Error;

/// Errors raised while loading or validating a [`GrowthConfig`](crate::config::GrowthConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid YAML in {}: {source}", .path.display())]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("invalid JSON in {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("unsupported config extension for {} (expected .yaml, .yml or .json)", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error("invalid config value `{field}`: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

impl ConfigError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Errors raised while writing a rasterized frame to disk.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot surface has zero area ({width}x{height})")]
    EmptySurface { width: u32, height: u32 },

    #[error("failed to encode snapshot {}: {source}", .path.display())]
    Image {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
}
