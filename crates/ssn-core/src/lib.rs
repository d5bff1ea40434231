pub mod app_config;
pub mod config;
pub mod location;
pub mod services;
pub mod snapshot;

pub use app_config::{AppConfig, CatalogSource, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use location::{Coordinates, Location};
pub use services::{LocationEntry, OpenTime, ServiceRecord};
pub use snapshot::{load_snapshot, parse_snapshot, CatalogSnapshot, SnapshotFormat};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read catalog snapshot {path}: {source}")]
    SnapshotIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse JSON catalog snapshot: {0}")]
    SnapshotJson(#[from] serde_json::Error),

    #[error("failed to parse YAML catalog snapshot: {0}")]
    SnapshotYaml(#[from] serde_yaml::Error),

    #[error("unsupported catalog snapshot extension: {0}")]
    SnapshotFormat(String),

    #[error("catalog validation failed: {0}")]
    Validation(String),
}
