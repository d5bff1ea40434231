//! Pre-fetched catalog snapshot files.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::services::{LocationEntry, ServiceRecord};
use crate::ConfigError;

/// The full catalog as bundled on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogSnapshot {
    pub services: Vec<ServiceRecord>,
    #[serde(default)]
    pub locations: Vec<LocationEntry>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotFormat {
    Json,
    Yaml,
}

impl SnapshotFormat {
    /// Picks the format from the file extension (`.json`, `.yaml`, `.yml`).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::SnapshotFormat`] for any other extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(ConfigError::SnapshotFormat(path.display().to_string())),
        }
    }
}

/// Load and validate a catalog snapshot file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_snapshot(path: &Path) -> Result<CatalogSnapshot, ConfigError> {
    let format = SnapshotFormat::from_path(path)?;
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SnapshotIo {
        path: path.display().to_string(),
        source: e,
    })?;
    parse_snapshot(&content, format)
}

/// Parse and validate snapshot content already in memory.
///
/// # Errors
///
/// Returns `ConfigError` if the content is malformed or fails validation.
pub fn parse_snapshot(
    content: &str,
    format: SnapshotFormat,
) -> Result<CatalogSnapshot, ConfigError> {
    let snapshot: CatalogSnapshot = match format {
        SnapshotFormat::Json => serde_json::from_str(content)?,
        SnapshotFormat::Yaml => serde_yaml::from_str(content)?,
    };
    validate_snapshot(&snapshot)?;
    Ok(snapshot)
}

fn validate_snapshot(snapshot: &CatalogSnapshot) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();

    for service in &snapshot.services {
        if service.id.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "service '{}' has an empty id",
                service.name
            )));
        }
        if service.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "service '{}' has an empty name",
                service.id
            )));
        }
        if service.organisation_slug.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "service '{}' has an empty organisation slug",
                service.id
            )));
        }
        if !seen_ids.insert(service.id.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate service id: '{}'",
                service.id
            )));
        }
        if let Some(coords) = service.coordinates() {
            if !coords.is_valid() {
                return Err(ConfigError::Validation(format!(
                    "service '{}' has out-of-range coordinates ({}, {})",
                    service.id, coords.lat, coords.lng
                )));
            }
        }
    }

    let mut seen_slugs = HashSet::new();
    for location in &snapshot.locations {
        if !seen_slugs.insert(location.slug.as_str()) {
            return Err(ConfigError::Validation(format!(
                "duplicate location slug: '{}'",
                location.slug
            )));
        }
    }

    Ok(())
}
