//! Catalog tables and install operations
//!
//! The three catalog tables live here: control entries, version entries,
//! and update-path edges. The struct doubles as the snapshot format
//! (`catalog.yaml`) used for logical backups and by the CLI.

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::control::{validate_extension_name, validate_version, ExtensionControl};
use crate::error::{RegistryError, Result};

/// Snapshot schema version
pub(crate) const API_VERSION: &str = "extcat.dev/v1";

/// A stored version of an extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionEntry {
    /// Opaque script body executed when this version materializes
    pub payload: String,

    /// When this version was installed
    pub installed_at: String,
}

/// A directed upgrade edge between two versions of one extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePathEdge {
    /// Source version
    pub from: String,

    /// Target version
    pub to: String,

    /// Migration script applied when upgrading along the edge
    pub payload: String,

    /// When this edge was installed
    pub installed_at: String,
}

/// One row of [`CatalogStore::list_extensions`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionSummary {
    pub name: String,
    pub default_version: String,
    pub comment: String,
}

/// One row of [`CatalogStore::list_extension_versions`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtensionVersionRow {
    pub name: String,
    pub version: String,
    pub superuser: bool,
    pub trusted: bool,
    pub relocatable: bool,
    pub schema: Option<String>,
    pub requires: Vec<String>,
    pub comment: String,
}

/// The catalog tables: control entries, version entries, update paths
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStore {
    /// API version for schema compatibility
    pub api_version: String,

    /// When this snapshot was last written
    pub generated: String,

    /// Control metadata, keyed by extension name
    pub(crate) controls: BTreeMap<String, ExtensionControl>,

    /// Version entries, keyed by name then version
    pub(crate) versions: BTreeMap<String, BTreeMap<String, VersionEntry>>,

    /// Update-path edges, keyed by extension name
    pub(crate) update_paths: BTreeMap<String, Vec<UpdatePathEdge>>,
}

impl Default for CatalogStore {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            generated: chrono::Utc::now().to_rfc3339(),
            controls: BTreeMap::new(),
            versions: BTreeMap::new(),
            update_paths: BTreeMap::new(),
        }
    }
}

impl CatalogStore {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Install a new extension, or a new version of one whose control
    /// metadata matches the arguments exactly.
    ///
    /// The first install for a name creates the control entry and makes
    /// `version` the default.
    pub fn install_extension(
        &mut self,
        name: &str,
        version: &str,
        comment: &str,
        payload: &str,
        requires: &[String],
    ) -> Result<()> {
        validate_extension_name(name)?;
        validate_version(version)?;

        if self.has_version(name, version) {
            return Err(RegistryError::VersionExists {
                name: name.to_string(),
                version: version.to_string(),
            });
        }

        let requires: BTreeSet<String> = requires.iter().cloned().collect();
        if let Some(control) = self.controls.get(name) {
            if !control.matches(comment, &requires) {
                return Err(RegistryError::ControlConflict {
                    name: name.to_string(),
                });
            }
        }

        self.controls
            .entry(name.to_string())
            .or_insert_with(|| ExtensionControl::new(comment, version, requires));

        self.versions
            .entry(name.to_string())
            .or_default()
            .insert(version.to_string(), VersionEntry {
                payload: payload.to_string(),
                installed_at: chrono::Utc::now().to_rfc3339(),
            });

        info!("Installed extension {} v{}", name, version);
        Ok(())
    }

    /// Add a version to an already-installed extension.
    ///
    /// Never touches the default version or the control metadata.
    pub fn install_extension_version(
        &mut self,
        name: &str,
        version: &str,
        payload: &str,
    ) -> Result<()> {
        validate_extension_name(name)?;
        validate_version(version)?;

        if !self.controls.contains_key(name) {
            return Err(RegistryError::ExtensionNotFound {
                name: name.to_string(),
            });
        }

        if self.has_version(name, version) {
            return Err(RegistryError::VersionExists {
                name: name.to_string(),
                version: version.to_string(),
            });
        }

        self.versions
            .entry(name.to_string())
            .or_default()
            .insert(version.to_string(), VersionEntry {
                payload: payload.to_string(),
                installed_at: chrono::Utc::now().to_rfc3339(),
            });

        info!("Installed extension {} v{} (version only)", name, version);
        Ok(())
    }

    /// Repoint the default version.
    ///
    /// The target version must already be installed, so the default can
    /// never dangle.
    pub fn set_default_version(&mut self, name: &str, version: &str) -> Result<()> {
        if !self.has_version(name, version) {
            if !self.controls.contains_key(name) {
                return Err(RegistryError::ExtensionNotFound {
                    name: name.to_string(),
                });
            }
            return Err(RegistryError::VersionNotFound {
                name: name.to_string(),
                version: version.to_string(),
            });
        }

        if let Some(control) = self.controls.get_mut(name) {
            control.default_version = version.to_string();
            debug!("Repointed default version of {} to {}", name, version);
        }

        Ok(())
    }

    /// Get the control entry for an extension
    pub fn control(&self, name: &str) -> Option<&ExtensionControl> {
        self.controls.get(name)
    }

    /// Check if a specific version is installed
    pub fn has_version(&self, name: &str, version: &str) -> bool {
        self.versions
            .get(name)
            .map(|versions| versions.contains_key(version))
            .unwrap_or(false)
    }

    /// Number of installed versions for an extension
    pub fn version_count(&self, name: &str) -> usize {
        self.versions.get(name).map(BTreeMap::len).unwrap_or(0)
    }

    /// Get the stored payload for a specific version
    pub fn version_payload(&self, name: &str, version: &str) -> Option<&str> {
        self.versions
            .get(name)
            .and_then(|versions| versions.get(version))
            .map(|entry| entry.payload.as_str())
    }

    /// Number of installed extensions
    pub fn extension_count(&self) -> usize {
        self.controls.len()
    }

    /// List installed extensions.
    ///
    /// Lazy and snapshot-consistent within the borrow.
    pub fn list_extensions(&self) -> impl Iterator<Item = ExtensionSummary> + '_ {
        self.controls.iter().map(|(name, control)| ExtensionSummary {
            name: name.clone(),
            default_version: control.default_version.clone(),
            comment: control.comment.clone(),
        })
    }

    /// List every installed version with its control-derived columns
    pub fn list_extension_versions(&self) -> impl Iterator<Item = ExtensionVersionRow> + '_ {
        let controls = &self.controls;
        self.versions.iter().flat_map(move |(name, versions)| {
            versions.keys().filter_map(move |version| {
                controls.get(name).map(|control| ExtensionVersionRow {
                    name: name.clone(),
                    version: version.clone(),
                    superuser: control.superuser,
                    trusted: control.trusted,
                    relocatable: control.relocatable,
                    schema: control.schema.clone(),
                    requires: control.requires.iter().cloned().collect(),
                    comment: control.comment.clone(),
                })
            })
        })
    }

    /// Load a snapshot, or an empty catalog if the file does not exist
    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog snapshot: {}", path.display()))?;

        serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse catalog snapshot: {}", path.display()))
    }

    /// Save a snapshot, refreshing the `generated` stamp
    pub fn save_to_path(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut snapshot = self.clone();
        snapshot.generated = chrono::Utc::now().to_rfc3339();

        let content =
            serde_yaml_ng::to_string(&snapshot).context("Failed to serialize catalog snapshot")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write catalog snapshot: {}", path.display()))?;

        Ok(())
    }
}
