//! Feature registration table
//!
//! Binds installed functions to recognized hooks, keyed by (feature,
//! schema, function) and matched against deletions by durable identity.
//! The struct doubles as the snapshot format (`features.yaml`) that rides
//! along in logical backups.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::directory::{FunctionDirectory, FunctionIdentity, FunctionRef};
use super::hook::Feature;
use crate::error::{ErrorKind, RegistryError, Result};

/// Snapshot schema version
const API_VERSION: &str = "extcat.dev/v1";

/// A single feature registration row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureRegistration {
    /// The hook the function fulfills
    pub feature: Feature,

    /// Schema of the registered function
    pub schema: String,

    /// Name of the registered function
    pub function: String,

    /// Durable identity the drop guard matches against
    pub identity: FunctionIdentity,

    /// When this registration was recorded
    pub registered_at: String,
}

impl FeatureRegistration {
    /// Fully qualified `schema.function`
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.schema, self.function)
    }
}

/// The feature registration table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeatureRegistry {
    /// API version for schema compatibility
    pub api_version: String,

    /// When this snapshot was last written
    pub generated: String,

    /// Registration rows
    registrations: Vec<FeatureRegistration>,
}

impl Default for FeatureRegistry {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            generated: chrono::Utc::now().to_rfc3339(),
            registrations: Vec::new(),
        }
    }
}

impl FeatureRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a function for a feature.
    ///
    /// The reference is resolved through the directory service; the row
    /// records the resolved schema, name, and identity.
    pub fn register(
        &mut self,
        directory: &dyn FunctionDirectory,
        func: &FunctionRef,
        feature: Feature,
    ) -> Result<()> {
        let record = directory.resolve(func)?;

        if self.find(feature, &record.schema, &record.name).is_some() {
            return Err(RegistryError::FeatureAlreadyRegistered {
                function: record.qualified(),
                feature,
            });
        }

        debug!("Registered {} for feature {}", record.qualified(), feature);
        self.registrations.push(FeatureRegistration {
            feature,
            schema: record.schema,
            function: record.name,
            identity: record.identity,
            registered_at: chrono::Utc::now().to_rfc3339(),
        });

        Ok(())
    }

    /// Register a function, tolerating an existing registration
    pub fn register_if_not_exists(
        &mut self,
        directory: &dyn FunctionDirectory,
        func: &FunctionRef,
        feature: Feature,
    ) -> Result<bool> {
        match self.register(directory, func, feature) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::Conflict => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Remove the registration binding a function to a feature.
    ///
    /// The reference is resolved to an identity and every row matching
    /// (identity, feature) is deleted; zero matches is an error.
    pub fn unregister(
        &mut self,
        directory: &dyn FunctionDirectory,
        func: &FunctionRef,
        feature: Feature,
    ) -> Result<()> {
        let record = directory.resolve(func)?;

        let before = self.registrations.len();
        self.registrations
            .retain(|row| !(row.feature == feature && row.identity == record.identity));

        if self.registrations.len() == before {
            return Err(RegistryError::FeatureNotRegistered {
                function: record.qualified(),
                feature,
            });
        }

        debug!("Unregistered {} from feature {}", record.qualified(), feature);
        Ok(())
    }

    /// Remove a registration, tolerating its absence
    pub fn unregister_if_exists(
        &mut self,
        directory: &dyn FunctionDirectory,
        func: &FunctionRef,
        feature: Feature,
    ) -> Result<bool> {
        match self.unregister(directory, func, feature) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Whether any row references the identity
    pub fn is_referenced(&self, identity: FunctionIdentity) -> bool {
        self.registrations
            .iter()
            .any(|row| row.identity == identity)
    }

    /// Rows referencing the identity
    pub fn rows_for_identity(
        &self,
        identity: FunctionIdentity,
    ) -> impl Iterator<Item = &FeatureRegistration> {
        self.registrations
            .iter()
            .filter(move |row| row.identity == identity)
    }

    /// Remove every row referencing the identity, returning the count
    /// removed (the extension-teardown cascade entry point).
    pub fn remove_identity(&mut self, identity: FunctionIdentity) -> Result<usize> {
        let before = self.registrations.len();
        self.registrations.retain(|row| row.identity != identity);
        Ok(before - self.registrations.len())
    }

    /// Look up a row by its (feature, schema, function) key
    pub fn find(&self, feature: Feature, schema: &str, function: &str) -> Option<&FeatureRegistration> {
        self.registrations
            .iter()
            .find(|row| row.feature == feature && row.schema == schema && row.function == function)
    }

    /// All registration rows
    pub fn registrations(&self) -> &[FeatureRegistration] {
        &self.registrations
    }

    /// Number of registration rows
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }

    /// Load a snapshot, or an empty registry if the file does not exist
    pub fn load_from_path(path: &Path) -> anyhow::Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read registry snapshot: {}", path.display()))?;

        serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse registry snapshot: {}", path.display()))
    }

    /// Save a snapshot, refreshing the `generated` stamp
    pub fn save_to_path(&self, path: &Path) -> anyhow::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut snapshot = self.clone();
        snapshot.generated = chrono::Utc::now().to_rfc3339();

        let content =
            serde_yaml_ng::to_string(&snapshot).context("Failed to serialize registry snapshot")?;

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write registry snapshot: {}", path.display()))?;

        Ok(())
    }
}
