//! Uninstall lifecycle
//!
//! Removal decisions depend on how many versions exist for the extension
//! and whether the requested one is the default. Removing the default
//! while siblings exist is refused; removing the sole version retires the
//! extension as a unit. The branching is deliberately asymmetric and must
//! stay that way.

use tracing::{debug, info};

use super::store::CatalogStore;
use crate::error::{ErrorKind, RegistryError, Result};

/// How many versions the catalog holds for an extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionCardinality {
    NoVersions,
    SingleVersion,
    MultiVersion,
}

impl VersionCardinality {
    /// Classify a version count
    pub fn of(count: usize) -> Self {
        match count {
            0 => VersionCardinality::NoVersions,
            1 => VersionCardinality::SingleVersion,
            _ => VersionCardinality::MultiVersion,
        }
    }
}

impl CatalogStore {
    /// Classify the version cardinality of an extension
    pub fn version_cardinality(&self, name: &str) -> VersionCardinality {
        VersionCardinality::of(self.version_count(name))
    }

    /// Remove an extension as a unit: every version entry, every
    /// update-path edge, and the control entry.
    pub fn uninstall_extension(&mut self, name: &str) -> Result<()> {
        if self.controls.remove(name).is_none() {
            return Err(RegistryError::ExtensionNotFound {
                name: name.to_string(),
            });
        }

        let versions_removed = self.versions.remove(name).map(|v| v.len()).unwrap_or(0);
        let paths_removed = self.update_paths.remove(name).map(|p| p.len()).unwrap_or(0);

        info!(
            "Uninstalled extension {} ({} versions, {} update paths)",
            name, versions_removed, paths_removed
        );
        Ok(())
    }

    /// Remove an extension, tolerating its absence
    pub fn uninstall_extension_if_exists(&mut self, name: &str) -> Result<bool> {
        match self.uninstall_extension(name) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Remove a single version, subject to the cardinality rules:
    ///
    /// - multiple versions: the default cannot be removed (repoint it
    ///   first); a non-default version is removed alone; a version that
    ///   is not installed at all is an error.
    /// - one version: removing it (it is necessarily the default)
    ///   retires the whole extension; naming any other version is an
    ///   error.
    pub fn uninstall_extension_version(&mut self, name: &str, version: &str) -> Result<()> {
        let default_version = match self.controls.get(name) {
            Some(control) => control.default_version.clone(),
            None => {
                return Err(RegistryError::ExtensionNotFound {
                    name: name.to_string(),
                })
            }
        };

        match self.version_cardinality(name) {
            VersionCardinality::NoVersions => Err(RegistryError::VersionNotFound {
                name: name.to_string(),
                version: version.to_string(),
            }),

            VersionCardinality::SingleVersion => {
                if version != default_version {
                    return Err(RegistryError::VersionNotFound {
                        name: name.to_string(),
                        version: version.to_string(),
                    });
                }

                // The sole version goes, and the extension with it
                self.versions.remove(name);
                self.update_paths.remove(name);
                self.controls.remove(name);
                info!("Uninstalled extension {} with its last version {}", name, version);
                Ok(())
            }

            VersionCardinality::MultiVersion => {
                if version == default_version {
                    return Err(RegistryError::DefaultVersionInUse {
                        name: name.to_string(),
                        version: version.to_string(),
                    });
                }

                let removed = self
                    .versions
                    .get_mut(name)
                    .map(|versions| versions.remove(version).is_some())
                    .unwrap_or(false);
                if !removed {
                    return Err(RegistryError::VersionNotFound {
                        name: name.to_string(),
                        version: version.to_string(),
                    });
                }

                debug!("Uninstalled version {} of extension {}", version, name);
                Ok(())
            }
        }
    }

    /// Remove a single version, tolerating its absence.
    ///
    /// Only missing-object conditions are softened; refusing to remove
    /// the in-use default still fails.
    pub fn uninstall_extension_version_if_exists(
        &mut self,
        name: &str,
        version: &str,
    ) -> Result<bool> {
        match self.uninstall_extension_version(name, version) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod lifecycle_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn two_version_catalog() -> CatalogStore {
        let mut catalog = CatalogStore::new();
        catalog
            .install_extension("demo", "1.0", "demo extension", "SELECT 1;", &[])
            .unwrap();
        catalog
            .install_extension_version("demo", "2.0", "SELECT 2;")
            .unwrap();
        catalog
    }

    #[test]
    fn test_cardinality_classification() {
        assert_eq!(VersionCardinality::of(0), VersionCardinality::NoVersions);
        assert_eq!(VersionCardinality::of(1), VersionCardinality::SingleVersion);
        assert_eq!(VersionCardinality::of(2), VersionCardinality::MultiVersion);
        assert_eq!(VersionCardinality::of(7), VersionCardinality::MultiVersion);
    }

    #[test]
    fn test_uninstall_whole_extension() {
        let mut catalog = two_version_catalog();
        catalog
            .install_update_path("demo", "1.0", "2.0", "SELECT 1;")
            .unwrap();

        catalog.uninstall_extension("demo").unwrap();
        assert!(catalog.control("demo").is_none());
        assert_eq!(catalog.version_count("demo"), 0);
        assert_eq!(catalog.list_update_paths("demo").count(), 0);

        let err = catalog.uninstall_extension("demo").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_default_with_siblings_is_refused() {
        let mut catalog = two_version_catalog();
        let err = catalog
            .uninstall_extension_version("demo", "1.0")
            .unwrap_err();
        assert!(matches!(err, RegistryError::DefaultVersionInUse { .. }));

        // Refusal leaves both versions in place
        assert_eq!(catalog.version_count("demo"), 2);
    }

    #[test]
    fn test_non_default_sibling_is_removed_alone() {
        let mut catalog = two_version_catalog();
        catalog.uninstall_extension_version("demo", "2.0").unwrap();

        assert_eq!(catalog.version_count("demo"), 1);
        assert!(catalog.has_version("demo", "1.0"));
        assert_eq!(catalog.control("demo").unwrap().default_version, "1.0");
    }

    #[test]
    fn test_missing_sibling_is_not_found() {
        let mut catalog = two_version_catalog();
        let err = catalog
            .uninstall_extension_version("demo", "9.9")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
        assert_eq!(catalog.version_count("demo"), 2);
    }

    #[test]
    fn test_sole_version_removal_retires_extension() {
        let mut catalog = CatalogStore::new();
        catalog
            .install_extension("demo", "1.0", "demo extension", "SELECT 1;", &[])
            .unwrap();

        catalog.uninstall_extension_version("demo", "1.0").unwrap();
        assert!(catalog.control("demo").is_none());
        assert_eq!(catalog.extension_count(), 0);
    }

    #[test]
    fn test_sole_version_mismatch_is_not_found() {
        let mut catalog = CatalogStore::new();
        catalog
            .install_extension("demo", "1.0", "demo extension", "SELECT 1;", &[])
            .unwrap();

        let err = catalog
            .uninstall_extension_version("demo", "2.0")
            .unwrap_err();
        assert!(matches!(err, RegistryError::VersionNotFound { .. }));
        assert!(catalog.has_version("demo", "1.0"));
    }

    #[test]
    fn test_if_exists_softens_only_not_found() {
        let mut catalog = two_version_catalog();

        assert!(!catalog
            .uninstall_extension_version_if_exists("demo", "9.9")
            .unwrap());
        assert!(!catalog.uninstall_extension_if_exists("ghost").unwrap());

        // PolicyViolation still propagates through the soft wrapper
        let err = catalog
            .uninstall_extension_version_if_exists("demo", "1.0")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PolicyViolation);

        assert!(catalog
            .uninstall_extension_version_if_exists("demo", "2.0")
            .unwrap());
        assert!(catalog.uninstall_extension_if_exists("demo").unwrap());
    }
}
