//! End-to-end catalog lifecycle coverage

use extcat_core::catalog::{CatalogStore, ExtensionSummary};
use extcat_core::error::{ErrorKind, RegistryError};
use pretty_assertions::assert_eq;

/// The full administrative walk: install, conflict, add a version,
/// repoint the default, retire versions one by one.
#[test]
fn test_demo_extension_walkthrough() {
    let mut catalog = CatalogStore::new();

    // install("demo", "1.0") succeeds and sets the default
    catalog
        .install_extension("demo", "1.0", "desc", "body", &[])
        .unwrap();
    assert_eq!(catalog.control("demo").unwrap().default_version, "1.0");

    // a second install of the same version conflicts
    let err = catalog
        .install_extension("demo", "1.0", "desc", "body", &[])
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    // adding 2.0 leaves the default alone; repointing moves it
    catalog
        .install_extension_version("demo", "2.0", "body2")
        .unwrap();
    assert_eq!(catalog.control("demo").unwrap().default_version, "1.0");
    catalog.set_default_version("demo", "2.0").unwrap();

    // 1.0 is now a non-default sibling: removed alone
    catalog.uninstall_extension_version("demo", "1.0").unwrap();
    assert_eq!(catalog.version_count("demo"), 1);
    assert!(catalog.control("demo").is_some());

    // 2.0 is the default but also the sole version: full removal
    catalog.uninstall_extension_version("demo", "2.0").unwrap();
    let names: Vec<ExtensionSummary> = catalog.list_extensions().collect();
    assert!(names.is_empty());
}

#[test]
fn test_install_version_before_install_is_not_found() {
    let mut catalog = CatalogStore::new();
    let err = catalog
        .install_extension_version("demo", "1.0", "body")
        .unwrap_err();
    assert!(matches!(err, RegistryError::ExtensionNotFound { .. }));
}

#[test]
fn test_removing_default_with_siblings_requires_repointing() {
    let mut catalog = CatalogStore::new();
    catalog
        .install_extension("demo", "1.0", "desc", "body", &[])
        .unwrap();
    catalog
        .install_extension_version("demo", "2.0", "body2")
        .unwrap();

    let err = catalog
        .uninstall_extension_version("demo", "1.0")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PolicyViolation);

    // Repointing the default unblocks the removal
    catalog.set_default_version("demo", "2.0").unwrap();
    catalog.uninstall_extension_version("demo", "1.0").unwrap();
    assert!(catalog.has_version("demo", "2.0"));
    assert!(!catalog.has_version("demo", "1.0"));
}

#[test]
fn test_sole_version_mismatch_errors_and_if_exists_softens() {
    let mut catalog = CatalogStore::new();
    catalog
        .install_extension("demo", "1.0", "desc", "body", &[])
        .unwrap();

    let err = catalog
        .uninstall_extension_version("demo", "3.0")
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    assert!(!catalog
        .uninstall_extension_version_if_exists("demo", "3.0")
        .unwrap());

    // Neither attempt altered state
    assert!(catalog.has_version("demo", "1.0"));
    assert_eq!(catalog.control("demo").unwrap().default_version, "1.0");
}

#[test]
fn test_whole_uninstall_ignores_cardinality() {
    let mut catalog = CatalogStore::new();
    catalog
        .install_extension("demo", "1.0", "desc", "body", &[])
        .unwrap();
    catalog
        .install_extension_version("demo", "2.0", "body2")
        .unwrap();
    catalog
        .install_extension_version("demo", "3.0", "body3")
        .unwrap();
    catalog
        .install_update_path("demo", "1.0", "2.0", "upgrade")
        .unwrap();

    catalog.uninstall_extension("demo").unwrap();
    assert_eq!(catalog.extension_count(), 0);
    assert_eq!(catalog.list_update_paths("demo").count(), 0);
}

#[test]
fn test_uninstall_if_exists_reports_absence() {
    let mut catalog = CatalogStore::new();
    assert!(!catalog.uninstall_extension_if_exists("demo").unwrap());

    catalog
        .install_extension("demo", "1.0", "desc", "body", &[])
        .unwrap();
    assert!(catalog.uninstall_extension_if_exists("demo").unwrap());
    assert!(!catalog.uninstall_extension_if_exists("demo").unwrap());
}
