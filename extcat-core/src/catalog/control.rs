//! Extension control metadata
//!
//! The per-extension control entry: comment, default version, requires,
//! and the control-file-equivalent flags the version listing derives its
//! columns from.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

/// Control metadata for one extension
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionControl {
    /// Human-readable description
    pub comment: String,

    /// Version resolved when callers reference the extension without one
    pub default_version: String,

    /// Extensions this one requires (recorded, not resolved)
    #[serde(default)]
    pub requires: BTreeSet<String>,

    /// Whether installing the extension requires superuser
    #[serde(default)]
    pub superuser: bool,

    /// Whether non-superusers holding the install capability may install it
    #[serde(default = "default_trusted")]
    pub trusted: bool,

    /// Whether the extension's objects can move between schemas
    #[serde(default)]
    pub relocatable: bool,

    /// Schema the extension's objects are pinned to, if any
    #[serde(default)]
    pub schema: Option<String>,
}

fn default_trusted() -> bool {
    true
}

impl ExtensionControl {
    /// Control entry for a freshly installed extension.
    ///
    /// Catalog-managed extensions install without superuser and run
    /// trusted; hosts may adjust the flags afterwards.
    pub fn new(comment: &str, default_version: &str, requires: BTreeSet<String>) -> Self {
        Self {
            comment: comment.to_string(),
            default_version: default_version.to_string(),
            requires,
            superuser: false,
            trusted: true,
            relocatable: false,
            schema: None,
        }
    }

    /// Whether caller-supplied install metadata matches this entry
    pub(crate) fn matches(&self, comment: &str, requires: &BTreeSet<String>) -> bool {
        self.comment == comment && self.requires == *requires
    }
}

/// Validate an extension name.
///
/// Names key the control table and appear in payload references, so the
/// accepted alphabet is deliberately narrow.
pub fn validate_extension_name(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(RegistryError::InvalidName {
            name: name.to_string(),
            reason: "name is required".to_string(),
        });
    }

    if !name
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '_')
    {
        return Err(RegistryError::InvalidName {
            name: name.to_string(),
            reason: "must be lowercase alphanumeric with hyphens or underscores".to_string(),
        });
    }

    if name.starts_with(['-', '_']) || name.ends_with(['-', '_']) {
        return Err(RegistryError::InvalidName {
            name: name.to_string(),
            reason: "cannot start or end with a separator".to_string(),
        });
    }

    Ok(())
}

/// Validate a version string.
///
/// `--` is the separator in update-path references, so versions must not
/// contain it.
pub fn validate_version(version: &str) -> Result<()> {
    if version.is_empty() {
        return Err(RegistryError::InvalidVersion {
            version: version.to_string(),
            reason: "version is required".to_string(),
        });
    }

    if version.contains("--") {
        return Err(RegistryError::InvalidVersion {
            version: version.to_string(),
            reason: "must not contain \"--\"".to_string(),
        });
    }

    if version.chars().any(char::is_whitespace) {
        return Err(RegistryError::InvalidVersion {
            version: version.to_string(),
            reason: "must not contain whitespace".to_string(),
        });
    }

    Ok(())
}

#[cfg(test)]
mod control_tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_new_control_defaults() {
        let control = ExtensionControl::new("demo extension", "1.0", BTreeSet::new());
        assert_eq!(control.default_version, "1.0");
        assert!(!control.superuser);
        assert!(control.trusted);
        assert!(!control.relocatable);
        assert!(control.schema.is_none());
    }

    #[test]
    fn test_metadata_match() {
        let requires: BTreeSet<String> = ["base".to_string()].into_iter().collect();
        let control = ExtensionControl::new("demo extension", "1.0", requires.clone());

        assert!(control.matches("demo extension", &requires));
        assert!(!control.matches("other comment", &requires));
        assert!(!control.matches("demo extension", &BTreeSet::new()));
    }

    #[test]
    fn test_valid_names() {
        assert!(validate_extension_name("demo").is_ok());
        assert!(validate_extension_name("pg_audit-lite2").is_ok());
    }

    #[test]
    fn test_invalid_names() {
        for name in ["", "Demo", "demo extension", "-demo", "demo_"] {
            let err = validate_extension_name(name).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "name {name:?}");
        }
    }

    #[test]
    fn test_version_rules() {
        assert!(validate_version("1.0").is_ok());
        assert!(validate_version("2.0beta1").is_ok());

        for version in ["", "1.0--2.0", "1 .0"] {
            let err = validate_version(version).unwrap_err();
            assert_eq!(err.kind(), ErrorKind::InvalidArgument, "version {version:?}");
        }
    }
}
