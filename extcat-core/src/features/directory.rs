//! Function directory service interface
//!
//! The registry resolves function references through this read-only
//! lookup. The host engine supplies the real implementation backed by its
//! own function and namespace catalogs; [`StaticDirectory`] is the
//! in-memory stand-in used by tests and the administrative CLI.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, Result};

/// Stable, engine-assigned handle identifying a specific function
/// signature.
///
/// Identities remain valid for the function's lifetime; the drop guard
/// matches registrations against them.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct FunctionIdentity(pub u64);

impl fmt::Display for FunctionIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A caller-supplied reference to a function, optionally schema-qualified
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRef {
    pub schema: Option<String>,
    pub name: String,
}

impl FunctionRef {
    /// Unqualified reference, resolved in the directory's default schema
    pub fn new(name: &str) -> Self {
        Self {
            schema: None,
            name: name.to_string(),
        }
    }

    /// Schema-qualified reference
    pub fn with_schema(schema: &str, name: &str) -> Self {
        Self {
            schema: Some(schema.to_string()),
            name: name.to_string(),
        }
    }

    /// The reference as the caller wrote it
    pub fn qualified(&self) -> String {
        match &self.schema {
            Some(schema) => format!("{}.{}", schema, self.name),
            None => self.name.clone(),
        }
    }
}

impl fmt::Display for FunctionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified())
    }
}

impl FromStr for FunctionRef {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("function reference is required".to_string());
        }

        let mut parts = s.split('.');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(name), None, None) => Ok(FunctionRef::new(name)),
            (Some(schema), Some(name), None) if !schema.is_empty() && !name.is_empty() => {
                Ok(FunctionRef::with_schema(schema, name))
            }
            _ => Err(format!(
                "invalid function reference '{s}' (expected 'function' or 'schema.function')"
            )),
        }
    }
}

/// A resolved function: schema, name, and durable identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionRecord {
    pub schema: String,
    pub name: String,
    pub identity: FunctionIdentity,
}

impl FunctionRecord {
    /// Fully qualified `schema.name`
    pub fn qualified(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }
}

/// Read-only lookup of functions by name and namespace.
///
/// Unqualified references resolve in the directory's default schema.
pub trait FunctionDirectory {
    /// Resolve a reference to a concrete function record
    fn resolve(&self, func: &FunctionRef) -> Result<FunctionRecord>;
}

/// In-memory directory used by tests and the administrative CLI.
///
/// Identities are assigned once per (schema, name) and never reused, so
/// registrations recorded against them stay stable across snapshots.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StaticDirectory {
    default_schema: String,
    /// schema → name → identity
    functions: BTreeMap<String, BTreeMap<String, FunctionIdentity>>,
    next_identity: u64,
}

impl Default for StaticDirectory {
    fn default() -> Self {
        Self {
            default_schema: "public".to_string(),
            functions: BTreeMap::new(),
            next_identity: 16384,
        }
    }
}

impl StaticDirectory {
    /// Create an empty directory with the `public` default schema
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty directory with a custom default schema
    pub fn with_default_schema(schema: &str) -> Self {
        Self {
            default_schema: schema.to_string(),
            ..Self::default()
        }
    }

    /// Schema unqualified references resolve in
    pub fn default_schema(&self) -> &str {
        &self.default_schema
    }

    /// Add a function, returning its identity.
    ///
    /// Adding an existing function returns the identity it already has.
    pub fn add_function(&mut self, schema: &str, name: &str) -> FunctionIdentity {
        let names = self.functions.entry(schema.to_string()).or_default();
        if let Some(identity) = names.get(name) {
            return *identity;
        }

        let identity = FunctionIdentity(self.next_identity);
        self.next_identity += 1;
        names.insert(name.to_string(), identity);
        identity
    }

    /// Remove a function, returning its identity if it existed
    pub fn remove_function(&mut self, schema: &str, name: &str) -> Option<FunctionIdentity> {
        let removed = self.functions.get_mut(schema)?.remove(name);

        if self
            .functions
            .get(schema)
            .map(BTreeMap::is_empty)
            .unwrap_or(false)
        {
            self.functions.remove(schema);
        }

        removed
    }

    /// Check if a function exists
    pub fn contains(&self, schema: &str, name: &str) -> bool {
        self.functions
            .get(schema)
            .map(|names| names.contains_key(name))
            .unwrap_or(false)
    }

    /// List every function as a resolved record
    pub fn functions(&self) -> impl Iterator<Item = FunctionRecord> + '_ {
        self.functions.iter().flat_map(|(schema, names)| {
            names.iter().map(move |(name, identity)| FunctionRecord {
                schema: schema.clone(),
                name: name.clone(),
                identity: *identity,
            })
        })
    }
}

impl FunctionDirectory for StaticDirectory {
    fn resolve(&self, func: &FunctionRef) -> Result<FunctionRecord> {
        let schema = func.schema.as_deref().unwrap_or(&self.default_schema);

        self.functions
            .get(schema)
            .and_then(|names| names.get(&func.name))
            .map(|identity| FunctionRecord {
                schema: schema.to_string(),
                name: func.name.clone(),
                identity: *identity,
            })
            .ok_or_else(|| RegistryError::FunctionNotFound {
                function: func.qualified(),
            })
    }
}

#[cfg(test)]
mod directory_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_function_ref() {
        let unqualified: FunctionRef = "check_password".parse().unwrap();
        assert_eq!(unqualified, FunctionRef::new("check_password"));

        let qualified: FunctionRef = "auth.check_password".parse().unwrap();
        assert_eq!(qualified, FunctionRef::with_schema("auth", "check_password"));
        assert_eq!(qualified.qualified(), "auth.check_password");

        for bad in ["", ".", "a.b.c", "a.", ".b"] {
            assert!(bad.parse::<FunctionRef>().is_err(), "ref {bad:?}");
        }
    }

    #[test]
    fn test_resolve_uses_default_schema() {
        let mut directory = StaticDirectory::new();
        let identity = directory.add_function("public", "check_password");

        let record = directory.resolve(&FunctionRef::new("check_password")).unwrap();
        assert_eq!(record.schema, "public");
        assert_eq!(record.identity, identity);

        let record = directory
            .resolve(&FunctionRef::with_schema("public", "check_password"))
            .unwrap();
        assert_eq!(record.identity, identity);
    }

    #[test]
    fn test_resolve_missing_function() {
        let directory = StaticDirectory::new();
        let err = directory.resolve(&FunctionRef::new("ghost")).unwrap_err();
        assert!(err.is_not_found());
        assert!(err.to_string().contains("ghost"));
    }

    #[test]
    fn test_identities_are_never_reused() {
        let mut directory = StaticDirectory::new();
        let first = directory.add_function("public", "f");
        directory.remove_function("public", "f");
        let second = directory.add_function("public", "f");
        assert_ne!(first, second);
    }

    #[test]
    fn test_add_is_idempotent() {
        let mut directory = StaticDirectory::new();
        let first = directory.add_function("public", "f");
        let again = directory.add_function("public", "f");
        assert_eq!(first, again);
        assert_eq!(directory.functions().count(), 1);
    }
}
