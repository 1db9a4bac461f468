//! Update-path graph operations
//!
//! Directed edges between versions of one extension, each carrying the
//! migration payload applied when upgrading along the edge. Edges form
//! their own table: operators may stage paths before the versions they
//! connect exist, and no acyclicity is enforced at this layer.

use tracing::{debug, info};

use super::control::{validate_extension_name, validate_version};
use super::store::{CatalogStore, UpdatePathEdge};
use crate::error::{ErrorKind, RegistryError, Result};

/// One row of [`CatalogStore::list_update_paths`]
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct UpdatePathRow {
    pub from: String,
    pub to: String,
    /// Stable `from--to` reference to the edge's payload
    pub path: String,
}

impl CatalogStore {
    /// Install a directed update path between two versions
    pub fn install_update_path(
        &mut self,
        name: &str,
        from: &str,
        to: &str,
        payload: &str,
    ) -> Result<()> {
        validate_extension_name(name)?;
        validate_version(from)?;
        validate_version(to)?;

        if from == to {
            return Err(RegistryError::InvalidVersion {
                version: to.to_string(),
                reason: "update path endpoints must differ".to_string(),
            });
        }

        let duplicate = self
            .update_paths
            .get(name)
            .map(|edges| edges.iter().any(|e| e.from == from && e.to == to))
            .unwrap_or(false);
        if duplicate {
            return Err(RegistryError::UpdatePathExists {
                name: name.to_string(),
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        self.update_paths
            .entry(name.to_string())
            .or_default()
            .push(UpdatePathEdge {
                from: from.to_string(),
                to: to.to_string(),
                payload: payload.to_string(),
                installed_at: chrono::Utc::now().to_rfc3339(),
            });

        info!("Installed update path {}--{} for {}", from, to, name);
        Ok(())
    }

    /// List the update paths staged for an extension.
    ///
    /// Lazy and snapshot-consistent within the borrow.
    pub fn list_update_paths<'a>(
        &'a self,
        name: &str,
    ) -> impl Iterator<Item = UpdatePathRow> + 'a {
        self.update_paths
            .get(name)
            .into_iter()
            .flatten()
            .map(|edge| UpdatePathRow {
                from: edge.from.clone(),
                to: edge.to.clone(),
                path: format!("{}--{}", edge.from, edge.to),
            })
    }

    /// Get the migration payload stored on an edge
    pub fn update_path_payload(&self, name: &str, from: &str, to: &str) -> Option<&str> {
        self.update_paths.get(name).and_then(|edges| {
            edges
                .iter()
                .find(|e| e.from == from && e.to == to)
                .map(|e| e.payload.as_str())
        })
    }

    /// Remove an update path
    pub fn uninstall_update_path(&mut self, name: &str, from: &str, to: &str) -> Result<()> {
        let removed = match self.update_paths.get_mut(name) {
            Some(edges) => {
                let before = edges.len();
                edges.retain(|e| !(e.from == from && e.to == to));
                before - edges.len()
            }
            None => 0,
        };

        if removed == 0 {
            return Err(RegistryError::UpdatePathNotFound {
                name: name.to_string(),
                from: from.to_string(),
                to: to.to_string(),
            });
        }

        // Drop the empty bucket so snapshots stay tidy
        if self
            .update_paths
            .get(name)
            .map(Vec::is_empty)
            .unwrap_or(false)
        {
            self.update_paths.remove(name);
        }

        debug!("Removed update path {}--{} for {}", from, to, name);
        Ok(())
    }

    /// Remove an update path, tolerating its absence
    pub fn uninstall_update_path_if_exists(
        &mut self,
        name: &str,
        from: &str,
        to: &str,
    ) -> Result<bool> {
        match self.uninstall_update_path(name, from, to) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(false),
            Err(err) => Err(err),
        }
    }
}

#[cfg(test)]
mod path_tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn catalog_with_path() -> CatalogStore {
        let mut catalog = CatalogStore::new();
        catalog
            .install_update_path("demo", "1.0", "2.0", "ALTER TABLE demo ADD COLUMN b int;")
            .unwrap();
        catalog
    }

    #[test]
    fn test_install_and_list() {
        let catalog = catalog_with_path();
        let rows: Vec<UpdatePathRow> = catalog.list_update_paths("demo").collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].from, "1.0");
        assert_eq!(rows[0].to, "2.0");
        assert_eq!(rows[0].path, "1.0--2.0");
        assert_eq!(
            catalog.update_path_payload("demo", "1.0", "2.0"),
            Some("ALTER TABLE demo ADD COLUMN b int;")
        );
    }

    #[test]
    fn test_duplicate_edge_conflicts() {
        let mut catalog = catalog_with_path();
        let err = catalog
            .install_update_path("demo", "1.0", "2.0", "SELECT 1;")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Conflict);
    }

    #[test]
    fn test_reverse_edge_is_distinct() {
        let mut catalog = catalog_with_path();
        catalog
            .install_update_path("demo", "2.0", "1.0", "ALTER TABLE demo DROP COLUMN b;")
            .unwrap();
        assert_eq!(catalog.list_update_paths("demo").count(), 2);
    }

    #[test]
    fn test_self_edge_is_invalid() {
        let mut catalog = CatalogStore::new();
        let err = catalog
            .install_update_path("demo", "1.0", "1.0", "SELECT 1;")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_uninstall() {
        let mut catalog = catalog_with_path();
        catalog.uninstall_update_path("demo", "1.0", "2.0").unwrap();
        assert_eq!(catalog.list_update_paths("demo").count(), 0);

        let err = catalog
            .uninstall_update_path("demo", "1.0", "2.0")
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_uninstall_if_exists() {
        let mut catalog = catalog_with_path();
        assert!(catalog
            .uninstall_update_path_if_exists("demo", "1.0", "2.0")
            .unwrap());
        assert!(!catalog
            .uninstall_update_path_if_exists("demo", "1.0", "2.0")
            .unwrap());
    }
}
