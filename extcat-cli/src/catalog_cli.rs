//! Catalog CLI commands
//!
//! Install, uninstall, and listing commands over the snapshot directory,
//! plus the [`Store`] handle the feature commands share.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use extcat_core::catalog::{CatalogStore, ExtensionSummary, ExtensionVersionRow, UpdatePathRow};
use extcat_core::features::{FeatureRegistry, StaticDirectory};

/// Handle on the snapshot directory
pub struct Store {
    dir: PathBuf,
}

impl Store {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn catalog_path(&self) -> PathBuf {
        self.dir.join("catalog.yaml")
    }

    fn features_path(&self) -> PathBuf {
        self.dir.join("features.yaml")
    }

    fn functions_path(&self) -> PathBuf {
        self.dir.join("functions.yaml")
    }

    pub fn load_catalog(&self) -> Result<CatalogStore> {
        CatalogStore::load_from_path(&self.catalog_path())
    }

    pub fn save_catalog(&self, catalog: &CatalogStore) -> Result<()> {
        catalog.save_to_path(&self.catalog_path())
    }

    pub fn load_registry(&self) -> Result<FeatureRegistry> {
        FeatureRegistry::load_from_path(&self.features_path())
    }

    pub fn save_registry(&self, registry: &FeatureRegistry) -> Result<()> {
        registry.save_to_path(&self.features_path())
    }

    pub fn load_directory(&self) -> Result<StaticDirectory> {
        let path = self.functions_path();
        if !path.exists() {
            return Ok(StaticDirectory::new());
        }

        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read function directory: {}", path.display()))?;

        serde_yaml_ng::from_str(&content)
            .with_context(|| format!("Failed to parse function directory: {}", path.display()))
    }

    pub fn save_directory(&self, directory: &StaticDirectory) -> Result<()> {
        let path = self.functions_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_yaml_ng::to_string(directory)
            .context("Failed to serialize function directory")?;

        std::fs::write(&path, content)
            .with_context(|| format!("Failed to write function directory: {}", path.display()))?;

        Ok(())
    }
}

/// Resolve the payload argument pair to the script body
pub fn read_payload(payload: Option<String>, payload_file: Option<PathBuf>) -> Result<String> {
    match (payload, payload_file) {
        (Some(inline), None) => Ok(inline),
        (None, Some(path)) => std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read payload file: {}", path.display())),
        (Some(_), Some(_)) => anyhow::bail!("--payload and --payload-file are mutually exclusive"),
        (None, None) => anyhow::bail!("provide the script via --payload or --payload-file"),
    }
}

pub fn execute_install(
    store: &Store,
    name: &str,
    version: &str,
    comment: &str,
    payload: &str,
    requires: &[String],
) -> Result<()> {
    let mut catalog = store.load_catalog()?;
    catalog.install_extension(name, version, comment, payload, requires)?;
    store.save_catalog(&catalog)?;

    println!("Installed {name} v{version}");
    Ok(())
}

pub fn execute_install_version(
    store: &Store,
    name: &str,
    version: &str,
    payload: &str,
) -> Result<()> {
    let mut catalog = store.load_catalog()?;
    catalog.install_extension_version(name, version, payload)?;
    store.save_catalog(&catalog)?;

    println!("Installed {name} v{version}");
    Ok(())
}

pub fn execute_install_update_path(
    store: &Store,
    name: &str,
    from: &str,
    to: &str,
    payload: &str,
) -> Result<()> {
    let mut catalog = store.load_catalog()?;
    catalog.install_update_path(name, from, to, payload)?;
    store.save_catalog(&catalog)?;

    println!("Installed update path {from}--{to} for {name}");
    Ok(())
}

pub fn execute_set_default_version(store: &Store, name: &str, version: &str) -> Result<()> {
    let mut catalog = store.load_catalog()?;
    catalog.set_default_version(name, version)?;
    store.save_catalog(&catalog)?;

    println!("Default version of {name} is now {version}");
    Ok(())
}

pub fn execute_uninstall(
    store: &Store,
    name: &str,
    version: Option<&str>,
    if_exists: bool,
) -> Result<()> {
    let mut catalog = store.load_catalog()?;

    match version {
        Some(version) => {
            if if_exists {
                if catalog.uninstall_extension_version_if_exists(name, version)? {
                    println!("Uninstalled {name} v{version}");
                } else {
                    println!("Version {version} of {name} is not installed, skipping");
                }
            } else {
                catalog.uninstall_extension_version(name, version)?;
                println!("Uninstalled {name} v{version}");
            }
        }
        None => {
            if if_exists {
                if catalog.uninstall_extension_if_exists(name)? {
                    println!("Uninstalled {name}");
                } else {
                    println!("Extension {name} is not installed, skipping");
                }
            } else {
                catalog.uninstall_extension(name)?;
                println!("Uninstalled {name}");
            }
        }
    }

    store.save_catalog(&catalog)
}

pub fn execute_uninstall_update_path(
    store: &Store,
    name: &str,
    from: &str,
    to: &str,
    if_exists: bool,
) -> Result<()> {
    let mut catalog = store.load_catalog()?;

    if if_exists {
        if catalog.uninstall_update_path_if_exists(name, from, to)? {
            println!("Removed update path {from}--{to} for {name}");
        } else {
            println!("Update path {from}--{to} for {name} does not exist, skipping");
        }
    } else {
        catalog.uninstall_update_path(name, from, to)?;
        println!("Removed update path {from}--{to} for {name}");
    }

    store.save_catalog(&catalog)
}

/// Table row for the extension listing
#[derive(Tabled)]
struct ExtensionTableRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Default")]
    default_version: String,
    #[tabled(rename = "Comment")]
    comment: String,
}

pub fn execute_list(store: &Store, json_output: bool) -> Result<()> {
    let catalog = store.load_catalog()?;
    let summaries: Vec<ExtensionSummary> = catalog.list_extensions().collect();

    if summaries.is_empty() {
        println!("No extensions installed.");
        return Ok(());
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&summaries)?);
        return Ok(());
    }

    let table_rows: Vec<ExtensionTableRow> = summaries
        .into_iter()
        .map(|summary| ExtensionTableRow {
            name: summary.name,
            default_version: summary.default_version,
            comment: summary.comment,
        })
        .collect();

    let table = Table::new(&table_rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string();

    println!("{table}");
    Ok(())
}

/// Table row for the version listing
#[derive(Tabled)]
struct VersionTableRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Version")]
    version: String,
    #[tabled(rename = "Superuser")]
    superuser: bool,
    #[tabled(rename = "Trusted")]
    trusted: bool,
    #[tabled(rename = "Relocatable")]
    relocatable: bool,
    #[tabled(rename = "Schema")]
    schema: String,
    #[tabled(rename = "Requires")]
    requires: String,
    #[tabled(rename = "Comment")]
    comment: String,
}

pub fn execute_list_versions(store: &Store, json_output: bool) -> Result<()> {
    let catalog = store.load_catalog()?;
    let rows: Vec<ExtensionVersionRow> = catalog.list_extension_versions().collect();

    if rows.is_empty() {
        println!("No extensions installed.");
        return Ok(());
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let table_rows: Vec<VersionTableRow> = rows
        .into_iter()
        .map(|row| VersionTableRow {
            name: row.name,
            version: row.version,
            superuser: row.superuser,
            trusted: row.trusted,
            relocatable: row.relocatable,
            schema: row.schema.unwrap_or_else(|| "-".to_string()),
            requires: row.requires.join(", "),
            comment: row.comment,
        })
        .collect();

    let table = Table::new(&table_rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string();

    println!("{table}");
    Ok(())
}

/// Table row for the update-path listing
#[derive(Tabled)]
struct PathTableRow {
    #[tabled(rename = "From")]
    from: String,
    #[tabled(rename = "To")]
    to: String,
    #[tabled(rename = "Path")]
    path: String,
}

pub fn execute_list_update_paths(store: &Store, name: &str, json_output: bool) -> Result<()> {
    let catalog = store.load_catalog()?;
    let rows: Vec<UpdatePathRow> = catalog.list_update_paths(name).collect();

    if rows.is_empty() {
        println!("No update paths staged for {name}.");
        return Ok(());
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let table_rows: Vec<PathTableRow> = rows
        .into_iter()
        .map(|row| PathTableRow {
            from: row.from,
            to: row.to,
            path: row.path,
        })
        .collect();

    let table = Table::new(&table_rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string();

    println!("{table}");
    Ok(())
}
