//! extcat - administration of the embedded extension catalog
//!
//! Operates on a snapshot directory holding the catalog, the feature
//! registry, and the function directory the feature commands resolve
//! against — the same files a host engine reads and writes in place.

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod catalog_cli;
mod feature_cli;

use catalog_cli::Store;

/// Log levels
#[derive(Debug, Clone, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    fn to_filter_directive(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

#[derive(Parser, Debug)]
#[clap(
    name = "extcat",
    about = "Extension catalog administration for embedded SQL engines",
    version
)]
struct Cli {
    #[clap(subcommand)]
    command: Command,

    /// Snapshot directory holding catalog and registry state
    #[clap(long, global = true, default_value = ".extcat")]
    store: PathBuf,

    /// Log level for diagnostic output (stderr)
    #[clap(long, global = true, value_enum, default_value = "warn")]
    log_level: LogLevel,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Install a new extension (the first version becomes the default)
    Install {
        /// Extension name
        name: String,

        /// Version to install
        version: String,

        /// Description recorded in the control entry
        #[clap(long, default_value = "")]
        comment: String,

        /// Inline install script
        #[clap(long)]
        payload: Option<String>,

        /// Read the install script from a file
        #[clap(long)]
        payload_file: Option<PathBuf>,

        /// Extensions this one requires (repeatable)
        #[clap(long)]
        requires: Vec<String>,
    },

    /// Add a version to an installed extension (default untouched)
    InstallVersion {
        /// Extension name
        name: String,

        /// Version to add
        version: String,

        /// Inline install script
        #[clap(long)]
        payload: Option<String>,

        /// Read the install script from a file
        #[clap(long)]
        payload_file: Option<PathBuf>,
    },

    /// Stage an update path between two versions
    InstallUpdatePath {
        /// Extension name
        name: String,

        /// Source version
        from: String,

        /// Target version
        to: String,

        /// Inline migration script
        #[clap(long)]
        payload: Option<String>,

        /// Read the migration script from a file
        #[clap(long)]
        payload_file: Option<PathBuf>,
    },

    /// Repoint the default version
    SetDefaultVersion {
        /// Extension name
        name: String,

        /// Version dependents should resolve to
        version: String,
    },

    /// Uninstall an extension, or a single version of it
    Uninstall {
        /// Extension name
        name: String,

        /// Remove only this version (cardinality rules apply)
        #[clap(long)]
        version: Option<String>,

        /// Report absence instead of failing
        #[clap(long)]
        if_exists: bool,
    },

    /// Remove a staged update path
    UninstallUpdatePath {
        /// Extension name
        name: String,

        /// Source version
        from: String,

        /// Target version
        to: String,

        /// Report absence instead of failing
        #[clap(long)]
        if_exists: bool,
    },

    /// List installed extensions
    List {
        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// List every installed version with its control columns
    ListVersions {
        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// List the update paths staged for an extension
    ListUpdatePaths {
        /// Extension name
        name: String,

        /// Output as JSON
        #[clap(long)]
        json: bool,
    },

    /// Manage feature registrations
    Feature {
        #[clap(subcommand)]
        command: feature_cli::FeatureSubcommand,
    },

    /// Manage the function directory (and exercise the drop guard)
    Function {
        #[clap(subcommand)]
        command: feature_cli::FunctionSubcommand,
    },
}

/// Initialize tracing with CLI flags.
///
/// RUST_LOG wins over --log-level when set. Diagnostics go to stderr so
/// command output stays parseable.
fn initialize_tracing(log_level: &LogLevel) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_filter_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    initialize_tracing(&cli.log_level);

    tracing::debug!("Using snapshot directory {}", cli.store.display());
    let store = Store::new(cli.store.clone());

    match cli.command {
        Command::Install {
            name,
            version,
            comment,
            payload,
            payload_file,
            requires,
        } => {
            let payload = catalog_cli::read_payload(payload, payload_file)?;
            catalog_cli::execute_install(&store, &name, &version, &comment, &payload, &requires)
        }
        Command::InstallVersion {
            name,
            version,
            payload,
            payload_file,
        } => {
            let payload = catalog_cli::read_payload(payload, payload_file)?;
            catalog_cli::execute_install_version(&store, &name, &version, &payload)
        }
        Command::InstallUpdatePath {
            name,
            from,
            to,
            payload,
            payload_file,
        } => {
            let payload = catalog_cli::read_payload(payload, payload_file)?;
            catalog_cli::execute_install_update_path(&store, &name, &from, &to, &payload)
        }
        Command::SetDefaultVersion { name, version } => {
            catalog_cli::execute_set_default_version(&store, &name, &version)
        }
        Command::Uninstall {
            name,
            version,
            if_exists,
        } => catalog_cli::execute_uninstall(&store, &name, version.as_deref(), if_exists),
        Command::UninstallUpdatePath {
            name,
            from,
            to,
            if_exists,
        } => catalog_cli::execute_uninstall_update_path(&store, &name, &from, &to, if_exists),
        Command::List { json } => catalog_cli::execute_list(&store, json),
        Command::ListVersions { json } => catalog_cli::execute_list_versions(&store, json),
        Command::ListUpdatePaths { name, json } => {
            catalog_cli::execute_list_update_paths(&store, &name, json)
        }
        Command::Feature { command } => feature_cli::execute_feature_command(&store, command),
        Command::Function { command } => feature_cli::execute_function_command(&store, command),
    }
}
