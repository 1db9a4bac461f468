//! Feature registry and function directory CLI commands
//!
//! `feature` subcommands manage registrations; `function` subcommands
//! maintain the in-store function directory and route drops through the
//! guard exactly as a host engine would.

use anyhow::Result;
use clap::Subcommand;
use tabled::{
    settings::{object::Rows, Alignment, Modify, Style},
    Table, Tabled,
};

use extcat_core::features::{
    before_function_drop, DropContext, Feature, FunctionDirectory, FunctionRef,
};

use crate::catalog_cli::Store;

#[derive(Subcommand, Debug)]
pub enum FeatureSubcommand {
    /// Register a function for a feature hook
    Register {
        /// Function reference ('function' or 'schema.function')
        function: FunctionRef,

        /// Feature hook (password_check, client_auth)
        feature: Feature,

        /// Report an existing registration instead of failing
        #[clap(long)]
        if_not_exists: bool,
    },

    /// Remove a feature registration
    Unregister {
        /// Function reference ('function' or 'schema.function')
        function: FunctionRef,

        /// Feature hook (password_check, client_auth)
        feature: Feature,

        /// Report absence instead of failing
        #[clap(long)]
        if_exists: bool,
    },

    /// List feature registrations
    List {
        /// Output as JSON
        #[clap(long)]
        json: bool,
    },
}

#[derive(Subcommand, Debug)]
pub enum FunctionSubcommand {
    /// Add a function to the directory
    Add {
        /// Function reference ('function' or 'schema.function')
        function: FunctionRef,
    },

    /// Drop a function, routed through the drop guard
    Drop {
        /// Function reference ('function' or 'schema.function')
        function: FunctionRef,

        /// Treat the drop as part of whole-extension removal (cascades
        /// registrations instead of refusing)
        #[clap(long)]
        with_extension: bool,
    },

    /// List directory functions
    List {
        /// Output as JSON
        #[clap(long)]
        json: bool,
    },
}

pub fn execute_feature_command(store: &Store, command: FeatureSubcommand) -> Result<()> {
    match command {
        FeatureSubcommand::Register {
            function,
            feature,
            if_not_exists,
        } => execute_register(store, &function, feature, if_not_exists),
        FeatureSubcommand::Unregister {
            function,
            feature,
            if_exists,
        } => execute_unregister(store, &function, feature, if_exists),
        FeatureSubcommand::List { json } => execute_feature_list(store, json),
    }
}

pub fn execute_function_command(store: &Store, command: FunctionSubcommand) -> Result<()> {
    match command {
        FunctionSubcommand::Add { function } => execute_function_add(store, &function),
        FunctionSubcommand::Drop {
            function,
            with_extension,
        } => execute_function_drop(store, &function, with_extension),
        FunctionSubcommand::List { json } => execute_function_list(store, json),
    }
}

fn execute_register(
    store: &Store,
    function: &FunctionRef,
    feature: Feature,
    if_not_exists: bool,
) -> Result<()> {
    let directory = store.load_directory()?;
    let mut registry = store.load_registry()?;

    if if_not_exists {
        if registry.register_if_not_exists(&directory, function, feature)? {
            println!("Registered {function} for {feature}");
        } else {
            println!("{function} is already registered for {feature}, skipping");
        }
    } else {
        registry.register(&directory, function, feature)?;
        println!("Registered {function} for {feature}");
    }

    store.save_registry(&registry)
}

fn execute_unregister(
    store: &Store,
    function: &FunctionRef,
    feature: Feature,
    if_exists: bool,
) -> Result<()> {
    let directory = store.load_directory()?;
    let mut registry = store.load_registry()?;

    if if_exists {
        if registry.unregister_if_exists(&directory, function, feature)? {
            println!("Unregistered {function} from {feature}");
        } else {
            println!("{function} is not registered for {feature}, skipping");
        }
    } else {
        registry.unregister(&directory, function, feature)?;
        println!("Unregistered {function} from {feature}");
    }

    store.save_registry(&registry)
}

/// Table row for the registration listing
#[derive(Tabled)]
struct RegistrationTableRow {
    #[tabled(rename = "Feature")]
    feature: String,
    #[tabled(rename = "Schema")]
    schema: String,
    #[tabled(rename = "Function")]
    function: String,
    #[tabled(rename = "Identity")]
    identity: String,
}

fn execute_feature_list(store: &Store, json_output: bool) -> Result<()> {
    let registry = store.load_registry()?;

    if registry.is_empty() {
        println!("No feature registrations.");
        return Ok(());
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(registry.registrations())?);
        return Ok(());
    }

    let table_rows: Vec<RegistrationTableRow> = registry
        .registrations()
        .iter()
        .map(|row| RegistrationTableRow {
            feature: row.feature.to_string(),
            schema: row.schema.clone(),
            function: row.function.clone(),
            identity: row.identity.to_string(),
        })
        .collect();

    let table = Table::new(&table_rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string();

    println!("{table}");
    Ok(())
}

fn execute_function_add(store: &Store, function: &FunctionRef) -> Result<()> {
    let mut directory = store.load_directory()?;

    let schema = function
        .schema
        .clone()
        .unwrap_or_else(|| directory.default_schema().to_string());
    let identity = directory.add_function(&schema, &function.name);
    store.save_directory(&directory)?;

    println!("Added function {schema}.{} (identity {identity})", function.name);
    Ok(())
}

fn execute_function_drop(store: &Store, function: &FunctionRef, with_extension: bool) -> Result<()> {
    let mut directory = store.load_directory()?;
    let mut registry = store.load_registry()?;

    let record = directory.resolve(function)?;
    let context = if with_extension {
        DropContext::ExtensionTeardown
    } else {
        DropContext::Standalone
    };

    before_function_drop(&mut registry, record.identity, &record.qualified(), context)?;
    directory.remove_function(&record.schema, &record.name);

    store.save_registry(&registry)?;
    store.save_directory(&directory)?;

    println!("Dropped function {}", record.qualified());
    Ok(())
}

/// Table row for the function listing
#[derive(Tabled)]
struct FunctionTableRow {
    #[tabled(rename = "Schema")]
    schema: String,
    #[tabled(rename = "Function")]
    function: String,
    #[tabled(rename = "Identity")]
    identity: String,
}

fn execute_function_list(store: &Store, json_output: bool) -> Result<()> {
    let directory = store.load_directory()?;
    let records: Vec<_> = directory.functions().collect();

    if records.is_empty() {
        println!("No functions in the directory.");
        return Ok(());
    }

    if json_output {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(());
    }

    let table_rows: Vec<FunctionTableRow> = records
        .into_iter()
        .map(|record| FunctionTableRow {
            schema: record.schema,
            function: record.name,
            identity: record.identity.to_string(),
        })
        .collect();

    let table = Table::new(&table_rows)
        .with(Style::rounded())
        .with(Modify::new(Rows::first()).with(Alignment::center()))
        .to_string();

    println!("{table}");
    Ok(())
}

#[cfg(test)]
mod feature_cli_tests {
    use super::*;
    use tempfile::TempDir;

    fn seeded_store(temp_dir: &TempDir) -> Store {
        let store = Store::new(temp_dir.path().join("state"));

        let mut directory = store.load_directory().unwrap();
        directory.add_function("auth", "check_password");
        store.save_directory(&directory).unwrap();

        store
    }

    #[test]
    fn test_register_and_drop_flow() {
        let temp_dir = TempDir::new().unwrap();
        let store = seeded_store(&temp_dir);
        let func = FunctionRef::with_schema("auth", "check_password");

        execute_register(&store, &func, Feature::PasswordCheck, false).unwrap();

        // A standalone drop is refused while the registration exists
        let err = execute_function_drop(&store, &func, false).unwrap_err();
        assert!(err.to_string().contains("feature registry"));
        assert!(store
            .load_directory()
            .unwrap()
            .contains("auth", "check_password"));

        // Teardown-context drop cascades the registration
        execute_function_drop(&store, &func, true).unwrap();
        assert!(store.load_registry().unwrap().is_empty());
        assert!(!store
            .load_directory()
            .unwrap()
            .contains("auth", "check_password"));
    }

    #[test]
    fn test_unregister_then_drop() {
        let temp_dir = TempDir::new().unwrap();
        let store = seeded_store(&temp_dir);
        let func = FunctionRef::with_schema("auth", "check_password");

        execute_register(&store, &func, Feature::PasswordCheck, false).unwrap();
        execute_unregister(&store, &func, Feature::PasswordCheck, false).unwrap();
        execute_function_drop(&store, &func, false).unwrap();

        assert!(!store
            .load_directory()
            .unwrap()
            .contains("auth", "check_password"));
    }
}
