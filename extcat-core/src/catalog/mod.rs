//! Extension catalog - versioned extension storage and lifecycle
//!
//! Tracks installable extensions: per-name control metadata, per-version
//! payloads, and the update-path graph between versions.
//!
//! # Overview
//!
//! The catalog lets an administrative caller:
//! - Install extensions and additional versions of them
//! - Stage update paths carrying migration payloads between versions
//! - Repoint the default version dependents resolve to
//! - Uninstall versions (or whole extensions) under cardinality-aware rules
//!
//! # Architecture
//!
//! ```text
//! install / install-version / install-update-path
//!        │
//!        ▼
//!   CatalogStore
//!        ├── controls      (name → comment, default version, requires, flags)
//!        ├── versions      (name, version → payload)
//!        └── update paths  (name, from, to → payload)
//!               │
//!               ▼
//!        catalog.yaml      ← snapshot for logical backups and the CLI
//! ```
//!
//! Every operation is synchronous and runs inside the ambient transaction
//! of the invoking session; a failed operation leaves the tables untouched.

mod control;
mod lifecycle;
mod paths;
mod store;

pub use control::{validate_extension_name, validate_version, ExtensionControl};
pub use lifecycle::VersionCardinality;
pub use paths::UpdatePathRow;
pub use store::{
    CatalogStore, ExtensionSummary, ExtensionVersionRow, UpdatePathEdge, VersionEntry,
};
