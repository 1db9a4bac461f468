//! Feature registry - binding installed functions to engine hooks
//!
//! A fixed set of engine-recognized hooks ([`Feature`]) can each be
//! fulfilled by registered functions. Registrations are resolved through
//! the host's function directory and recorded by durable object identity,
//! and the drop guard refuses standalone deletions of functions the
//! registry still references.
//!
//! The registration table is the subsystem's persisted state: it rides
//! along in logical backups and is writable only through the
//! administrative surface.

mod directory;
mod guard;
mod hook;
mod registry;

pub use directory::{
    FunctionDirectory, FunctionIdentity, FunctionRecord, FunctionRef, StaticDirectory,
};
pub use guard::{before_function_drop, DropContext, FeatureStore};
pub use hook::Feature;
pub use registry::{FeatureRegistration, FeatureRegistry};
