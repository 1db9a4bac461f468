//! Pre-delete validator for registered functions
//!
//! The host's function-ownership subsystem calls [`before_function_drop`]
//! for every function object a deletion is about to remove, before the
//! removal commits. The guard runs synchronously against the same
//! snapshot the deletion sees, so a function can never be deleted without
//! the guard having evaluated.

use tracing::{debug, warn};

use super::directory::FunctionIdentity;
use super::registry::FeatureRegistry;
use crate::error::{ErrorKind, RegistryError, Result};

/// How the host arrived at a function deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropContext {
    /// A direct deletion of the function object itself
    Standalone,

    /// The deletion is transitive: the owning extension is being removed
    /// as a unit
    ExtensionTeardown,
}

/// Registration-table surface the guard consults.
///
/// Hosts that enforce privileges behind the table implement this over
/// their own store; failures surface as [`RegistryError`].
pub trait FeatureStore {
    /// Whether any registration row matches the identity
    fn is_referenced(&self, identity: FunctionIdentity) -> bool;

    /// Remove every row matching the identity, returning the count removed
    fn remove_identity(&mut self, identity: FunctionIdentity) -> Result<usize>;
}

impl FeatureStore for FeatureRegistry {
    fn is_referenced(&self, identity: FunctionIdentity) -> bool {
        FeatureRegistry::is_referenced(self, identity)
    }

    fn remove_identity(&mut self, identity: FunctionIdentity) -> Result<usize> {
        FeatureRegistry::remove_identity(self, identity)
    }
}

/// Validate (and, during teardown, clean up after) a function deletion.
///
/// Standalone deletions of registered functions are refused; the caller
/// must unregister first. Teardown deletions cascade instead: matching
/// rows are removed best-effort, and an insufficient-privilege failure
/// from the store is swallowed rather than aborting the drop.
pub fn before_function_drop<S: FeatureStore>(
    store: &mut S,
    identity: FunctionIdentity,
    function: &str,
    context: DropContext,
) -> Result<()> {
    match context {
        DropContext::Standalone => {
            if store.is_referenced(identity) {
                return Err(RegistryError::FunctionReferenced {
                    function: function.to_string(),
                });
            }
            Ok(())
        }

        DropContext::ExtensionTeardown => match store.remove_identity(identity) {
            Ok(0) => Ok(()),
            Ok(removed) => {
                debug!(
                    "Removed {} feature registration(s) for {} during extension teardown",
                    removed, function
                );
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::Privilege => {
                warn!(
                    "Skipping feature registry cleanup for {} during teardown: {}",
                    function, err
                );
                Ok(())
            }
            Err(err) => Err(err),
        },
    }
}
