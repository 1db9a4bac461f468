//! Registry error types with stable kind classification

use thiserror::Error;

use crate::features::Feature;

/// Coarse classification of a [`RegistryError`].
///
/// Soft-fail wrappers (`*_if_exists`, `*_if_not_exists`) match on exactly
/// one kind and re-raise everything else unchanged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A referenced extension, version, update path, function, or
    /// registration does not exist
    NotFound,

    /// Duplicate key on an install or registration
    Conflict,

    /// A safety policy refused the operation
    PolicyViolation,

    /// The caller lacks the administrative capability
    Privilege,

    /// Malformed extension name, version, or reference
    InvalidArgument,
}

/// Errors raised by catalog, update-path, and feature registry operations
#[derive(Error, Debug)]
pub enum RegistryError {
    /// No control entry exists for the extension
    #[error("extension \"{name}\" is not installed")]
    ExtensionNotFound { name: String },

    /// The extension exists but the requested version does not
    #[error("version \"{version}\" of extension \"{name}\" is not installed")]
    VersionNotFound { name: String, version: String },

    /// No update-path edge matches (name, from, to)
    #[error("update path \"{from}--{to}\" for extension \"{name}\" does not exist")]
    UpdatePathNotFound {
        name: String,
        from: String,
        to: String,
    },

    /// The directory service found no function for the reference
    #[error("function \"{function}\" does not exist")]
    FunctionNotFound { function: String },

    /// No registration row matches the function and feature
    #[error("function \"{function}\" is not registered for feature \"{feature}\"")]
    FeatureNotRegistered { function: String, feature: Feature },

    /// The (name, version) key is already taken
    #[error("extension \"{name}\" version \"{version}\" is already installed")]
    VersionExists { name: String, version: String },

    /// A control entry exists whose metadata differs from the arguments
    #[error("extension \"{name}\" is already installed with different control metadata")]
    ControlConflict { name: String },

    /// The (name, from, to) edge is already taken
    #[error("update path \"{from}--{to}\" for extension \"{name}\" already exists")]
    UpdatePathExists {
        name: String,
        from: String,
        to: String,
    },

    /// The (feature, schema, function) key is already taken
    #[error("function \"{function}\" is already registered for feature \"{feature}\"")]
    FeatureAlreadyRegistered { function: String, feature: Feature },

    /// Removing the default version while sibling versions exist
    #[error("version \"{version}\" is the default version of extension \"{name}\"; set a new default before uninstalling it")]
    DefaultVersionInUse { name: String, version: String },

    /// Dropping a function the feature registry still references
    #[error("function \"{function}\" is referenced in the feature registry; unregister it before dropping it")]
    FunctionReferenced { function: String },

    /// The caller lacks the administrative capability for the action.
    ///
    /// extcat-core never raises this itself; it models failures surfaced
    /// by a host that enforces privileges behind the registry seam.
    #[error("permission denied to {action}")]
    PermissionDenied { action: String },

    /// Malformed extension name
    #[error("invalid extension name \"{name}\": {reason}")]
    InvalidName { name: String, reason: String },

    /// Malformed version string
    #[error("invalid version \"{version}\": {reason}")]
    InvalidVersion { version: String, reason: String },
}

impl RegistryError {
    /// Classify this error for soft-fail matching
    pub fn kind(&self) -> ErrorKind {
        match self {
            RegistryError::ExtensionNotFound { .. }
            | RegistryError::VersionNotFound { .. }
            | RegistryError::UpdatePathNotFound { .. }
            | RegistryError::FunctionNotFound { .. }
            | RegistryError::FeatureNotRegistered { .. } => ErrorKind::NotFound,

            RegistryError::VersionExists { .. }
            | RegistryError::ControlConflict { .. }
            | RegistryError::UpdatePathExists { .. }
            | RegistryError::FeatureAlreadyRegistered { .. } => ErrorKind::Conflict,

            RegistryError::DefaultVersionInUse { .. }
            | RegistryError::FunctionReferenced { .. } => ErrorKind::PolicyViolation,

            RegistryError::PermissionDenied { .. } => ErrorKind::Privilege,

            RegistryError::InvalidName { .. } | RegistryError::InvalidVersion { .. } => {
                ErrorKind::InvalidArgument
            }
        }
    }

    /// Check if this error is a missing-object condition
    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }

    /// Check if this error is a duplicate-key condition
    pub fn is_conflict(&self) -> bool {
        self.kind() == ErrorKind::Conflict
    }

    /// Check if this error is a refused-by-policy condition
    pub fn is_policy_violation(&self) -> bool {
        self.kind() == ErrorKind::PolicyViolation
    }
}

/// Result alias for registry operations
pub type Result<T> = std::result::Result<T, RegistryError>;
