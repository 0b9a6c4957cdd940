//! Error types for reference-aware schema handling

use thiserror::Error;

/// Result type for schema-link operations
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Errors raised while normalizing schema definitions or resolving references
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("host engine version {found:?} does not satisfy required version {required}")]
    IncompatibleHost {
        required: String,
        found: Option<String>,
    },

    #[error("Invalid schema for {key}: {reason}")]
    SchemaDefinition { key: String, reason: String },

    #[error("Unsupported type on {key}: {found}")]
    UnsupportedType { key: String, found: String },

    #[error("Could not get referenced value {path}")]
    ReferenceResolution { path: String },

    #[error("Invalid version: {0}")]
    Version(#[from] semver::Error),
}

impl SchemaError {
    /// Whether this error is recorded as a validation message instead of
    /// aborting the pass
    pub fn is_recoverable(&self) -> bool {
        matches!(self, SchemaError::ReferenceResolution { .. })
    }
}
