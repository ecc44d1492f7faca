//! Error types for the property store.

use propstore_model::{ModelError, ValidationError};
use thiserror::Error;

use crate::accessor::AccessorError;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in property store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Validation is on and no descriptor exists for the name.
    #[error("property is not defined: {0}")]
    UndefinedProperty(String),

    /// Validation is on and the descriptor forbids writing.
    #[error("property is read-only: {0}")]
    NotWritable(String),

    /// Validation is on and the value does not conform to the declared type.
    #[error("type mismatch for {name}: expected {expected}, got {actual}")]
    TypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },

    /// The name is already present in the local cache.
    #[error("property already present: {0}")]
    DuplicateKey(String),

    /// A physical accessor callback failed.
    #[error("accessor failed for {name}: {source}")]
    Accessor {
        name: String,
        #[source]
        source: AccessorError,
    },

    /// A value snapshot is malformed.
    #[error("snapshot error: {0}")]
    Snapshot(String),

    /// A snapshot entry could not be encoded or decoded.
    #[error("encoding error: {0}")]
    Encoding(#[from] bincode::Error),

    /// IO error while reading or writing a snapshot stream.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Descriptor model error.
    #[error("model error: {0}")]
    Model(#[from] ModelError),

    /// Store configuration could not be parsed.
    #[error("config error: {0}")]
    Config(#[from] serde_json::Error),
}

impl From<ValidationError> for StoreError {
    fn from(err: ValidationError) -> Self {
        match err {
            ValidationError::UndefinedProperty(name) => Self::UndefinedProperty(name),
            ValidationError::NotWritable(name) => Self::NotWritable(name),
            ValidationError::TypeMismatch {
                name,
                expected,
                actual,
            } => Self::TypeMismatch {
                name,
                expected,
                actual,
            },
        }
    }
}

impl StoreError {
    /// Returns true for the errors a descriptor set raises on a refused access.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::UndefinedProperty(_) | Self::NotWritable(_) | Self::TypeMismatch { .. }
        )
    }
}
