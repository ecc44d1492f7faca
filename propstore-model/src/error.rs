//! Error types for the descriptor model.

use thiserror::Error;

/// Result type for descriptor model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised while building, loading or persisting descriptor sets.
#[derive(Debug, Error)]
pub enum ModelError {
    /// A descriptor with this canonical name already exists.
    #[error("duplicate property descriptor: {0}")]
    DuplicateKey(String),

    /// Schema text could not be parsed or written.
    #[error("schema error: {0}")]
    Schema(#[from] serde_json::Error),

    /// IO error while reading or writing a schema stream.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A type name could not be parsed.
    #[error("invalid type: {0}")]
    InvalidType(#[from] propstore_types::Error),

    /// An enumerated hint value was not recognized.
    #[error("unknown {kind} value: {value:?}")]
    UnknownHint { kind: &'static str, value: String },
}

/// Why a property access was refused by a descriptor set.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// No descriptor exists for the name.
    #[error("property is not defined: {0}")]
    UndefinedProperty(String),

    /// The descriptor forbids writing.
    #[error("property is read-only: {0}")]
    NotWritable(String),

    /// The value's runtime type disagrees with the declared type.
    #[error("type mismatch for {name}: expected {expected}, got {actual}")]
    TypeMismatch {
        name: String,
        expected: String,
        actual: String,
    },
}
