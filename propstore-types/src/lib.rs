//! Core value definitions for propstore.
//!
//! This crate defines the two types every other propstore crate speaks:
//! - [`PropertyValue`]: a tagged variant covering the supported primitive,
//!   sequence and record shapes
//! - [`PropertyType`]: the type tag a descriptor declares, with its
//!   fully-qualified type name form used by schema files
//!
//! Values carry enough runtime type information to be checked against a
//! declared [`PropertyType`] without any reflection.

mod kind;
mod value;

pub use kind::PropertyType;
pub use value::PropertyValue;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in value and type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("cannot convert {actual} value to {expected}")]
    Conversion {
        expected: &'static str,
        actual: String,
    },

    #[error("invalid type name: {0:?}")]
    InvalidTypeName(String),
}
