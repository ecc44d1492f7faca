//! Property type tags.
//!
//! A [`PropertyType`] is what a descriptor declares and what a value is
//! checked against. Schema files name types by their fully-qualified type
//! name (`System.Int32`, ``System.Collections.Generic.List`1[System.Int32]``),
//! which is also the `Display` form. Parsing additionally accepts
//! assembly-qualified names and short lower-case tags (`int32`, `list<int32>`).

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::Error;

const BOOL_NAME: &str = "System.Boolean";
const INT32_NAME: &str = "System.Int32";
const INT64_NAME: &str = "System.Int64";
const DOUBLE_NAME: &str = "System.Double";
const STRING_NAME: &str = "System.String";
const DATETIME_NAME: &str = "System.DateTime";
const GUID_NAME: &str = "System.Guid";
const BYTES_NAME: &str = "System.Byte[]";
const LIST_PREFIX: &str = "System.Collections.Generic.List`1";
const RECORD_PREFIX: &str = "System.Collections.Generic.Dictionary`2";
const RECORD_NAME: &str = "System.Collections.Generic.Dictionary`2[System.String,System.Object]";

/// The declared type of a property.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum PropertyType {
    Bool,
    Int32,
    Int64,
    Double,
    String,
    DateTime,
    Guid,
    /// Raw byte buffer.
    Bytes,
    /// Fixed sequence of elements (`T[]`).
    Array(Box<PropertyType>),
    /// Growable sequence of elements (`List<T>`).
    List(Box<PropertyType>),
    /// String-keyed nested record.
    Record,
    /// Host-defined type identified only by name.
    Named(String),
}

impl PropertyType {
    /// Shorthand for an array type.
    #[must_use]
    pub fn array(element: PropertyType) -> Self {
        Self::Array(Box::new(element))
    }

    /// Shorthand for a list type.
    #[must_use]
    pub fn list(element: PropertyType) -> Self {
        Self::List(Box::new(element))
    }

    /// Returns the element type for sequence types.
    #[must_use]
    pub fn element(&self) -> Option<&PropertyType> {
        match self {
            Self::Array(element) | Self::List(element) => Some(element),
            _ => None,
        }
    }

    /// Returns true for `Array` and `List`.
    #[must_use]
    pub fn is_sequence(&self) -> bool {
        self.element().is_some()
    }

    /// Short lower-case tag, e.g. `int32`, `list<string>`, `datetime[]`.
    #[must_use]
    pub fn short_name(&self) -> String {
        match self {
            Self::Bool => "bool".into(),
            Self::Int32 => "int32".into(),
            Self::Int64 => "int64".into(),
            Self::Double => "double".into(),
            Self::String => "string".into(),
            Self::DateTime => "datetime".into(),
            Self::Guid => "guid".into(),
            Self::Bytes => "bytes".into(),
            Self::Array(element) => format!("{}[]", element.short_name()),
            Self::List(element) => format!("list<{}>", element.short_name()),
            Self::Record => "record".into(),
            Self::Named(name) => name.clone(),
        }
    }

    fn parse_scalar(name: &str) -> Option<Self> {
        let ty = match name {
            BOOL_NAME => Self::Bool,
            INT32_NAME => Self::Int32,
            INT64_NAME => Self::Int64,
            DOUBLE_NAME => Self::Double,
            STRING_NAME => Self::String,
            DATETIME_NAME => Self::DateTime,
            GUID_NAME => Self::Guid,
            BYTES_NAME => Self::Bytes,
            _ => match name.to_ascii_lowercase().as_str() {
                "bool" | "boolean" => Self::Bool,
                "int" | "int32" => Self::Int32,
                "long" | "int64" => Self::Int64,
                "double" | "float64" => Self::Double,
                "string" => Self::String,
                "datetime" => Self::DateTime,
                "guid" | "uuid" => Self::Guid,
                "bytes" => Self::Bytes,
                "record" => Self::Record,
                _ => return None,
            },
        };
        Some(ty)
    }
}

/// Drops the assembly part of an assembly-qualified name: everything after
/// the first comma that is not nested inside generic argument brackets.
fn strip_assembly(name: &str) -> &str {
    let mut depth = 0usize;
    for (i, c) in name.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => return name[..i].trim(),
            _ => {}
        }
    }
    name.trim()
}

/// Returns the text between `s`'s leading `[` and the bracket closing it,
/// provided that closing bracket is the last character of `s`.
fn bracketed(s: &str) -> Option<&str> {
    let body = s.strip_prefix('[')?;
    let mut depth = 1usize;
    for (i, c) in body.char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    return (i + 1 == body.len()).then(|| &body[..i]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Extracts the single generic argument of `prefix[arg]` or `prefix[[arg, asm]]`.
fn generic_argument<'a>(name: &'a str, prefix: &str) -> Option<&'a str> {
    let inner = bracketed(name.strip_prefix(prefix)?)?;
    match bracketed(inner) {
        Some(qualified) => Some(strip_assembly(qualified)),
        None => Some(inner.trim()),
    }
}

impl FromStr for PropertyType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = strip_assembly(s.trim());
        if name.is_empty() {
            return Err(Error::InvalidTypeName(s.to_string()));
        }

        if let Some(scalar) = Self::parse_scalar(name) {
            return Ok(scalar);
        }
        if let Some(element) = name.strip_suffix("[]") {
            return Ok(Self::array(element.parse()?));
        }
        if let Some(element) = generic_argument(name, LIST_PREFIX) {
            return Ok(Self::list(element.parse()?));
        }
        if name.starts_with(RECORD_PREFIX) {
            return Ok(Self::Record);
        }
        let lower = name.to_ascii_lowercase();
        if lower.starts_with("list<") && lower.ends_with('>') {
            return Ok(Self::list(name[5..name.len() - 1].parse()?));
        }

        Ok(Self::Named(name.to_string()))
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool => f.write_str(BOOL_NAME),
            Self::Int32 => f.write_str(INT32_NAME),
            Self::Int64 => f.write_str(INT64_NAME),
            Self::Double => f.write_str(DOUBLE_NAME),
            Self::String => f.write_str(STRING_NAME),
            Self::DateTime => f.write_str(DATETIME_NAME),
            Self::Guid => f.write_str(GUID_NAME),
            Self::Bytes => f.write_str(BYTES_NAME),
            Self::Array(element) => write!(f, "{element}[]"),
            Self::List(element) => write!(f, "{LIST_PREFIX}[{element}]"),
            Self::Record => f.write_str(RECORD_NAME),
            Self::Named(name) => f.write_str(name),
        }
    }
}

impl From<PropertyType> for String {
    fn from(ty: PropertyType) -> Self {
        ty.to_string()
    }
}

impl TryFrom<String> for PropertyType {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}
