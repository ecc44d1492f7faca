//! Property values.
//!
//! [`PropertyValue`] is the tagged variant stored in a property store cache
//! and exchanged with physical accessors. Sequences carry their declared
//! element type so an empty sequence still has a checkable type.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use uuid::Uuid;

use crate::{Error, PropertyType};

/// A dynamically typed property value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PropertyValue {
    /// Found, but holding no value.
    Null,
    Bool(bool),
    Int32(i32),
    Int64(i64),
    Double(f64),
    String(String),
    DateTime(DateTime<Utc>),
    Guid(Uuid),
    Bytes(Vec<u8>),
    Array {
        element: PropertyType,
        items: Vec<PropertyValue>,
    },
    List {
        element: PropertyType,
        items: Vec<PropertyValue>,
    },
    Record(BTreeMap<String, PropertyValue>),
    /// A value of a host-defined type, wrapping its structural representation.
    Named {
        type_name: String,
        value: Box<PropertyValue>,
    },
}

impl PropertyValue {
    /// Creates an array value with the given element type.
    #[must_use]
    pub fn array(element: PropertyType, items: Vec<PropertyValue>) -> Self {
        Self::Array { element, items }
    }

    /// Creates a list value with the given element type.
    #[must_use]
    pub fn list(element: PropertyType, items: Vec<PropertyValue>) -> Self {
        Self::List { element, items }
    }

    /// Creates a named value of a host-defined type.
    #[must_use]
    pub fn named(type_name: impl Into<String>, value: PropertyValue) -> Self {
        Self::Named {
            type_name: type_name.into(),
            value: Box::new(value),
        }
    }

    /// Creates a record from `(field, value)` pairs.
    pub fn record<K, I>(fields: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, PropertyValue)>,
    {
        Self::Record(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Returns true for [`PropertyValue::Null`].
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// The runtime type of this value, `None` for `Null`.
    #[must_use]
    pub fn property_type(&self) -> Option<PropertyType> {
        let ty = match self {
            Self::Null => return None,
            Self::Bool(_) => PropertyType::Bool,
            Self::Int32(_) => PropertyType::Int32,
            Self::Int64(_) => PropertyType::Int64,
            Self::Double(_) => PropertyType::Double,
            Self::String(_) => PropertyType::String,
            Self::DateTime(_) => PropertyType::DateTime,
            Self::Guid(_) => PropertyType::Guid,
            Self::Bytes(_) => PropertyType::Bytes,
            Self::Array { element, .. } => PropertyType::array(element.clone()),
            Self::List { element, .. } => PropertyType::list(element.clone()),
            Self::Record(_) => PropertyType::Record,
            Self::Named { type_name, .. } => PropertyType::Named(type_name.clone()),
        };
        Some(ty)
    }

    /// Checks this value against a declared type.
    ///
    /// `Null` conforms to every type. A sequence conforms when its element
    /// type matches and every item conforms to that element type.
    #[must_use]
    pub fn conforms_to(&self, ty: &PropertyType) -> bool {
        match (self, ty) {
            (Self::Null, _) => true,
            (Self::Array { element, items }, PropertyType::Array(expected))
            | (Self::List { element, items }, PropertyType::List(expected)) => {
                element == expected.as_ref() && items.iter().all(|item| item.conforms_to(element))
            }
            (Self::Named { type_name, .. }, PropertyType::Named(expected)) => type_name == expected,
            _ => self.property_type().as_ref() == Some(ty),
        }
    }

    /// Human-readable type label used in error messages.
    #[must_use]
    pub fn type_label(&self) -> String {
        self.property_type()
            .map_or_else(|| "null".to_string(), |ty| ty.to_string())
    }

    /// Returns the string slice if this is a string value.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the items of an array or list value.
    #[must_use]
    pub fn items(&self) -> Option<&[PropertyValue]> {
        match self {
            Self::Array { items, .. } | Self::List { items, .. } => Some(items),
            _ => None,
        }
    }

    /// Renders the value as JSON for display and diagnostics.
    ///
    /// The rendering drops type tags (sequence element types, named type
    /// identifiers) and is not meant to be parsed back.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int32(n) => Value::from(*n),
            Self::Int64(n) => Value::from(*n),
            Self::Double(n) => Value::from(*n),
            Self::String(s) => Value::String(s.clone()),
            Self::DateTime(dt) => Value::String(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::Guid(id) => Value::String(id.to_string()),
            Self::Bytes(bytes) => Value::from(bytes.clone()),
            Self::Array { items, .. } | Self::List { items, .. } => {
                Value::Array(items.iter().map(Self::to_json).collect())
            }
            Self::Record(fields) => Value::Object(
                fields
                    .iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
            Self::Named { value, .. } => value.to_json(),
        }
    }
}

impl fmt::Display for PropertyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json())
    }
}

// ── Conversions into PropertyValue ───────────────────────────────

impl From<bool> for PropertyValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for PropertyValue {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<i64> for PropertyValue {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<f64> for PropertyValue {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<&str> for PropertyValue {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for PropertyValue {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<DateTime<Utc>> for PropertyValue {
    fn from(v: DateTime<Utc>) -> Self {
        Self::DateTime(v)
    }
}

impl From<Uuid> for PropertyValue {
    fn from(v: Uuid) -> Self {
        Self::Guid(v)
    }
}

impl From<Vec<u8>> for PropertyValue {
    fn from(v: Vec<u8>) -> Self {
        Self::Bytes(v)
    }
}

impl From<Vec<i32>> for PropertyValue {
    fn from(v: Vec<i32>) -> Self {
        Self::array(PropertyType::Int32, v.into_iter().map(Self::Int32).collect())
    }
}

impl From<Vec<i64>> for PropertyValue {
    fn from(v: Vec<i64>) -> Self {
        Self::array(PropertyType::Int64, v.into_iter().map(Self::Int64).collect())
    }
}

impl From<Vec<String>> for PropertyValue {
    fn from(v: Vec<String>) -> Self {
        Self::array(PropertyType::String, v.into_iter().map(Self::String).collect())
    }
}

impl From<BTreeMap<String, PropertyValue>> for PropertyValue {
    fn from(v: BTreeMap<String, PropertyValue>) -> Self {
        Self::Record(v)
    }
}

impl<T: Into<PropertyValue>> From<Option<T>> for PropertyValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

// ── Conversions out of PropertyValue ─────────────────────────────

fn conversion_error(expected: &'static str, value: &PropertyValue) -> Error {
    Error::Conversion {
        expected,
        actual: value.type_label(),
    }
}

macro_rules! scalar_try_from {
    ($target:ty, $variant:ident, $expected:expr) => {
        impl TryFrom<PropertyValue> for $target {
            type Error = Error;

            fn try_from(value: PropertyValue) -> Result<Self, Self::Error> {
                match value {
                    PropertyValue::$variant(v) => Ok(v),
                    other => Err(conversion_error($expected, &other)),
                }
            }
        }
    };
}

scalar_try_from!(bool, Bool, "System.Boolean");
scalar_try_from!(i32, Int32, "System.Int32");
scalar_try_from!(i64, Int64, "System.Int64");
scalar_try_from!(f64, Double, "System.Double");
scalar_try_from!(String, String, "System.String");
scalar_try_from!(DateTime<Utc>, DateTime, "System.DateTime");
scalar_try_from!(Uuid, Guid, "System.Guid");
scalar_try_from!(Vec<u8>, Bytes, "System.Byte[]");

/// Converts an array or list value item by item.
fn sequence_try_from<T>(value: PropertyValue, expected: &'static str) -> Result<Vec<T>, Error>
where
    T: TryFrom<PropertyValue, Error = Error>,
{
    match value {
        PropertyValue::Array { items, .. } | PropertyValue::List { items, .. } => items
            .into_iter()
            .map(T::try_from)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|_| Error::Conversion {
                expected,
                actual: "sequence with mismatched items".into(),
            }),
        other => Err(conversion_error(expected, &other)),
    }
}

impl TryFrom<PropertyValue> for Vec<i32> {
    type Error = Error;

    fn try_from(value: PropertyValue) -> Result<Self, Self::Error> {
        sequence_try_from(value, "sequence of System.Int32")
    }
}

impl TryFrom<PropertyValue> for Vec<i64> {
    type Error = Error;

    fn try_from(value: PropertyValue) -> Result<Self, Self::Error> {
        sequence_try_from(value, "sequence of System.Int64")
    }
}

impl TryFrom<PropertyValue> for Vec<String> {
    type Error = Error;

    fn try_from(value: PropertyValue) -> Result<Self, Self::Error> {
        sequence_try_from(value, "sequence of System.String")
    }
}
