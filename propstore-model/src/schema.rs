//! Schema text format for descriptor sets.
//!
//! A schema document is a JSON object with a `propertyDescriptors` array:
//!
//! ```json
//! {
//!   "propertyDescriptors": [
//!     {
//!       "name": "Today",
//!       "type": "System.DateTime",
//!       "typeInfo": { "canWrite": false, "groupingRange": "date" },
//!       "labelInfo": { "label": "Today" }
//!     }
//!   ]
//! }
//! ```
//!
//! Input entries may carry a `key` identifier; it is accepted and dropped.
//! A comma before a closing `}` or `]` is tolerated on input.

use propstore_types::PropertyType;
use serde::de::{self, Deserializer, IgnoredAny};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::{BufReader, BufWriter, Read, Write};
use tracing::debug;

use crate::descriptor::{PropertyDescriptor, PropertyTypeInfo};
use crate::hints::{AggregationType, DisplayInfo, GroupingRange, LabelInfo};
use crate::{ModelError, ModelResult, PropertyDescriptorSet};

/// Wire form of one descriptor entry.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DescriptorRecord {
    pub(crate) name: String,
    #[serde(default, skip_serializing)]
    pub(crate) key: Option<IgnoredAny>,
    #[serde(rename = "type")]
    pub(crate) property_type: PropertyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) type_info: Option<TypeInfoRecord>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) display_info: Option<DisplayInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) label_info: Option<LabelInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub(crate) related_property_names: Option<Vec<String>>,
}

/// Wire form of `typeInfo`. Absent or null members take the defaults; only
/// non-default members are written.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TypeInfoRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    can_read: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    can_write: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    grouping_range: Option<GroupingRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    aggregation_type: Option<AggregationType>,
}

impl TypeInfoRecord {
    pub(crate) fn into_type_info(self) -> PropertyTypeInfo {
        PropertyTypeInfo {
            can_read: self.can_read.unwrap_or(true),
            can_write: self.can_write.unwrap_or(true),
            grouping_range: self.grouping_range.unwrap_or_default(),
            aggregation_type: self.aggregation_type.unwrap_or_default(),
        }
    }

    pub(crate) fn from_type_info(info: &PropertyTypeInfo) -> Option<Self> {
        if info.is_default() {
            return None;
        }
        Some(Self {
            can_read: (!info.can_read).then_some(false),
            can_write: (!info.can_write).then_some(false),
            grouping_range: (info.grouping_range != GroupingRange::default())
                .then_some(info.grouping_range),
            aggregation_type: (info.aggregation_type != AggregationType::default())
                .then_some(info.aggregation_type),
        })
    }
}

#[derive(Deserialize)]
struct SchemaDocument {
    #[serde(default, rename = "propertyDescriptors")]
    property_descriptors: Option<Vec<PropertyDescriptor>>,
}

#[derive(Serialize)]
struct SchemaDocumentRef<'a> {
    #[serde(rename = "propertyDescriptors")]
    property_descriptors: Vec<&'a PropertyDescriptor>,
}

/// Fails with the first name that is already in `set` or repeated in `incoming`.
fn check_unique(set: &PropertyDescriptorSet, incoming: &[PropertyDescriptor]) -> ModelResult<()> {
    let mut seen = HashSet::new();
    for descriptor in incoming {
        let name = descriptor.canonical_name();
        if set.contains(name) || !seen.insert(name) {
            return Err(ModelError::DuplicateKey(name.to_string()));
        }
    }
    Ok(())
}

/// Drops every comma whose next non-whitespace character closes an object
/// or array. String contents are left alone.
fn strip_trailing_commas(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_string = false;
    let mut escaped = false;
    let mut pending_comma: Option<usize> = None;

    for c in text.chars() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            out.push(c);
            continue;
        }
        match c {
            '"' => {
                pending_comma = None;
                in_string = true;
            }
            ',' => pending_comma = Some(out.len()),
            '}' | ']' => {
                if let Some(at) = pending_comma.take() {
                    out.remove(at);
                }
            }
            c if c.is_whitespace() => {}
            _ => pending_comma = None,
        }
        out.push(c);
    }
    out
}

impl PropertyDescriptorSet {
    /// Reads a schema document and adds its descriptors to this set.
    ///
    /// The whole document is parsed and checked for duplicate names before
    /// anything is inserted, so a failed load leaves the set unchanged.
    /// Returns the number of descriptors added.
    pub fn load_json<R: Read>(&mut self, reader: R) -> ModelResult<usize> {
        let mut text = String::new();
        BufReader::new(reader).read_to_string(&mut text)?;
        let document: SchemaDocument = serde_json::from_str(&strip_trailing_commas(&text))?;
        let added = self.extend_checked(document.property_descriptors.unwrap_or_default())?;
        debug!(added, total = self.len(), "Loaded property schema");
        Ok(added)
    }

    /// Writes this set as a pretty-printed schema document.
    pub fn persist_json<W: Write>(&self, writer: W) -> ModelResult<()> {
        let mut writer = BufWriter::new(writer);
        serde_json::to_writer_pretty(&mut writer, &self.as_document())?;
        writer.flush()?;
        debug!(descriptors = self.len(), "Persisted property schema");
        Ok(())
    }

    /// Parses a schema document into a new set.
    pub fn from_json_str(json: &str) -> ModelResult<Self> {
        let mut set = Self::new();
        set.load_json(json.as_bytes())?;
        Ok(set)
    }

    /// Renders this set as a pretty-printed schema document.
    pub fn to_json_string(&self) -> ModelResult<String> {
        Ok(serde_json::to_string_pretty(&self.as_document())?)
    }

    pub(crate) fn extend_checked(&mut self, incoming: Vec<PropertyDescriptor>) -> ModelResult<usize> {
        check_unique(self, &incoming)?;
        let count = incoming.len();
        for descriptor in incoming {
            self.add(descriptor)?;
        }
        Ok(count)
    }

    fn as_document(&self) -> SchemaDocumentRef<'_> {
        SchemaDocumentRef {
            property_descriptors: self.iter().collect(),
        }
    }
}

impl Serialize for PropertyDescriptorSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.as_document().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for PropertyDescriptorSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let document = SchemaDocument::deserialize(deserializer)?;
        let mut set = Self::new();
        set.extend_checked(document.property_descriptors.unwrap_or_default())
            .map_err(de::Error::custom)?;
        Ok(set)
    }
}
