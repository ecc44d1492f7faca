//! Property descriptors.

use propstore_types::PropertyType;
use serde::{Deserialize, Serialize};

use crate::hints::{AggregationType, DisplayInfo, GroupingRange, LabelInfo};
use crate::schema::{DescriptorRecord, TypeInfoRecord};

/// Type capabilities and grouping hints of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyTypeInfo {
    pub can_read: bool,
    pub can_write: bool,
    pub grouping_range: GroupingRange,
    pub aggregation_type: AggregationType,
}

impl Default for PropertyTypeInfo {
    fn default() -> Self {
        Self {
            can_read: true,
            can_write: true,
            grouping_range: GroupingRange::default(),
            aggregation_type: AggregationType::default(),
        }
    }
}

impl PropertyTypeInfo {
    /// Returns true when every field holds its default.
    #[must_use]
    pub fn is_default(&self) -> bool {
        *self == Self::default()
    }
}

/// Immutable metadata for one named property.
///
/// Descriptors are never mutated in place; replacing a descriptor in its set
/// is the only way to change one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "DescriptorRecord", into = "DescriptorRecord")]
pub struct PropertyDescriptor {
    canonical_name: String,
    property_type: PropertyType,
    type_info: PropertyTypeInfo,
    related_property_names: Vec<String>,
    display_info: Option<DisplayInfo>,
    label_info: Option<LabelInfo>,
}

impl PropertyDescriptor {
    /// Creates a descriptor with default hints.
    #[must_use]
    pub fn new(canonical_name: impl Into<String>, property_type: PropertyType, read_only: bool) -> Self {
        let mut builder = Self::builder(canonical_name, property_type);
        if read_only {
            builder = builder.read_only();
        }
        builder.build()
    }

    /// Starts a builder for a descriptor with every optional field at its default.
    #[must_use]
    pub fn builder(
        canonical_name: impl Into<String>,
        property_type: PropertyType,
    ) -> PropertyDescriptorBuilder {
        PropertyDescriptorBuilder {
            descriptor: Self {
                canonical_name: canonical_name.into(),
                property_type,
                type_info: PropertyTypeInfo::default(),
                related_property_names: Vec::new(),
                display_info: None,
                label_info: None,
            },
        }
    }

    /// The case-sensitive name the property is known by.
    #[must_use]
    pub fn canonical_name(&self) -> &str {
        &self.canonical_name
    }

    #[must_use]
    pub fn property_type(&self) -> &PropertyType {
        &self.property_type
    }

    #[must_use]
    pub fn type_info(&self) -> &PropertyTypeInfo {
        &self.type_info
    }

    #[must_use]
    pub fn can_read(&self) -> bool {
        self.type_info.can_read
    }

    #[must_use]
    pub fn can_write(&self) -> bool {
        self.type_info.can_write
    }

    /// Readable and writable; such properties are captured by value snapshots.
    #[must_use]
    pub fn is_read_write(&self) -> bool {
        self.type_info.can_read && self.type_info.can_write
    }

    #[must_use]
    pub fn grouping_range(&self) -> GroupingRange {
        self.type_info.grouping_range
    }

    #[must_use]
    pub fn aggregation_type(&self) -> AggregationType {
        self.type_info.aggregation_type
    }

    /// Canonical names of related properties. Informational only.
    #[must_use]
    pub fn related_property_names(&self) -> &[String] {
        &self.related_property_names
    }

    #[must_use]
    pub fn display_info(&self) -> Option<&DisplayInfo> {
        self.display_info.as_ref()
    }

    #[must_use]
    pub fn label_info(&self) -> Option<&LabelInfo> {
        self.label_info.as_ref()
    }

    /// Starts a builder pre-filled from this descriptor, for producing a replacement.
    #[must_use]
    pub fn to_builder(&self) -> PropertyDescriptorBuilder {
        PropertyDescriptorBuilder {
            descriptor: self.clone(),
        }
    }
}

/// Fluent builder for [`PropertyDescriptor`].
#[derive(Debug, Clone)]
pub struct PropertyDescriptorBuilder {
    descriptor: PropertyDescriptor,
}

impl PropertyDescriptorBuilder {
    pub fn read_only(mut self) -> Self {
        self.descriptor.type_info.can_write = false;
        self
    }

    pub fn can_read(mut self, can_read: bool) -> Self {
        self.descriptor.type_info.can_read = can_read;
        self
    }

    pub fn can_write(mut self, can_write: bool) -> Self {
        self.descriptor.type_info.can_write = can_write;
        self
    }

    pub fn type_info(mut self, type_info: PropertyTypeInfo) -> Self {
        self.descriptor.type_info = type_info;
        self
    }

    pub fn grouping_range(mut self, grouping_range: GroupingRange) -> Self {
        self.descriptor.type_info.grouping_range = grouping_range;
        self
    }

    pub fn aggregation_type(mut self, aggregation_type: AggregationType) -> Self {
        self.descriptor.type_info.aggregation_type = aggregation_type;
        self
    }

    pub fn related<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.descriptor.related_property_names = names.into_iter().map(Into::into).collect();
        self
    }

    pub fn display_info(mut self, display_info: DisplayInfo) -> Self {
        self.descriptor.display_info = Some(display_info);
        self
    }

    pub fn label_info(mut self, label_info: LabelInfo) -> Self {
        self.descriptor.label_info = Some(label_info);
        self
    }

    #[must_use]
    pub fn build(self) -> PropertyDescriptor {
        self.descriptor
    }
}

impl From<DescriptorRecord> for PropertyDescriptor {
    fn from(record: DescriptorRecord) -> Self {
        let type_info = record
            .type_info
            .map(|info| info.into_type_info())
            .unwrap_or_default();
        Self {
            canonical_name: record.name,
            property_type: record.property_type,
            type_info,
            related_property_names: record.related_property_names.unwrap_or_default(),
            display_info: record.display_info,
            label_info: record.label_info,
        }
    }
}

impl From<PropertyDescriptor> for DescriptorRecord {
    fn from(descriptor: PropertyDescriptor) -> Self {
        let related = descriptor.related_property_names;
        Self {
            name: descriptor.canonical_name,
            key: None,
            property_type: descriptor.property_type,
            type_info: TypeInfoRecord::from_type_info(&descriptor.type_info),
            display_info: descriptor.display_info,
            label_info: descriptor.label_info,
            related_property_names: (!related.is_empty()).then_some(related),
        }
    }
}
