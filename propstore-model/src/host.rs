//! Descriptor generation from a static host type description.
//!
//! A [`HostType`] lists the public members of some host object together
//! with their declared types and whether they can be assigned. Loading it
//! into a [`PropertyDescriptorSet`] yields exactly one descriptor per member.

use propstore_types::PropertyType;

use crate::{ModelResult, PropertyDescriptor, PropertyDescriptorSet};

/// One inspectable member of a host type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostMember {
    pub name: String,
    pub property_type: PropertyType,
    pub settable: bool,
}

/// A statically described host type.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HostType {
    pub type_name: String,
    pub members: Vec<HostMember>,
}

impl HostType {
    #[must_use]
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            members: Vec::new(),
        }
    }

    /// Adds a readable and assignable member.
    #[must_use]
    pub fn property(self, name: impl Into<String>, property_type: PropertyType) -> Self {
        self.member(name, property_type, true)
    }

    /// Adds a get-only member.
    #[must_use]
    pub fn read_only_property(self, name: impl Into<String>, property_type: PropertyType) -> Self {
        self.member(name, property_type, false)
    }

    #[must_use]
    pub fn member(
        mut self,
        name: impl Into<String>,
        property_type: PropertyType,
        settable: bool,
    ) -> Self {
        self.members.push(HostMember {
            name: name.into(),
            property_type,
            settable,
        });
        self
    }

    /// Adds a member declared by type name, e.g. `"System.Int32[]"`.
    pub fn typed_member(
        self,
        name: impl Into<String>,
        type_name: &str,
        settable: bool,
    ) -> ModelResult<Self> {
        let property_type: PropertyType = type_name.parse()?;
        Ok(self.member(name, property_type, settable))
    }

    /// One descriptor per member, in member order.
    #[must_use]
    pub fn descriptors(&self) -> Vec<PropertyDescriptor> {
        self.members
            .iter()
            .map(|m| PropertyDescriptor::new(m.name.clone(), m.property_type.clone(), !m.settable))
            .collect()
    }
}

impl PropertyDescriptorSet {
    /// Adds one descriptor per member of `host`, named after the member,
    /// typed from its declared type and read-only unless it is settable.
    ///
    /// Nothing is added if any member name collides with an existing
    /// descriptor. Returns the number of descriptors added.
    pub fn load_from_host_type(&mut self, host: &HostType) -> ModelResult<usize> {
        self.extend_checked(host.descriptors())
    }
}
