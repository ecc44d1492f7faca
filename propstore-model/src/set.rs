//! Descriptor sets.

use propstore_types::{PropertyType, PropertyValue};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::{ModelError, ModelResult, PropertyDescriptor, ValidationError};

/// A descriptor set shared between stores.
///
/// Read-mostly: stores take the read lock for every validated access.
/// Mutating a set that several stores share is serialized by the lock, but
/// deciding which store is allowed to mutate it is up to the owner.
pub type SharedDescriptors = Arc<RwLock<PropertyDescriptorSet>>;

/// An ordered collection of descriptors, uniquely keyed by canonical name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyDescriptorSet {
    descriptors: Vec<PropertyDescriptor>,
    index: HashMap<String, usize>,
}

impl PropertyDescriptorSet {
    /// Creates an empty set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from descriptors, failing on the first duplicate name.
    pub fn from_descriptors<I>(descriptors: I) -> ModelResult<Self>
    where
        I: IntoIterator<Item = PropertyDescriptor>,
    {
        let mut set = Self::new();
        for descriptor in descriptors {
            set.add(descriptor)?;
        }
        Ok(set)
    }

    /// Wraps this set for sharing between stores.
    #[must_use]
    pub fn into_shared(self) -> SharedDescriptors {
        Arc::new(RwLock::new(self))
    }

    /// Adds a descriptor. Fails if its canonical name is already present.
    pub fn add(&mut self, descriptor: PropertyDescriptor) -> ModelResult<()> {
        let name = descriptor.canonical_name();
        if self.index.contains_key(name) {
            return Err(ModelError::DuplicateKey(name.to_string()));
        }
        self.index.insert(name.to_string(), self.descriptors.len());
        self.descriptors.push(descriptor);
        Ok(())
    }

    /// Inserts a descriptor, replacing any existing entry with the same name
    /// in place. Returns the replaced descriptor.
    pub fn replace(&mut self, descriptor: PropertyDescriptor) -> Option<PropertyDescriptor> {
        match self.index.get(descriptor.canonical_name()) {
            Some(&i) => Some(std::mem::replace(&mut self.descriptors[i], descriptor)),
            None => {
                self.index
                    .insert(descriptor.canonical_name().to_string(), self.descriptors.len());
                self.descriptors.push(descriptor);
                None
            }
        }
    }

    /// Removes and returns the descriptor with the given name.
    pub fn remove(&mut self, name: &str) -> Option<PropertyDescriptor> {
        let i = self.index.remove(name)?;
        let removed = self.descriptors.remove(i);
        for slot in self.index.values_mut() {
            if *slot > i {
                *slot -= 1;
            }
        }
        Some(removed)
    }

    /// Removes every descriptor.
    pub fn clear(&mut self) {
        self.descriptors.clear();
        self.index.clear();
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.index.get(name).map(|&i| &self.descriptors[i])
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Iterates descriptors in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &PropertyDescriptor> {
        self.descriptors.iter()
    }

    /// Canonical names in insertion order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().map(PropertyDescriptor::canonical_name)
    }

    // ── Validation ───────────────────────────────────────────────

    /// True iff a descriptor exists and, if `ty` is given, declares exactly that type.
    #[must_use]
    pub fn is_valid_get(&self, name: &str, ty: Option<&PropertyType>) -> bool {
        match (self.get(name), ty) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(d), Some(ty)) => d.property_type() == ty,
        }
    }

    /// True iff a writable descriptor exists and, if `ty` is given, declares
    /// exactly that type.
    #[must_use]
    pub fn is_valid_set(&self, name: &str, ty: Option<&PropertyType>) -> bool {
        match self.get(name) {
            Some(d) if d.can_write() => ty.is_none_or(|ty| d.property_type() == ty),
            _ => false,
        }
    }

    /// True iff `value` may be written to `name`.
    #[must_use]
    pub fn is_valid_set_value(&self, name: &str, value: &PropertyValue) -> bool {
        self.check_set(name, value).is_ok()
    }

    /// Looks up the descriptor a read of `name` is validated against.
    pub fn check_get(&self, name: &str) -> Result<&PropertyDescriptor, ValidationError> {
        self.get(name)
            .ok_or_else(|| ValidationError::UndefinedProperty(name.to_string()))
    }

    /// Validates writing `value` to `name`: the descriptor must exist, allow
    /// writing, and declare a type the value conforms to.
    pub fn check_set(
        &self,
        name: &str,
        value: &PropertyValue,
    ) -> Result<&PropertyDescriptor, ValidationError> {
        let descriptor = self.check_get(name)?;
        if !descriptor.can_write() {
            return Err(ValidationError::NotWritable(name.to_string()));
        }
        if !value.conforms_to(descriptor.property_type()) {
            return Err(ValidationError::TypeMismatch {
                name: name.to_string(),
                expected: descriptor.property_type().to_string(),
                actual: value.type_label(),
            });
        }
        Ok(descriptor)
    }
}

impl<'a> IntoIterator for &'a PropertyDescriptorSet {
    type Item = &'a PropertyDescriptor;
    type IntoIter = std::slice::Iter<'a, PropertyDescriptor>;

    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.iter()
    }
}
