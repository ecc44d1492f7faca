//! Physical accessors: the real backing source a store mirrors.

use propstore_types::PropertyValue;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

/// Error returned by accessor callbacks. Kept verbatim as the source of
/// [`StoreError::Accessor`](crate::StoreError::Accessor).
pub type AccessorError = Box<dyn std::error::Error + Send + Sync>;

/// The get/set/reset triple a store delegates to.
///
/// `get` distinguishes "not found" (`Ok(None)`) from "found, holding null"
/// (`Ok(Some(PropertyValue::Null))`). `reset` restores the property to
/// whatever the source considers its initial state.
pub trait PhysicalAccessor: Send + Sync {
    fn get(&self, name: &str) -> Result<Option<PropertyValue>, AccessorError>;

    fn set(&self, name: &str, value: &PropertyValue) -> Result<(), AccessorError>;

    fn reset(&self, name: &str) -> Result<(), AccessorError>;
}

impl<A: PhysicalAccessor + ?Sized> PhysicalAccessor for Arc<A> {
    fn get(&self, name: &str) -> Result<Option<PropertyValue>, AccessorError> {
        (**self).get(name)
    }

    fn set(&self, name: &str, value: &PropertyValue) -> Result<(), AccessorError> {
        (**self).set(name, value)
    }

    fn reset(&self, name: &str) -> Result<(), AccessorError> {
        (**self).reset(name)
    }
}

impl<A: PhysicalAccessor + ?Sized> PhysicalAccessor for Box<A> {
    fn get(&self, name: &str) -> Result<Option<PropertyValue>, AccessorError> {
        (**self).get(name)
    }

    fn set(&self, name: &str, value: &PropertyValue) -> Result<(), AccessorError> {
        (**self).set(name, value)
    }

    fn reset(&self, name: &str) -> Result<(), AccessorError> {
        (**self).reset(name)
    }
}

/// An accessor built from three closures.
pub struct FnAccessor<G, S, R> {
    get: G,
    set: S,
    reset: R,
}

impl<G, S, R> FnAccessor<G, S, R>
where
    G: Fn(&str) -> Result<Option<PropertyValue>, AccessorError> + Send + Sync,
    S: Fn(&str, &PropertyValue) -> Result<(), AccessorError> + Send + Sync,
    R: Fn(&str) -> Result<(), AccessorError> + Send + Sync,
{
    pub fn new(get: G, set: S, reset: R) -> Self {
        Self { get, set, reset }
    }
}

impl<G, S, R> PhysicalAccessor for FnAccessor<G, S, R>
where
    G: Fn(&str) -> Result<Option<PropertyValue>, AccessorError> + Send + Sync,
    S: Fn(&str, &PropertyValue) -> Result<(), AccessorError> + Send + Sync,
    R: Fn(&str) -> Result<(), AccessorError> + Send + Sync,
{
    fn get(&self, name: &str) -> Result<Option<PropertyValue>, AccessorError> {
        (self.get)(name)
    }

    fn set(&self, name: &str, value: &PropertyValue) -> Result<(), AccessorError> {
        (self.set)(name, value)
    }

    fn reset(&self, name: &str) -> Result<(), AccessorError> {
        (self.reset)(name)
    }
}

impl<G, S, R> std::fmt::Debug for FnAccessor<G, S, R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnAccessor").finish_non_exhaustive()
    }
}

/// An in-memory host object.
///
/// Each name starts at an initial value; `reset` restores it, or removes the
/// name when it had none. Names never seeded or set read as not found.
#[derive(Debug, Default)]
pub struct MemoryAccessor {
    initial: BTreeMap<String, PropertyValue>,
    current: RwLock<BTreeMap<String, PropertyValue>>,
}

impl MemoryAccessor {
    /// Creates an empty host.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a host whose initial and current values are `values`.
    pub fn with_values<K, I>(values: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, PropertyValue)>,
    {
        let initial: BTreeMap<String, PropertyValue> =
            values.into_iter().map(|(k, v)| (k.into(), v)).collect();
        Self {
            current: RwLock::new(initial.clone()),
            initial,
        }
    }

    /// Current value of `name`, bypassing any store.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<PropertyValue> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()
    }

    /// Copy of every current value.
    #[must_use]
    pub fn values(&self) -> BTreeMap<String, PropertyValue> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl PhysicalAccessor for MemoryAccessor {
    fn get(&self, name: &str) -> Result<Option<PropertyValue>, AccessorError> {
        Ok(self.value(name))
    }

    fn set(&self, name: &str, value: &PropertyValue) -> Result<(), AccessorError> {
        self.current
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(name.to_string(), value.clone());
        Ok(())
    }

    fn reset(&self, name: &str) -> Result<(), AccessorError> {
        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        match self.initial.get(name) {
            Some(initial) => {
                current.insert(name.to_string(), initial.clone());
            }
            None => {
                current.remove(name);
            }
        }
        Ok(())
    }
}
