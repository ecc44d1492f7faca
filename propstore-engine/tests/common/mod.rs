//! Shared fixtures for engine tests.
#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use propstore_engine::{
    AccessorError, CommitMode, MemoryAccessor, PhysicalAccessor, PropertyObserver, PropertyStore,
    StoreEvent,
};
use propstore_model::{HostType, PropertyDescriptor, PropertyDescriptorSet};
use propstore_types::{PropertyType, PropertyValue};
use std::collections::HashSet;
use std::sync::mpsc::Receiver;
use std::sync::{Arc, Mutex};

pub const START_DIR: &str = "/var/lib/app";

/// The system-service host used throughout: a working directory, a value
/// range, a read-only date and two integer sequences.
pub fn real_sys_svc() -> HostType {
    HostType::new("RealSysSvc")
        .property("CurrentDirectory", PropertyType::String)
        .property("MaxValue", PropertyType::Int32)
        .property("MinValue", PropertyType::Int32)
        .read_only_property("Today", PropertyType::DateTime)
        .property("Ints", PropertyType::array(PropertyType::Int32))
        .property("IntList", PropertyType::list(PropertyType::Int32))
}

/// Descriptors for [`real_sys_svc`] plus an unseeded `Notes` string.
pub fn descriptors() -> PropertyDescriptorSet {
    let mut set = PropertyDescriptorSet::new();
    set.load_from_host_type(&real_sys_svc()).unwrap();
    set.add(PropertyDescriptor::new("Notes", PropertyType::String, false))
        .unwrap();
    set
}

pub fn int_list(items: &[i32]) -> PropertyValue {
    PropertyValue::list(
        PropertyType::Int32,
        items.iter().map(|&i| PropertyValue::Int32(i)).collect(),
    )
}

pub fn host_values() -> Vec<(&'static str, PropertyValue)> {
    vec![
        ("CurrentDirectory", START_DIR.into()),
        ("MaxValue", i32::MAX.into()),
        ("MinValue", 0_i32.into()),
        (
            "Today",
            Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap().into(),
        ),
        ("Ints", vec![3_i32, 2, 1].into()),
        ("IntList", int_list(&[4, 2, 1])),
    ]
}

pub fn host() -> Arc<MemoryAccessor> {
    Arc::new(MemoryAccessor::with_values(host_values()))
}

pub fn store(mode: CommitMode) -> (PropertyStore<Arc<MemoryAccessor>>, Arc<MemoryAccessor>) {
    let host = host();
    (PropertyStore::new(descriptors(), Arc::clone(&host), mode), host)
}

/// Subscribes a channel observer and returns its receiver.
pub fn watch<A: PhysicalAccessor>(store: &PropertyStore<A>) -> Receiver<StoreEvent> {
    let (observer, rx) = propstore_engine::ChannelObserver::channel();
    store.subscribe(Arc::new(observer));
    rx
}

pub fn drain(rx: &Receiver<StoreEvent>) -> Vec<StoreEvent> {
    rx.try_iter().collect()
}

/// Counts notifications without recording them.
#[derive(Debug, Default)]
pub struct CountingObserver {
    pub changing: Mutex<usize>,
    pub changed: Mutex<usize>,
}

impl PropertyObserver for CountingObserver {
    fn property_changing(&self, _name: &str) {
        *self.changing.lock().unwrap() += 1;
    }

    fn property_changed(&self, _name: &str) {
        *self.changed.lock().unwrap() += 1;
    }
}

/// Wraps a [`MemoryAccessor`], failing every `set` for the listed names.
#[derive(Debug)]
pub struct FailingAccessor {
    pub inner: MemoryAccessor,
    pub fail_on: Mutex<HashSet<String>>,
}

impl FailingAccessor {
    pub fn new(fail_on: &[&str]) -> Self {
        Self {
            inner: MemoryAccessor::with_values(host_values()),
            fail_on: Mutex::new(fail_on.iter().map(|s| s.to_string()).collect()),
        }
    }

    pub fn heal(&self) {
        self.fail_on.lock().unwrap().clear();
    }
}

impl PhysicalAccessor for FailingAccessor {
    fn get(&self, name: &str) -> Result<Option<PropertyValue>, AccessorError> {
        self.inner.get(name)
    }

    fn set(&self, name: &str, value: &PropertyValue) -> Result<(), AccessorError> {
        if self.fail_on.lock().unwrap().contains(name) {
            return Err(format!("host rejected {name}").into());
        }
        self.inner.set(name, value)
    }

    fn reset(&self, name: &str) -> Result<(), AccessorError> {
        self.inner.reset(name)
    }
}
