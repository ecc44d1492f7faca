//! The property store.

use propstore_model::{PropertyDescriptorSet, SharedDescriptors};
use propstore_types::PropertyValue;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{
    Arc, Condvar, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard,
};
use tracing::{debug, warn};

use crate::accessor::{AccessorError, PhysicalAccessor};
use crate::config::{CommitMode, StoreConfig};
use crate::observer::{CollectionChange, ObserverId, PropertyObserver};
use crate::snapshot::{SnapshotEntry, decode_snapshot, encode_snapshot};
use crate::{StoreError, StoreResult};

/// Local cache plus the names whose cached value has not reached the accessor.
#[derive(Debug, Default)]
struct CacheState {
    values: BTreeMap<String, PropertyValue>,
    dirty: BTreeSet<String>,
}

/// Per-name mutual exclusion.
#[derive(Debug, Default)]
struct NameLocks {
    busy: Mutex<HashSet<String>>,
    released: Condvar,
}

impl NameLocks {
    fn lock(&self, name: &str) -> NameGuard<'_> {
        let mut busy = self.busy.lock().unwrap_or_else(PoisonError::into_inner);
        while busy.contains(name) {
            busy = self
                .released
                .wait(busy)
                .unwrap_or_else(PoisonError::into_inner);
        }
        busy.insert(name.to_string());
        NameGuard {
            locks: self,
            name: name.to_string(),
        }
    }
}

struct NameGuard<'a> {
    locks: &'a NameLocks,
    name: String,
}

impl Drop for NameGuard<'_> {
    fn drop(&mut self) {
        self.locks
            .busy
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.name);
        self.locks.released.notify_all();
    }
}

type ObserverList = Vec<(ObserverId, Arc<dyn PropertyObserver>)>;

/// A metadata-driven property container.
///
/// Reads and writes go through a local cache in front of a
/// [`PhysicalAccessor`]. With validation on, every access is checked against
/// the descriptor set first. In [`CommitMode::Staged`] writes stay local
/// (and dirty) until [`commit`](Self::commit); in [`CommitMode::Immediate`]
/// they reach the accessor before the call returns.
///
/// All operations take `&self`; a store can be shared across threads.
pub struct PropertyStore<A> {
    descriptors: SharedDescriptors,
    accessor: A,
    mode: CommitMode,
    validation: AtomicBool,
    state: RwLock<CacheState>,
    /// Shared by single-name mutations, exclusive for whole-store operations.
    gate: RwLock<()>,
    names: NameLocks,
    observers: RwLock<ObserverList>,
    next_observer: AtomicU64,
}

impl<A: PhysicalAccessor> std::fmt::Debug for PropertyStore<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyStore")
            .field("mode", &self.mode)
            .field("validation", &self.validation_enabled())
            .field("len", &self.len())
            .finish_non_exhaustive()
    }
}

impl<A: PhysicalAccessor> PropertyStore<A> {
    /// Creates a store over its own descriptor set.
    pub fn new(descriptors: PropertyDescriptorSet, accessor: A, mode: CommitMode) -> Self {
        Self::with_shared(descriptors.into_shared(), accessor, mode)
    }

    /// Creates a store over a descriptor set that may be shared with other stores.
    pub fn with_shared(descriptors: SharedDescriptors, accessor: A, mode: CommitMode) -> Self {
        Self {
            descriptors,
            accessor,
            mode,
            validation: AtomicBool::new(true),
            state: RwLock::new(CacheState::default()),
            gate: RwLock::new(()),
            names: NameLocks::default(),
            observers: RwLock::new(Vec::new()),
            next_observer: AtomicU64::new(0),
        }
    }

    /// Creates a store from a [`StoreConfig`].
    pub fn from_config(descriptors: SharedDescriptors, accessor: A, config: StoreConfig) -> Self {
        let store = Self::with_shared(descriptors, accessor, config.mode());
        store.set_validation_enabled(config.validation);
        store
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Looks up the current value of `name`.
    ///
    /// Staged stores answer from the cache first. Otherwise the accessor's
    /// answer is returned verbatim: `None` for not found, `Some(Null)` for
    /// found but null.
    pub fn try_get(&self, name: &str) -> StoreResult<Option<PropertyValue>> {
        if self.validation_enabled() {
            self.read_descriptors().check_get(name)?;
        }
        if self.mode == CommitMode::Staged {
            if let Some(value) = self.read_state().values.get(name) {
                return Ok(Some(value.clone()));
            }
        }
        self.accessor
            .get(name)
            .map_err(|source| accessor_failure(name, "get", source))
    }

    /// [`try_get`](Self::try_get), falling back to `default` when not found.
    pub fn get_or(&self, name: &str, default: PropertyValue) -> StoreResult<PropertyValue> {
        Ok(self.try_get(name)?.unwrap_or(default))
    }

    /// [`try_get`](Self::try_get) converted to `T`.
    ///
    /// Not found and `Null` both read as `None`; a value of the wrong shape
    /// is an error.
    pub fn get_as<T>(&self, name: &str) -> StoreResult<Option<T>>
    where
        T: TryFrom<PropertyValue, Error = propstore_types::Error>,
    {
        match self.try_get(name)? {
            None | Some(PropertyValue::Null) => Ok(None),
            Some(value) => {
                let actual = value.type_label();
                T::try_from(value).map(Some).map_err(|_| StoreError::TypeMismatch {
                    name: name.to_string(),
                    expected: std::any::type_name::<T>().to_string(),
                    actual,
                })
            }
        }
    }

    // ── Writes ───────────────────────────────────────────────────

    /// Writes `value` to `name`.
    ///
    /// Writing the value already held is a no-op that notifies nobody; an
    /// absent value counts as `Null`. A write to a name holding no value
    /// behaves as [`add`](Self::add).
    pub fn set(&self, name: &str, value: impl Into<PropertyValue>) -> StoreResult<()> {
        let _gate = self.gate_shared();
        self.set_ungated(name, value.into())
    }

    /// Adds `name` to the cache. Fails with `DuplicateKey` if it is already cached.
    pub fn add(&self, name: &str, value: impl Into<PropertyValue>) -> StoreResult<()> {
        let _gate = self.gate_shared();
        let _name = self.names.lock(name);
        self.insert_locked(name, value.into(), false)
    }

    /// Removes `name` from the cache, resetting it (immediate) or discarding
    /// its pending value (staged). Returns false if it was not cached.
    ///
    /// `property_changing` fires even when nothing is removed.
    pub fn remove(&self, name: &str) -> StoreResult<bool> {
        let _gate = self.gate_shared();
        let _name = self.names.lock(name);
        if self.validation_enabled() {
            self.read_descriptors().check_get(name)?;
        }
        self.notify_changing(name);
        self.remove_locked(name)
    }

    /// Removes `name` only if its cached value equals `value`.
    pub fn remove_entry(&self, name: &str, value: &PropertyValue) -> StoreResult<bool> {
        let _gate = self.gate_shared();
        let _name = self.names.lock(name);
        if self.validation_enabled() {
            self.read_descriptors().check_get(name)?;
        }
        if self.read_state().values.get(name) != Some(value) {
            return Ok(false);
        }
        self.notify_changing(name);
        self.remove_locked(name)
    }

    /// Empties the cache.
    ///
    /// Immediate stores reset every cached name on the accessor. Staged stores
    /// drop their pending values without writing them.
    pub fn clear(&self) -> StoreResult<()> {
        let _gate = self.gate_exclusive();
        let names: Vec<String> = self.read_state().values.keys().cloned().collect();
        for name in &names {
            self.notify_changing(name);
        }

        let discarded = {
            let mut state = self.write_state();
            state.values.clear();
            let discarded = state.dirty.len();
            state.dirty.clear();
            discarded
        };

        if self.mode.is_immediate() {
            for name in &names {
                self.accessor
                    .reset(name)
                    .map_err(|source| accessor_failure(name, "reset", source))?;
            }
        } else if discarded > 0 {
            warn!(discarded, "clear discarded uncommitted values");
        }

        self.notify_collection(&CollectionChange::Reset {
            removed: names.clone(),
        });
        for name in &names {
            self.notify_changed(name);
        }
        debug!(count = names.len(), "store cleared");
        Ok(())
    }

    /// Sends every dirty value to the accessor, in name order.
    ///
    /// Not atomic: if a write fails, names already sent are clean and the
    /// failing name and every later one stay dirty.
    pub fn commit(&self) -> StoreResult<()> {
        let _gate = self.gate_exclusive();
        let pending: Vec<String> = self.read_state().dirty.iter().cloned().collect();
        for name in &pending {
            let value = self.read_state().values.get(name).cloned();
            if let Some(value) = value {
                self.accessor
                    .set(name, &value)
                    .map_err(|source| accessor_failure(name, "set", source))?;
            }
            self.write_state().dirty.remove(name);
        }
        if !pending.is_empty() {
            debug!(count = pending.len(), "committed staged values");
        }
        Ok(())
    }

    // ── Dirty tracking ───────────────────────────────────────────

    #[must_use]
    pub fn is_dirty(&self) -> bool {
        !self.read_state().dirty.is_empty()
    }

    #[must_use]
    pub fn is_name_dirty(&self, name: &str) -> bool {
        self.read_state().dirty.contains(name)
    }

    /// Dirty names in order.
    #[must_use]
    pub fn dirty_names(&self) -> Vec<String> {
        self.read_state().dirty.iter().cloned().collect()
    }

    // ── Introspection ────────────────────────────────────────────

    /// Number of cached names.
    #[must_use]
    pub fn len(&self) -> usize {
        self.read_state().values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.read_state().values.is_empty()
    }

    /// True if `name` is cached.
    #[must_use]
    pub fn contains_key(&self, name: &str) -> bool {
        self.read_state().values.contains_key(name)
    }

    /// Cached names in order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.read_state().values.keys().cloned().collect()
    }

    /// Copy of the cache.
    #[must_use]
    pub fn cached_values(&self) -> BTreeMap<String, PropertyValue> {
        self.read_state().values.clone()
    }

    #[must_use]
    pub fn mode(&self) -> CommitMode {
        self.mode
    }

    #[must_use]
    pub fn validation_enabled(&self) -> bool {
        self.validation.load(Ordering::Acquire)
    }

    /// Turns descriptor checks on or off for subsequent operations.
    pub fn set_validation_enabled(&self, enabled: bool) {
        self.validation.store(enabled, Ordering::Release);
    }

    /// The descriptor set this store validates against.
    #[must_use]
    pub fn descriptors(&self) -> &SharedDescriptors {
        &self.descriptors
    }

    #[must_use]
    pub fn accessor(&self) -> &A {
        &self.accessor
    }

    // ── Observers ────────────────────────────────────────────────

    pub fn subscribe(&self, observer: Arc<dyn PropertyObserver>) -> ObserverId {
        let id = ObserverId(self.next_observer.fetch_add(1, Ordering::Relaxed));
        self.observers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push((id, observer));
        id
    }

    /// Returns false if `id` was not subscribed.
    pub fn unsubscribe(&self, id: ObserverId) -> bool {
        let mut observers = self.observers.write().unwrap_or_else(PoisonError::into_inner);
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    // ── Value snapshots ──────────────────────────────────────────

    /// The `(name, value)` pairs a snapshot of this store contains: every
    /// cached pair, then the current value of every readable and writable
    /// descriptor that is not cached.
    pub fn export_entries(&self) -> StoreResult<Vec<SnapshotEntry>> {
        let _gate = self.gate_exclusive();
        self.export_ungated()
    }

    /// Writes a value snapshot of this store.
    pub fn persist<W: Write>(&self, writer: W) -> StoreResult<()> {
        let entries = self.export_entries()?;
        debug!(entries = entries.len(), "persisting value snapshot");
        encode_snapshot(&entries, writer)
    }

    /// Reads a value snapshot and replays every pair through [`set`](Self::set).
    ///
    /// The snapshot is decoded completely before anything is written. Replay
    /// stops at the first failing pair; pairs before it stay applied.
    pub fn load<R: Read>(&self, reader: R) -> StoreResult<usize> {
        let entries = decode_snapshot(reader)?;
        let _gate = self.gate_exclusive();
        for entry in &entries {
            self.set_ungated(&entry.name, entry.value.clone())?;
        }
        debug!(entries = entries.len(), "loaded value snapshot");
        Ok(entries.len())
    }

    // ── Internals ────────────────────────────────────────────────

    fn set_ungated(&self, name: &str, value: PropertyValue) -> StoreResult<()> {
        let _name = self.names.lock(name);
        let old = self.try_get(name)?;
        if old.as_ref().unwrap_or(&PropertyValue::Null) == &value {
            return Ok(());
        }
        let old = match old {
            None | Some(PropertyValue::Null) => return self.insert_locked(name, value, true),
            Some(old) => old,
        };

        if self.validation_enabled() {
            self.read_descriptors().check_set(name, &value)?;
        }

        self.notify_changing(name);
        self.write_state()
            .values
            .insert(name.to_string(), value.clone());
        self.write_through(name, &value)?;

        self.notify_collection(&CollectionChange::Replace {
            name: name.to_string(),
            old,
            new: value,
        });
        self.notify_changed(name);
        Ok(())
    }

    /// Inserts a new cached pair. `overwrite` lets a write from `set` replace a
    /// cached `Null`; a plain `add` fails on any cached value.
    fn insert_locked(&self, name: &str, value: PropertyValue, overwrite: bool) -> StoreResult<()> {
        if self.validation_enabled() {
            self.read_descriptors().check_set(name, &value)?;
        }

        self.notify_changing(name);
        {
            let mut state = self.write_state();
            if !overwrite && state.values.contains_key(name) {
                return Err(StoreError::DuplicateKey(name.to_string()));
            }
            state.values.insert(name.to_string(), value.clone());
        }
        self.write_through(name, &value)?;

        self.notify_collection(&CollectionChange::Add {
            name: name.to_string(),
            value,
        });
        self.notify_changed(name);
        Ok(())
    }

    fn remove_locked(&self, name: &str) -> StoreResult<bool> {
        let removed = {
            let mut state = self.write_state();
            let removed = state.values.remove(name);
            if removed.is_some() {
                state.dirty.remove(name);
            }
            removed
        };
        let Some(value) = removed else {
            return Ok(false);
        };

        if self.mode.is_immediate() {
            self.accessor
                .reset(name)
                .map_err(|source| accessor_failure(name, "reset", source))?;
        }

        self.notify_collection(&CollectionChange::Remove {
            name: name.to_string(),
            value,
        });
        self.notify_changed(name);
        Ok(true)
    }

    /// Sends a freshly cached value to the accessor, or marks it dirty.
    fn write_through(&self, name: &str, value: &PropertyValue) -> StoreResult<()> {
        match self.mode {
            CommitMode::Immediate => {
                self.accessor
                    .set(name, value)
                    .map_err(|source| accessor_failure(name, "set", source))?;
                debug!(name = %name, "wrote through");
            }
            CommitMode::Staged => {
                self.write_state().dirty.insert(name.to_string());
                debug!(name = %name, "staged");
            }
        }
        Ok(())
    }

    fn export_ungated(&self) -> StoreResult<Vec<SnapshotEntry>> {
        let cached = self.cached_values();
        let uncached: Vec<String> = self
            .read_descriptors()
            .iter()
            .filter(|d| d.is_read_write() && !cached.contains_key(d.canonical_name()))
            .map(|d| d.canonical_name().to_string())
            .collect();

        let mut entries: Vec<SnapshotEntry> = cached
            .into_iter()
            .map(|(name, value)| SnapshotEntry { name, value })
            .collect();
        for name in uncached {
            if let Some(value) = self.try_get(&name)? {
                entries.push(SnapshotEntry { name, value });
            }
        }
        Ok(entries)
    }

    fn notify_changing(&self, name: &str) {
        for observer in self.observer_snapshot() {
            observer.property_changing(name);
        }
    }

    fn notify_changed(&self, name: &str) {
        for observer in self.observer_snapshot() {
            observer.property_changed(name);
        }
    }

    fn notify_collection(&self, change: &CollectionChange) {
        for observer in self.observer_snapshot() {
            observer.collection_changed(change);
        }
    }

    fn observer_snapshot(&self) -> Vec<Arc<dyn PropertyObserver>> {
        self.observers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, observer)| Arc::clone(observer))
            .collect()
    }

    fn read_descriptors(&self) -> RwLockReadGuard<'_, PropertyDescriptorSet> {
        self.descriptors.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_state(&self) -> RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn gate_shared(&self) -> RwLockReadGuard<'_, ()> {
        self.gate.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn gate_exclusive(&self) -> RwLockWriteGuard<'_, ()> {
        self.gate.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn accessor_failure(name: &str, op: &'static str, source: AccessorError) -> StoreError {
    warn!(name = %name, op, error = %source, "accessor call failed");
    StoreError::Accessor {
        name: name.to_string(),
        source,
    }
}
