//! Property store engine for propstore.
//!
//! A [`PropertyStore`] holds named [`PropertyValue`](propstore_types::PropertyValue)s
//! in a local cache in front of a [`PhysicalAccessor`], checks every access
//! against a [`PropertyDescriptorSet`](propstore_model::PropertyDescriptorSet),
//! and either mirrors writes immediately or stages them until `commit`.
//!
//! # Concurrency
//!
//! - `set`, `add` and `remove` serialize per name and hold the commit gate shared
//! - `commit`, `clear`, `load` and the export step of `persist` hold it exclusively
//! - reads of unrelated names proceed while writes are in flight
//!
//! Observers run on the mutating thread with the gate held and must not call
//! back into mutating operations of the same store.

mod accessor;
mod config;
mod error;
mod observer;
pub mod snapshot;
mod store;

pub use accessor::{AccessorError, FnAccessor, MemoryAccessor, PhysicalAccessor};
pub use config::{CommitMode, StoreConfig};
pub use error::{StoreError, StoreResult};
pub use observer::{
    ChannelObserver, CollectionAction, CollectionChange, ObserverId, PropertyObserver, StoreEvent,
};
pub use snapshot::{SnapshotEntry, decode_snapshot, encode_snapshot};
pub use store::PropertyStore;
