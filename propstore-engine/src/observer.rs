//! Change notifications.
//!
//! Observers are called synchronously, in order, from inside the mutating
//! call that caused the change. A single write produces
//! `property_changing`, then `collection_changed`, then `property_changed`.

use propstore_types::PropertyValue;
use std::sync::mpsc::{self, Receiver, Sender};

/// What kind of change a [`CollectionChange`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CollectionAction {
    Add,
    Remove,
    Replace,
    Reset,
}

/// A change to the set of cached `(name, value)` pairs.
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionChange {
    Add {
        name: String,
        value: PropertyValue,
    },
    Remove {
        name: String,
        value: PropertyValue,
    },
    Replace {
        name: String,
        old: PropertyValue,
        new: PropertyValue,
    },
    /// The cache was emptied; `removed` lists the names it held.
    Reset { removed: Vec<String> },
}

impl CollectionChange {
    #[must_use]
    pub fn action(&self) -> CollectionAction {
        match self {
            Self::Add { .. } => CollectionAction::Add,
            Self::Remove { .. } => CollectionAction::Remove,
            Self::Replace { .. } => CollectionAction::Replace,
            Self::Reset { .. } => CollectionAction::Reset,
        }
    }

    /// The affected name, `None` for a reset.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        match self {
            Self::Add { name, .. } | Self::Remove { name, .. } | Self::Replace { name, .. } => {
                Some(name)
            }
            Self::Reset { .. } => None,
        }
    }
}

/// Receives store notifications. Every method defaults to a no-op.
///
/// Implementations must not call mutating operations of the store that is
/// notifying them.
pub trait PropertyObserver: Send + Sync {
    fn property_changing(&self, _name: &str) {}

    fn property_changed(&self, _name: &str) {}

    fn collection_changed(&self, _change: &CollectionChange) {}
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObserverId(pub(crate) u64);

/// One notification, as forwarded by [`ChannelObserver`].
#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    Changing(String),
    Changed(String),
    Collection(CollectionChange),
}

/// Forwards every notification over an mpsc channel.
///
/// Sends to a dropped receiver are ignored.
#[derive(Debug)]
pub struct ChannelObserver {
    tx: Sender<StoreEvent>,
}

impl ChannelObserver {
    /// Creates an observer and the receiving end of its channel.
    #[must_use]
    pub fn channel() -> (Self, Receiver<StoreEvent>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl PropertyObserver for ChannelObserver {
    fn property_changing(&self, name: &str) {
        let _ = self.tx.send(StoreEvent::Changing(name.to_string()));
    }

    fn property_changed(&self, name: &str) {
        let _ = self.tx.send(StoreEvent::Changed(name.to_string()));
    }

    fn collection_changed(&self, change: &CollectionChange) {
        let _ = self.tx.send(StoreEvent::Collection(change.clone()));
    }
}
