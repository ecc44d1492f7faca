//! Descriptor model for propstore.
//!
//! Defines the metadata that governs a property store:
//! - [`PropertyDescriptor`]: a named property with its type, read/write capability,
//!   grouping/aggregation hints, related names, display and label hints
//! - [`PropertyDescriptorSet`]: ordered, uniquely keyed descriptors; answers
//!   the validation queries the store asks before every access
//! - [`HostType`]: a static description of a host object, turned into one
//!   descriptor per member by [`PropertyDescriptorSet::load_from_host_type`]
//!
//! The schema text format (`propertyDescriptors` JSON documents) is read and
//! written by [`PropertyDescriptorSet::load_json`] and
//! [`PropertyDescriptorSet::persist_json`].
//!
//! Display and label hints are carried for presentation layers; nothing in
//! this workspace interprets them.

mod descriptor;
mod error;
mod hints;
mod host;
mod schema;
mod set;

pub use descriptor::{PropertyDescriptor, PropertyDescriptorBuilder, PropertyTypeInfo};
pub use error::{ModelError, ModelResult, ValidationError};
pub use hints::{
    AggregationType, DisplayInfo, DrawControl, EditControl, FilterControl, GroupingRange,
    LabelInfo, ViewFlags,
};
pub use host::{HostMember, HostType};
pub use set::{PropertyDescriptorSet, SharedDescriptors};
