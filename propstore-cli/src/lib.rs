//! Command implementations for the `propstore` binary.
//!
//! Each command returns the text it would print so it can be exercised
//! without spawning the binary.

use anyhow::{Context, Result};
use propstore_engine::{
    CommitMode, MemoryAccessor, PropertyStore, SnapshotEntry, StoreConfig, decode_snapshot,
};
use propstore_model::{PropertyDescriptor, PropertyDescriptorSet};
use std::fmt::Write as _;
use std::fs::File;
use std::path::Path;
use tracing::{debug, info};

/// Loads a schema file.
pub fn load_schema(path: &Path) -> Result<PropertyDescriptorSet> {
    let file = File::open(path).with_context(|| format!("Failed to open schema {}", path.display()))?;
    let mut set = PropertyDescriptorSet::new();
    let count = set
        .load_json(file)
        .with_context(|| format!("Failed to load schema {}", path.display()))?;
    debug!(path = %path.display(), descriptors = count, "schema loaded");
    Ok(set)
}

/// Loads a value snapshot file.
pub fn load_snapshot(path: &Path) -> Result<Vec<SnapshotEntry>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open snapshot {}", path.display()))?;
    let entries = decode_snapshot(std::io::BufReader::new(file))
        .with_context(|| format!("Failed to decode snapshot {}", path.display()))?;
    debug!(path = %path.display(), entries = entries.len(), "snapshot decoded");
    Ok(entries)
}

fn access_flags(descriptor: &PropertyDescriptor) -> &'static str {
    match (descriptor.can_read(), descriptor.can_write()) {
        (true, true) => "rw",
        (true, false) => "r-",
        (false, true) => "-w",
        (false, false) => "--",
    }
}

/// One line per descriptor: name, declared type and access flags.
pub fn describe_schema(path: &Path) -> Result<String> {
    let set = load_schema(path)?;
    let width = set.names().map(str::len).max().unwrap_or(0);
    let mut out = String::new();
    for descriptor in &set {
        writeln!(
            out,
            "{:<width$}  {}  {}",
            descriptor.canonical_name(),
            access_flags(descriptor),
            descriptor.property_type(),
        )?;
    }
    Ok(out)
}

/// The canonical JSON form of a schema file.
pub fn normalize_schema(path: &Path) -> Result<String> {
    let set = load_schema(path)?;
    let mut json = set.to_json_string().context("Failed to render schema")?;
    json.push('\n');
    Ok(json)
}

/// `name = value` for every snapshot entry, values rendered as JSON.
pub fn dump_snapshot(path: &Path) -> Result<String> {
    let mut out = String::new();
    for entry in load_snapshot(path)? {
        writeln!(out, "{} = {}", entry.name, entry.value)?;
    }
    Ok(out)
}

/// Result of replaying a snapshot against a schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub replayed: usize,
    pub mode: CommitMode,
    /// Names left dirty after the replay (staged mode only).
    pub pending: Vec<String>,
}

impl std::fmt::Display for CheckReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ok: {} entries replayed", self.replayed)?;
        if !self.pending.is_empty() {
            write!(f, ", {} pending: {}", self.pending.len(), self.pending.join(", "))?;
        }
        Ok(())
    }
}

/// Replays a snapshot into a fresh store over an empty host, so every entry
/// goes through full write validation. Fails on the first refused entry.
pub fn check_snapshot(schema: &Path, snapshot: &Path, config: StoreConfig) -> Result<CheckReport> {
    let descriptors = load_schema(schema)?;
    let entries = load_snapshot(snapshot)?;

    let store = PropertyStore::from_config(descriptors.into_shared(), MemoryAccessor::new(), config);
    for entry in &entries {
        store
            .set(&entry.name, entry.value.clone())
            .with_context(|| format!("Entry {} rejected", entry.name))?;
    }
    info!(entries = entries.len(), mode = ?store.mode(), "snapshot replayed");

    Ok(CheckReport {
        replayed: entries.len(),
        mode: store.mode(),
        pending: store.dirty_names(),
    })
}
