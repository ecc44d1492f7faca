//! Value snapshot codec.
//!
//! Layout (all integers big-endian):
//!
//! ```text
//! magic    4 bytes   "PSV\0"
//! version  u16       currently 1
//! count    u32       number of entries
//! entry*   u32 length prefix, then a bincode-encoded SnapshotEntry
//! ```
//!
//! Decoding is strict: bad magic, unknown versions, oversized or truncated
//! entries and trailing bytes are all rejected.

use propstore_types::PropertyValue;
use serde::{Deserialize, Serialize};
use std::io::{self, Read, Write};

use crate::{StoreError, StoreResult};

/// Leading bytes of every snapshot.
pub const SNAPSHOT_MAGIC: [u8; 4] = *b"PSV\0";

/// Format version written by [`encode_snapshot`].
pub const SNAPSHOT_VERSION: u16 = 1;

/// Maximum encoded size of one entry (16 MB).
pub const MAX_ENTRY_SIZE: usize = 16 * 1024 * 1024;

/// One `(name, value)` pair of a snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotEntry {
    pub name: String,
    pub value: PropertyValue,
}

impl SnapshotEntry {
    pub fn new(name: impl Into<String>, value: impl Into<PropertyValue>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// Writes `entries` as a snapshot.
pub fn encode_snapshot<W: Write>(entries: &[SnapshotEntry], mut writer: W) -> StoreResult<()> {
    let count = u32::try_from(entries.len())
        .map_err(|_| StoreError::Snapshot(format!("too many entries: {}", entries.len())))?;

    writer.write_all(&SNAPSHOT_MAGIC)?;
    writer.write_all(&SNAPSHOT_VERSION.to_be_bytes())?;
    writer.write_all(&count.to_be_bytes())?;

    for entry in entries {
        let data = bincode::serialize(entry)?;
        if data.len() > MAX_ENTRY_SIZE {
            return Err(StoreError::Snapshot(format!(
                "entry {} too large: {} bytes",
                entry.name,
                data.len()
            )));
        }
        // Bounded by MAX_ENTRY_SIZE above.
        writer.write_all(&(data.len() as u32).to_be_bytes())?;
        writer.write_all(&data)?;
    }

    writer.flush()?;
    Ok(())
}

/// Encodes `entries` into a fresh buffer.
pub fn encode_snapshot_to_vec(entries: &[SnapshotEntry]) -> StoreResult<Vec<u8>> {
    let mut buf = Vec::new();
    encode_snapshot(entries, &mut buf)?;
    Ok(buf)
}

/// Reads a whole snapshot. The reader must end exactly where the snapshot does.
pub fn decode_snapshot<R: Read>(mut reader: R) -> StoreResult<Vec<SnapshotEntry>> {
    let mut magic = [0u8; 4];
    read_exact(&mut reader, &mut magic, "magic")?;
    if magic != SNAPSHOT_MAGIC {
        return Err(StoreError::Snapshot(format!("bad magic: {magic:02x?}")));
    }

    let mut version = [0u8; 2];
    read_exact(&mut reader, &mut version, "version")?;
    let version = u16::from_be_bytes(version);
    if version != SNAPSHOT_VERSION {
        return Err(StoreError::Snapshot(format!(
            "unsupported version: {version}"
        )));
    }

    let mut count = [0u8; 4];
    read_exact(&mut reader, &mut count, "entry count")?;
    let count = u32::from_be_bytes(count) as usize;

    // The count is untrusted; grow as entries actually arrive.
    let mut entries = Vec::with_capacity(count.min(1024));
    for _ in 0..count {
        let mut len = [0u8; 4];
        read_exact(&mut reader, &mut len, "entry length")?;
        let len = u32::from_be_bytes(len) as usize;
        if len > MAX_ENTRY_SIZE {
            return Err(StoreError::Snapshot(format!("entry too large: {len} bytes")));
        }

        let mut buf = vec![0u8; len];
        read_exact(&mut reader, &mut buf, "entry body")?;
        entries.push(bincode::deserialize(&buf)?);
    }

    let mut probe = [0u8; 1];
    loop {
        match reader.read(&mut probe) {
            Ok(0) => break,
            Ok(_) => return Err(StoreError::Snapshot("trailing bytes after last entry".into())),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(entries)
}

fn read_exact<R: Read>(reader: &mut R, buf: &mut [u8], what: &str) -> StoreResult<()> {
    reader.read_exact(buf).map_err(|e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            StoreError::Snapshot(format!("truncated {what}"))
        } else {
            StoreError::Io(e)
        }
    })
}
