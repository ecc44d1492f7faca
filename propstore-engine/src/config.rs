//! Store configuration.

use serde::{Deserialize, Serialize};

use crate::StoreResult;

/// When writes reach the physical accessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommitMode {
    /// Every write is mirrored before the call returns; nothing is ever dirty.
    Immediate,
    /// Writes accumulate locally until `commit`.
    #[default]
    Staged,
}

impl CommitMode {
    #[must_use]
    pub fn from_immediate(immediate: bool) -> Self {
        if immediate {
            Self::Immediate
        } else {
            Self::Staged
        }
    }

    #[must_use]
    pub fn is_immediate(self) -> bool {
        self == Self::Immediate
    }
}

/// Construction options for a [`PropertyStore`](crate::PropertyStore).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StoreConfig {
    /// Mirror every write immediately instead of staging it.
    pub immediate_commit: bool,
    /// Check every access against the descriptor set.
    pub validation: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            immediate_commit: false,
            validation: true,
        }
    }
}

impl StoreConfig {
    /// Parses a JSON config object; absent fields take the defaults.
    pub fn from_json_str(json: &str) -> StoreResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    #[must_use]
    pub fn mode(&self) -> CommitMode {
        CommitMode::from_immediate(self.immediate_commit)
    }
}
