//! Versioned snapshot envelope
//!
//! Stores serialize their full state through this module. Each snapshot is
//! wrapped in an envelope carrying a schema version and an md5 checksum of
//! the payload, so a future schema change or a corrupted value can be told
//! apart from a missing one.

use serde::{de::DeserializeOwned, Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::kv::{KvError, KvStore};

/// Snapshot error types
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// KV store error
    #[error("KV store error: {0}")]
    Kv(#[from] KvError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Checksum mismatch on load
    #[error("Corruption detected for key {key}: expected {expected}, got {found}")]
    Corruption {
        /// Snapshot key
        key: String,
        /// Checksum stored in the envelope
        expected: String,
        /// Checksum recomputed from the payload
        found: String,
    },

    /// Schema version mismatch on load
    #[error("Version mismatch for key {key}: expected {expected}, found {found}")]
    VersionMismatch {
        /// Snapshot key
        key: String,
        /// Version this store writes
        expected: u32,
        /// Version found in the envelope
        found: u32,
    },
}

/// Result type for snapshot operations
pub type Result<T> = std::result::Result<T, SnapshotError>;

/// Envelope written to the KV store for each snapshot key
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Envelope {
    /// Schema version of the payload
    version: u32,
    /// md5 of the serialized payload
    checksum: String,
    /// The payload itself, pre-serialized
    data: serde_json::Value,
}

fn checksum_of(data: &serde_json::Value) -> Result<String> {
    let json = serde_json::to_string(data)?;
    Ok(format!("{:x}", md5::compute(&json)))
}

/// Keyed, versioned snapshot writer over a [`KvStore`]
pub struct SnapshotStore {
    kv: Arc<KvStore>,
    version: u32,
}

impl SnapshotStore {
    /// Create a snapshot store writing envelopes at the given schema version
    pub fn new(kv: Arc<KvStore>, version: u32) -> Self {
        Self { kv, version }
    }

    /// Serialize `data` and write it under `key`
    pub fn save<T: Serialize>(&self, key: &str, data: &T) -> Result<()> {
        let data = serde_json::to_value(data)?;
        let checksum = checksum_of(&data)?;
        let envelope = Envelope { version: self.version, checksum, data };
        self.kv.set(key, &envelope)?;
        Ok(())
    }

    /// Load and verify the snapshot under `key`
    ///
    /// Returns `Ok(None)` when no snapshot has ever been written. A wrong
    /// version or a failed checksum is an error; callers decide whether to
    /// absorb it and start fresh.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        let envelope: Envelope = match self.kv.get(key)? {
            Some(envelope) => envelope,
            None => return Ok(None),
        };

        if envelope.version != self.version {
            return Err(SnapshotError::VersionMismatch {
                key: key.to_string(),
                expected: self.version,
                found: envelope.version,
            });
        }

        let found = checksum_of(&envelope.data)?;
        if found != envelope.checksum {
            return Err(SnapshotError::Corruption {
                key: key.to_string(),
                expected: envelope.checksum,
                found,
            });
        }

        let data: T = serde_json::from_value(envelope.data)?;
        Ok(Some(data))
    }

    /// Remove the snapshot under `key`, returning whether one existed
    pub fn remove(&self, key: &str) -> Result<bool> {
        Ok(self.kv.remove(key)?)
    }
}
