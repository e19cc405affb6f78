//! Storage layer for Simplix
//!
//! This crate provides the embedded key-value store used for client-side
//! preference and notification snapshots, plus the versioned snapshot
//! envelope written through it.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod kv;
pub mod snapshot;

pub use kv::{KvConfig, KvError, KvStore};
pub use snapshot::{SnapshotError, SnapshotStore};
