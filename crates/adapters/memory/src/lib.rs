//! # rulehub-adapter-memory
//!
//! In-memory implementations of the collaborator ports, for local runs and
//! integration tests.
//!
//! | Adapter | Port | Behaviour |
//! |---------|------|-----------|
//! | [`MemoryKeyValueStore`] | `KeyValueStore` | Per-workspace key/value map, tombstones kept as `null` |
//! | [`MemoryRecordStore`] | `RecordStore` | Tables of records with equality queries and atomic field writes |
//! | [`MemoryTaskInbox`] | `TaskInbox` | Records every posted task for inspection |
//!
//! ## Dependency rule
//!
//! Depends on `rulehub-app` (port traits) and `rulehub-domain` only.

mod kv;
mod records;
mod tasks;

pub use kv::MemoryKeyValueStore;
pub use records::MemoryRecordStore;
pub use tasks::{MemoryTaskInbox, PostedTask};
