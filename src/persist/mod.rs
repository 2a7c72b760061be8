//! Persistence Module
//!
//! Explicit, operator-driven snapshot save/load for single databases.
//! Snapshots are not a write-ahead log and carry no crash-consistency
//! guarantee; they capture a best-effort point-in-time view on SAVE and
//! rebuild a database on LOADDB.

pub mod snapshot;

pub use snapshot::{load, save, snapshot_path};
