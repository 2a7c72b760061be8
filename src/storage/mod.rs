//! Storage Module
//!
//! The core engine: pluggable key hashing, sharded per-database storage
//! with TTL and LRU eviction, the process-wide database registry, and the
//! background expiry sweeper.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                        Registry                          │
//! │   "default" ──► Database ── Shard 0 │ Shard 1 │ ... N    │
//! │   "orders"  ──► Database ── Shard 0 │ Shard 1 │ ... N    │
//! └──────────────────────────────────────────────────────────┘
//!                            ▲
//!                            │ one shard lock at a time
//!              ┌─────────────┴─────────────┐
//!              │      ExpirySweeper        │
//!              │  (background tokio task)  │
//!              └───────────────────────────┘
//! ```
//!
//! Every shard is independently lockable; a key's shard is
//! `hasher(key) % shard_count` and never changes for a database's
//! lifetime.

pub mod engine;
pub mod expiry;
pub mod hasher;
pub mod registry;

// Re-export commonly used types
pub use engine::{Database, DatabaseOptions, Entry, Value};
pub use expiry::{start_expiry_sweeper, ExpiryConfig, ExpirySweeper};
pub use hasher::KeyHasher;
pub use registry::{Registry, RegistryOptions, DEFAULT_DB};
