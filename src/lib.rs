//! # shardkv - A Sharded, Multi-Database In-Memory Key-Value Store
//!
//! shardkv speaks a subset of the Redis RESP protocol and serves point
//! lookups, point writes, and TTL-based expiration out of memory. Unlike a
//! single-keyspace cache it manages multiple independently named databases,
//! each of which can be saved to and reloaded from a compressed snapshot
//! file.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                            shardkv                               │
//! │                                                                  │
//! │  ┌────────────┐   ┌────────────┐   ┌───────────────┐             │
//! │  │ TCP Server │──>│ Connection │──>│ CommandHandler│ (session:   │
//! │  │ (Listener) │   │  Handler   │   │               │  current db)│
//! │  └────────────┘   └────────────┘   └───────┬───────┘             │
//! │                                            │                     │
//! │                                            ▼                     │
//! │  ┌────────────┐   ┌──────────────────────────────────────────┐   │
//! │  │    RESP    │   │                Registry                  │   │
//! │  │   Parser   │   │  "default" ─► Database ─ shard│shard│…   │   │
//! │  │            │   │  "orders"  ─► Database ─ shard│shard│…   │   │
//! │  └────────────┘   └──────────────────────────────────────────┘   │
//! │                              ▲                    │               │
//! │               ┌──────────────┘                    ▼               │
//! │        ┌──────┴────────┐              ┌────────────────────┐     │
//! │        │ ExpirySweeper │              │ Snapshot save/load │     │
//! │        │ (tokio task)  │              │  (<db>.skv, zstd)  │     │
//! │        └───────────────┘              └────────────────────┘     │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Supported Commands
//!
//! - Strings: `SET key value [EX s | PX ms]`, `GET`, `DEL`, `EXISTS`
//! - Hashes: `HSET key field value [field value ...]`, `HGET`, `HGETALL`,
//!   `HDEL`
//! - Databases: `SELECT`, `CREATEDB`, `LOADDB`, `SAVE`, `DBSIZE`,
//!   `FLUSHDB`, `FLUSHALL`
//! - Server: `PING`, `CONFIG GET save|appendonly`, `QUIT`
//!
//! ## Design Highlights
//!
//! Every database is split into a fixed number of independently locked
//! shards; a key's shard is `hash(key) % shard_count` under a hash
//! strategy chosen at startup. Expired keys are reclaimed lazily on access
//! and by a background sweeper; an optional per-database memory ceiling
//! triggers per-shard LRU eviction. See the module docs of [`storage`] and
//! [`persist`] for the details.

pub mod commands;
pub mod connection;
pub mod errors;
pub mod persist;
pub mod protocol;
pub mod storage;

// Re-export commonly used types for convenience
pub use commands::CommandHandler;
pub use connection::{handle_connection, ConnectionStats};
pub use errors::{StoreError, StoreResult};
pub use protocol::RespValue;
pub use storage::{
    start_expiry_sweeper, Database, DatabaseOptions, ExpiryConfig, ExpirySweeper, KeyHasher,
    Registry, RegistryOptions,
};

/// The default port shardkv listens on (same as Redis)
pub const DEFAULT_PORT: u16 = 6379;

/// The default host shardkv binds to
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of shardkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
