//! Sharded Storage Engine
//!
//! One [`Database`] owns a fixed array of shards. A key lives in shard
//! `hasher(key) % shard_count`, and that routing never changes for the
//! lifetime of the database. Each shard is guarded by its own `Mutex`, so
//! operations on distinct shards never contend; within a shard, operations
//! are serialized but brief.
//!
//! ## Expiry and eviction
//!
//! Expiry is lazy-primary: every access checks `expires_at` and removes an
//! expired entry on the spot, so correctness never depends on the background
//! sweeper in [`crate::storage::expiry`]. Eviction is per-shard LRU and only
//! kicks in when a memory ceiling is configured: each shard owns an equal
//! slice of the database ceiling and evicts from its own least-recently-used
//! end. A write is never rejected for memory pressure; eviction is
//! best-effort with a bounded number of removals per write.
//!
//! ## LRU bookkeeping
//!
//! Recency is tracked through an indirection instead of intrusive links:
//! every touch assigns the entry a fresh tick from a shard-local counter,
//! and a `BTreeMap<tick, key>` orders keys by recency. Ticks are unique
//! within a shard, so the tree and the entry map stay in exact bijection.

use bytes::Bytes;
use std::collections::{BTreeMap, HashMap};
use std::sync::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::errors::{StoreError, StoreResult};
use crate::storage::hasher::KeyHasher;

/// Flat per-entry overhead estimate added to key and value sizes when
/// charging an entry against the memory ceiling.
const ENTRY_OVERHEAD: usize = 64;

/// Upper bound on LRU removals a single write will perform before giving up
/// and letting the write land anyway.
const MAX_EVICTIONS_PER_WRITE: usize = 128;

/// A stored value: either a plain byte string or a flat field-value map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    /// Binary-safe string value.
    Str(Bytes),
    /// Flat hash-map value (HSET/HGET family).
    Hash(HashMap<Bytes, Bytes>),
}

impl Value {
    /// Approximate heap footprint, used for memory-ceiling accounting.
    pub fn mem_size(&self) -> usize {
        match self {
            Value::Str(b) => b.len(),
            Value::Hash(m) => m.iter().map(|(k, v)| k.len() + v.len()).sum(),
        }
    }
}

/// A single stored entry with its expiry state and LRU handle.
#[derive(Debug, Clone)]
pub struct Entry {
    pub value: Value,
    /// Absolute expiry instant; `None` means the entry never expires.
    pub expires_at: Option<Instant>,
    /// Shard-local recency tick; only meaningful while LRU tracking is on.
    last_used: u64,
}

impl Entry {
    fn new(value: Value, ttl: Option<Duration>) -> Self {
        Self {
            value,
            expires_at: ttl.map(|t| Instant::now() + t),
            last_used: 0,
        }
    }

    #[inline]
    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.map(|at| now >= at).unwrap_or(false)
    }

    /// Remaining time to live, or `None` for persistent entries.
    /// Returns a zero duration for entries already due.
    pub fn remaining_ttl(&self, now: Instant) -> Option<Duration> {
        self.expires_at.map(|at| at.saturating_duration_since(now))
    }
}

/// One lockable partition of a database's key space.
struct Shard {
    entries: HashMap<Bytes, Entry>,
    /// Recency order, oldest tick first. Empty when LRU tracking is off.
    lru: BTreeMap<u64, Bytes>,
    mem_used: usize,
    tick: u64,
}

impl Shard {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            lru: BTreeMap::new(),
            mem_used: 0,
            tick: 0,
        }
    }

    fn charge(key: &Bytes, value: &Value) -> usize {
        key.len() + value.mem_size() + ENTRY_OVERHEAD
    }

    /// Moves an entry to the most-recently-used end.
    fn touch(&mut self, key: &Bytes, track_lru: bool) {
        if !track_lru {
            return;
        }
        if let Some(entry) = self.entries.get_mut(key) {
            self.lru.remove(&entry.last_used);
            self.tick += 1;
            entry.last_used = self.tick;
            self.lru.insert(self.tick, key.clone());
        }
    }

    /// Inserts or replaces an entry, keeping LRU and memory accounting
    /// consistent.
    fn insert(&mut self, key: Bytes, mut entry: Entry, track_lru: bool) {
        self.mem_used += Self::charge(&key, &entry.value);
        if track_lru {
            self.tick += 1;
            entry.last_used = self.tick;
            self.lru.insert(self.tick, key.clone());
        }
        if let Some(old) = self.entries.insert(key.clone(), entry) {
            self.mem_used -= Self::charge(&key, &old.value);
            if track_lru {
                self.lru.remove(&old.last_used);
            }
        }
    }

    /// Removes an entry and its LRU handle.
    fn remove(&mut self, key: &Bytes) -> Option<Entry> {
        let entry = self.entries.remove(key)?;
        self.mem_used -= Self::charge(key, &entry.value);
        self.lru.remove(&entry.last_used);
        Some(entry)
    }

    /// Drops every entry whose expiry is due. Returns how many were removed.
    fn purge_expired(&mut self, now: Instant) -> u64 {
        let due: Vec<Bytes> = self
            .entries
            .iter()
            .filter(|(_, e)| e.is_expired(now))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &due {
            self.remove(key);
        }
        due.len() as u64
    }

    /// Best-effort eviction toward this shard's ceiling slice: expired
    /// entries first, then least-recently-used ones. Never loops more than
    /// `MAX_EVICTIONS_PER_WRITE` times.
    fn evict_for(&mut self, incoming: usize, ceiling: usize, track_lru: bool) -> u64 {
        if self.mem_used + incoming <= ceiling {
            return 0;
        }
        let mut evicted = self.purge_expired(Instant::now());
        if track_lru {
            let mut attempts = 0;
            while self.mem_used + incoming > ceiling && attempts < MAX_EVICTIONS_PER_WRITE {
                let Some((tick, key)) = self.lru.pop_first() else {
                    break;
                };
                // pop_first already dropped the LRU handle
                if let Some(entry) = self.entries.remove(&key) {
                    self.mem_used -= Self::charge(&key, &entry.value);
                    debug_assert_eq!(entry.last_used, tick);
                }
                evicted += 1;
                attempts += 1;
            }
        }
        evicted
    }

    fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
        self.mem_used = 0;
    }
}

/// Tunables fixed at database creation time.
#[derive(Debug, Clone)]
pub struct DatabaseOptions {
    /// Number of shards; immutable for the database's lifetime.
    pub shard_count: usize,
    /// The routing hash strategy, shared process-wide.
    pub hasher: KeyHasher,
    /// Per-database memory ceiling in bytes; `None` disables eviction.
    pub max_memory: Option<usize>,
    /// Whether to maintain LRU recency order (enables LRU eviction).
    pub track_lru: bool,
}

impl Default for DatabaseOptions {
    fn default() -> Self {
        Self {
            shard_count: 256,
            hasher: KeyHasher::default(),
            max_memory: None,
            track_lru: false,
        }
    }
}

/// A named database: the unit of isolation and of snapshot save/load.
///
/// Designed to be wrapped in an `Arc` and shared across every client
/// session that has it selected.
pub struct Database {
    name: String,
    shards: Vec<Mutex<Shard>>,
    opts: DatabaseOptions,
    /// Each shard's slice of the database memory ceiling.
    shard_ceiling: Option<usize>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.name)
            .field("shards", &self.opts.shard_count)
            .field("size", &self.size())
            .finish()
    }
}

impl Database {
    pub fn new(name: impl Into<String>, opts: DatabaseOptions) -> Self {
        debug_assert!(opts.shard_count > 0);
        let shards = (0..opts.shard_count).map(|_| Mutex::new(Shard::new())).collect();
        let shard_ceiling = opts.max_memory.map(|m| (m / opts.shard_count).max(1));
        Self {
            name: name.into(),
            shards,
            opts,
            shard_ceiling,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shard_count(&self) -> usize {
        self.opts.shard_count
    }

    #[inline]
    fn shard_for(&self, key: &[u8]) -> &Mutex<Shard> {
        let idx = (self.opts.hasher.hash(key) % self.opts.shard_count as u64) as usize;
        &self.shards[idx]
    }

    /// Looks up a string value. An expired entry is removed and reported
    /// absent; a hit refreshes the entry's LRU position.
    pub fn get(&self, key: &Bytes) -> StoreResult<Option<Bytes>> {
        let mut shard = self.shard_for(key).lock().unwrap();
        let Some(entry) = shard.entries.get(key) else {
            return Ok(None);
        };
        if entry.is_expired(Instant::now()) {
            shard.remove(key);
            return Ok(None);
        }
        match &entry.value {
            Value::Str(b) => {
                let out = b.clone();
                shard.touch(key, self.opts.track_lru);
                Ok(Some(out))
            }
            Value::Hash(_) => Err(StoreError::WrongType),
        }
    }

    /// Inserts or overwrites a string value, resetting any previous expiry.
    pub fn set(&self, key: Bytes, value: Bytes, ttl: Option<Duration>) {
        self.set_value(key, Value::Str(value), ttl);
    }

    /// Inserts or overwrites any value kind. Shared by SET, snapshot
    /// loading, and the hash-creation path.
    pub(crate) fn set_value(&self, key: Bytes, value: Value, ttl: Option<Duration>) {
        let mut shard = self.shard_for(&key).lock().unwrap();
        if let Some(ceiling) = self.shard_ceiling {
            let incoming = Shard::charge(&key, &value);
            let evicted = shard.evict_for(incoming, ceiling, self.opts.track_lru);
            if evicted > 0 {
                debug!(db = %self.name, evicted, "evicted entries under memory pressure");
            }
        }
        shard.insert(key, Entry::new(value, ttl), self.opts.track_lru);
    }

    /// Removes a key. Returns whether it was present (an expired entry
    /// counts as absent).
    pub fn delete(&self, key: &Bytes) -> bool {
        let mut shard = self.shard_for(key).lock().unwrap();
        match shard.remove(key) {
            Some(entry) => !entry.is_expired(Instant::now()),
            None => false,
        }
    }

    /// Removes a batch of keys, grouped per shard so each shard lock is
    /// taken once. Returns how many were present.
    pub fn delete_many(&self, keys: &[Bytes]) -> u64 {
        let mut by_shard: HashMap<usize, Vec<&Bytes>> = HashMap::new();
        for key in keys {
            let idx = (self.opts.hasher.hash(key) % self.opts.shard_count as u64) as usize;
            by_shard.entry(idx).or_default().push(key);
        }
        let now = Instant::now();
        let mut deleted = 0;
        for (idx, keys) in by_shard {
            let mut shard = self.shards[idx].lock().unwrap();
            for key in keys {
                if let Some(entry) = shard.remove(key) {
                    if !entry.is_expired(now) {
                        deleted += 1;
                    }
                }
            }
        }
        deleted
    }

    /// Counts how many of the given keys currently exist. Duplicates count
    /// every time, as in Redis EXISTS.
    pub fn exists_count(&self, keys: &[Bytes]) -> u64 {
        let now = Instant::now();
        keys.iter()
            .filter(|key| {
                let mut shard = self.shard_for(key).lock().unwrap();
                let expired = matches!(shard.entries.get(*key), Some(e) if e.is_expired(now));
                if expired {
                    shard.remove(key);
                    return false;
                }
                shard.entries.contains_key(*key)
            })
            .count() as u64
    }

    /// Sets hash fields. Creates a fresh hash when the key is absent;
    /// returns the number of fields that did not exist before.
    pub fn hset(&self, key: Bytes, pairs: Vec<(Bytes, Bytes)>) -> StoreResult<i64> {
        let mut shard = self.shard_for(&key).lock().unwrap();
        let now = Instant::now();

        let expired = matches!(shard.entries.get(&key), Some(e) if e.is_expired(now));
        if expired {
            shard.remove(&key);
        }
        let absent = !shard.entries.contains_key(&key);
        if !absent {
            let entry = &shard.entries[&key];
            if !matches!(entry.value, Value::Hash(_)) {
                return Err(StoreError::WrongType);
            }
        }

        if absent {
            drop(shard);
            let map: HashMap<Bytes, Bytes> = pairs.into_iter().collect();
            // Duplicate fields in one call collapse; count what landed.
            let added = map.len() as i64;
            self.set_value(key, Value::Hash(map), None);
            return Ok(added);
        }

        let key_len = key.len();
        let entry = shard.entries.get_mut(&key).unwrap();
        let before = key_len + entry.value.mem_size() + ENTRY_OVERHEAD;
        let Value::Hash(map) = &mut entry.value else {
            unreachable!("checked above");
        };
        let mut added = 0;
        for (field, value) in pairs {
            if map.insert(field, value).is_none() {
                added += 1;
            }
        }
        let after = key_len + entry.value.mem_size() + ENTRY_OVERHEAD;
        shard.mem_used = shard.mem_used + after - before;
        shard.touch(&key, self.opts.track_lru);
        Ok(added)
    }

    /// Reads one hash field.
    pub fn hget(&self, key: &Bytes, field: &Bytes) -> StoreResult<Option<Bytes>> {
        let mut shard = self.shard_for(key).lock().unwrap();
        let Some(entry) = shard.entries.get(key) else {
            return Ok(None);
        };
        if entry.is_expired(Instant::now()) {
            shard.remove(key);
            return Ok(None);
        }
        match &entry.value {
            Value::Hash(map) => {
                let out = map.get(field).cloned();
                shard.touch(key, self.opts.track_lru);
                Ok(out)
            }
            Value::Str(_) => Err(StoreError::WrongType),
        }
    }

    /// Reads all fields of a hash. An absent key yields an empty vec.
    pub fn hgetall(&self, key: &Bytes) -> StoreResult<Vec<(Bytes, Bytes)>> {
        let mut shard = self.shard_for(key).lock().unwrap();
        let Some(entry) = shard.entries.get(key) else {
            return Ok(Vec::new());
        };
        if entry.is_expired(Instant::now()) {
            shard.remove(key);
            return Ok(Vec::new());
        }
        match &entry.value {
            Value::Hash(map) => {
                let out = map.iter().map(|(f, v)| (f.clone(), v.clone())).collect();
                shard.touch(key, self.opts.track_lru);
                Ok(out)
            }
            Value::Str(_) => Err(StoreError::WrongType),
        }
    }

    /// Deletes hash fields; removes the key entirely once its hash is
    /// empty. Returns the number of fields removed.
    pub fn hdel(&self, key: &Bytes, fields: &[Bytes]) -> StoreResult<i64> {
        let mut shard = self.shard_for(key).lock().unwrap();
        let Some(entry) = shard.entries.get_mut(key) else {
            return Ok(0);
        };
        if entry.is_expired(Instant::now()) {
            shard.remove(key);
            return Ok(0);
        }
        let Value::Hash(map) = &mut entry.value else {
            return Err(StoreError::WrongType);
        };
        let before: usize = map.iter().map(|(f, v)| f.len() + v.len()).sum();
        let mut removed = 0;
        for field in fields {
            if map.remove(field).is_some() {
                removed += 1;
            }
        }
        let after: usize = map.iter().map(|(f, v)| f.len() + v.len()).sum();
        let emptied = map.is_empty();
        shard.mem_used -= before - after;
        if emptied {
            shard.remove(key);
        } else {
            shard.touch(key, self.opts.track_lru);
        }
        Ok(removed)
    }

    /// Clears every shard. Each shard is cleared under its own lock, so
    /// concurrent writers may observe the flush mid-way; externally the
    /// database converges to empty.
    pub fn flush(&self) {
        for shard in &self.shards {
            shard.lock().unwrap().clear();
        }
    }

    /// Approximate entry count. No cross-shard lock is held, so the result
    /// is advisory under concurrent mutation.
    pub fn size(&self) -> usize {
        self.shards.iter().map(|s| s.lock().unwrap().entries.len()).sum()
    }

    /// Purges expired entries in a single shard, used by the active sweeper
    /// so it never holds more than one lock between yields. `idx` wraps
    /// modulo the shard count.
    pub fn purge_expired_shard(&self, idx: usize) -> u64 {
        let mut shard = self.shards[idx % self.opts.shard_count].lock().unwrap();
        shard.purge_expired(Instant::now())
    }

    /// Copies out every live entry with its remaining TTL, one shard lock
    /// at a time. Used by snapshot save; serialization happens outside any
    /// lock.
    pub fn live_entries(&self) -> Vec<(Bytes, Value, Option<Duration>)> {
        let mut out = Vec::new();
        for shard in &self.shards {
            let guard = shard.lock().unwrap();
            let now = Instant::now();
            for (key, entry) in guard.entries.iter() {
                if entry.is_expired(now) {
                    continue;
                }
                out.push((key.clone(), entry.value.clone(), entry.remaining_ttl(now)));
            }
        }
        out
    }

    #[cfg(test)]
    fn assert_lru_consistent(&self) {
        for shard in &self.shards {
            let guard = shard.lock().unwrap();
            if !self.opts.track_lru {
                assert!(guard.lru.is_empty());
                continue;
            }
            assert_eq!(guard.lru.len(), guard.entries.len());
            for (tick, key) in guard.lru.iter() {
                let entry = guard.entries.get(key).expect("lru key missing from map");
                assert_eq!(entry.last_used, *tick);
            }
        }
    }
}
