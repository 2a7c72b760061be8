//! Database Snapshots
//!
//! A snapshot is a compressed, self-describing binary encoding of one
//! database's live entries at save time: one file per database, named
//! `<db>.skv` under the data directory, fully replacing any prior file on
//! each save.
//!
//! ## File layout
//!
//! ```text
//! +------+---------+-------------+--------------------------+
//! | SHKV | version | crc32 (LE)  | zstd-compressed payload  |
//! +------+---------+-------------+--------------------------+
//! ```
//!
//! The payload is a record stream: a `u64` entry count, then per entry an
//! optional remaining-TTL opcode, a type byte (string or hash), and
//! length-prefixed key/value bytes. TTLs are stored as *remaining*
//! milliseconds, and keys carry no shard index: load re-routes every key
//! through the current hasher and shard count, so snapshots move freely
//! between shard configurations.
//!
//! Save copies entries out under brief per-shard locks and does all
//! serialization, compression, and file I/O outside any lock. The result is
//! a point-in-time view that is best-effort with respect to concurrent
//! writers.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

use crate::errors::{StoreError, StoreResult};
use crate::storage::engine::{Database, DatabaseOptions, Value};

const MAGIC: &[u8; 4] = b"SHKV";
const VERSION: u8 = 1;

/// Record prefix marking an entry that carries a remaining TTL.
const OP_EXPIRE_MS: u8 = 0xFC;

const TYPE_STRING: u8 = 0;
const TYPE_HASH: u8 = 1;

/// Compression level passed to zstd; the default level trades well between
/// snapshot size and save latency.
const ZSTD_LEVEL: i32 = 3;

/// Path of the snapshot file for a database name.
pub fn snapshot_path(dir: &Path, name: &str) -> PathBuf {
    dir.join(format!("{}.skv", name))
}

/// Serializes and writes the database's live entries to its snapshot file.
pub fn save(dir: &Path, db: &Database) -> StoreResult<()> {
    let entries = db.live_entries();
    let count = entries.len();

    let mut payload = BytesMut::with_capacity(64 + count * 32);
    payload.put_u64_le(count as u64);
    for (key, value, ttl) in entries {
        encode_entry(&mut payload, &key, &value, ttl);
    }

    let compressed = zstd::encode_all(&payload[..], ZSTD_LEVEL).map_err(StoreError::Io)?;
    let crc = crc32fast::hash(&compressed);

    let mut file = Vec::with_capacity(MAGIC.len() + 5 + compressed.len());
    file.extend_from_slice(MAGIC);
    file.push(VERSION);
    file.extend_from_slice(&crc.to_le_bytes());
    file.extend_from_slice(&compressed);

    fs::create_dir_all(dir)?;
    let path = snapshot_path(dir, db.name());
    let tmp = path.with_extension("skv.tmp");
    fs::write(&tmp, &file)?;
    fs::rename(&tmp, &path)?;

    info!(
        db = db.name(),
        entries = count,
        bytes = file.len(),
        path = %path.display(),
        "snapshot saved"
    );
    Ok(())
}

/// Reads a snapshot file and rebuilds the database with the *currently*
/// configured options (shard count and hasher may differ from save time).
pub fn load(dir: &Path, name: &str, opts: DatabaseOptions) -> StoreResult<Database> {
    let path = snapshot_path(dir, name);
    let file = match fs::read(&path) {
        Ok(f) => f,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            return Err(StoreError::SnapshotNotFound(name.to_string()));
        }
        Err(e) => return Err(e.into()),
    };

    if file.len() < MAGIC.len() + 5 {
        return Err(StoreError::Corrupt("file shorter than header".into()));
    }
    if &file[..4] != MAGIC {
        return Err(StoreError::Corrupt("bad magic".into()));
    }
    if file[4] != VERSION {
        return Err(StoreError::Corrupt(format!("unsupported version {}", file[4])));
    }
    let crc = u32::from_le_bytes([file[5], file[6], file[7], file[8]]);
    let compressed = &file[9..];
    if crc32fast::hash(compressed) != crc {
        return Err(StoreError::Corrupt("checksum mismatch".into()));
    }

    let payload = zstd::decode_all(compressed)
        .map_err(|e| StoreError::Corrupt(format!("decompression failed: {}", e)))?;
    let mut cursor = Bytes::from(payload);

    if cursor.remaining() < 8 {
        return Err(StoreError::Corrupt("missing entry count".into()));
    }
    let count = cursor.get_u64_le();

    let db = Database::new(name, opts);
    for _ in 0..count {
        let (key, value, ttl) = decode_entry(&mut cursor)?;
        db.set_value(key, value, ttl);
    }
    debug!(db = name, entries = count, "snapshot decoded");
    Ok(db)
}

fn encode_entry(buf: &mut BytesMut, key: &Bytes, value: &Value, ttl: Option<Duration>) {
    if let Some(ttl) = ttl {
        buf.put_u8(OP_EXPIRE_MS);
        buf.put_u64_le(ttl.as_millis() as u64);
    }
    match value {
        Value::Str(b) => {
            buf.put_u8(TYPE_STRING);
            put_bytes(buf, key);
            put_bytes(buf, b);
        }
        Value::Hash(map) => {
            buf.put_u8(TYPE_HASH);
            put_bytes(buf, key);
            buf.put_u32_le(map.len() as u32);
            for (field, v) in map {
                put_bytes(buf, field);
                put_bytes(buf, v);
            }
        }
    }
}

fn decode_entry(cursor: &mut Bytes) -> StoreResult<(Bytes, Value, Option<Duration>)> {
    let mut opcode = take_u8(cursor)?;
    let ttl = if opcode == OP_EXPIRE_MS {
        let ms = take_u64(cursor)?;
        opcode = take_u8(cursor)?;
        Some(Duration::from_millis(ms))
    } else {
        None
    };

    let key = take_bytes(cursor)?;
    let value = match opcode {
        TYPE_STRING => Value::Str(take_bytes(cursor)?),
        TYPE_HASH => {
            let fields = take_u32(cursor)? as usize;
            let mut map = std::collections::HashMap::with_capacity(fields);
            for _ in 0..fields {
                let field = take_bytes(cursor)?;
                let v = take_bytes(cursor)?;
                map.insert(field, v);
            }
            Value::Hash(map)
        }
        other => {
            return Err(StoreError::Corrupt(format!("unknown value type {:#04x}", other)));
        }
    };
    Ok((key, value, ttl))
}

fn put_bytes(buf: &mut BytesMut, b: &[u8]) {
    buf.put_u32_le(b.len() as u32);
    buf.put_slice(b);
}

fn take_u8(cursor: &mut Bytes) -> StoreResult<u8> {
    if cursor.remaining() < 1 {
        return Err(StoreError::Corrupt("truncated record".into()));
    }
    Ok(cursor.get_u8())
}

fn take_u32(cursor: &mut Bytes) -> StoreResult<u32> {
    if cursor.remaining() < 4 {
        return Err(StoreError::Corrupt("truncated record".into()));
    }
    Ok(cursor.get_u32_le())
}

fn take_u64(cursor: &mut Bytes) -> StoreResult<u64> {
    if cursor.remaining() < 8 {
        return Err(StoreError::Corrupt("truncated record".into()));
    }
    Ok(cursor.get_u64_le())
}

fn take_bytes(cursor: &mut Bytes) -> StoreResult<Bytes> {
    let len = take_u32(cursor)? as usize;
    if cursor.remaining() < len {
        return Err(StoreError::Corrupt("truncated record".into()));
    }
    Ok(cursor.split_to(len))
}
