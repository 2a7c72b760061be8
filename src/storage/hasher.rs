//! Pluggable Key Hashing
//!
//! Shard routing is `hash(key) % shard_count`, so the hash function decides
//! how evenly keys spread across shards. The strategy is picked once at
//! process start (`--hash`) and must never change while keys exist: routing
//! is pure and a different function would strand existing keys in the wrong
//! shard.
//!
//! Strategies trade speed for distribution quality:
//!
//! - `sum` (default): adds the key bytes. Nearly free, but anagram keys
//!   collide.
//! - `xor`: folds the key bytes with XOR. Free, worst distribution.
//! - `djb2`: the classic `hash * 33 + c` mixer.
//! - `sdbm`: the sdbm database mixer, best spread of the four.

use std::fmt;
use std::str::FromStr;

/// A key-to-`u64` hash strategy. Pure and deterministic within a process
/// run; different strategies need not agree with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyHasher {
    /// Additive byte sum. Fast, low quality.
    Sum,
    /// XOR fold of all bytes. Only ever produces values below 256.
    Xor,
    /// Bernstein's `hash * 33 + c`.
    Djb2,
    /// `c + (hash << 6) + (hash << 16) - hash`.
    Sdbm,
}

impl KeyHasher {
    /// Hashes a key. Callers reduce the result modulo the shard count.
    #[inline]
    pub fn hash(&self, key: &[u8]) -> u64 {
        match self {
            KeyHasher::Sum => key.iter().map(|b| *b as u64).sum(),
            KeyHasher::Xor => key.iter().fold(0u8, |acc, b| acc ^ *b) as u64,
            KeyHasher::Djb2 => key
                .iter()
                .fold(5381u64, |hash, b| hash.wrapping_mul(33).wrapping_add(*b as u64)),
            KeyHasher::Sdbm => key.iter().fold(0u64, |hash, b| {
                (*b as u64)
                    .wrapping_add(hash << 6)
                    .wrapping_add(hash << 16)
                    .wrapping_sub(hash)
            }),
        }
    }

    /// The name this strategy is selected by on the command line.
    pub fn name(&self) -> &'static str {
        match self {
            KeyHasher::Sum => "sum",
            KeyHasher::Xor => "xor",
            KeyHasher::Djb2 => "djb2",
            KeyHasher::Sdbm => "sdbm",
        }
    }
}

impl Default for KeyHasher {
    fn default() -> Self {
        KeyHasher::Sum
    }
}

impl fmt::Display for KeyHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for KeyHasher {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sum" => Ok(KeyHasher::Sum),
            "xor" => Ok(KeyHasher::Xor),
            "djb2" => Ok(KeyHasher::Djb2),
            "sdbm" => Ok(KeyHasher::Sdbm),
            other => Err(format!(
                "unknown hash strategy '{}' (expected sum, xor, djb2 or sdbm)",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deterministic() {
        for hasher in [KeyHasher::Sum, KeyHasher::Xor, KeyHasher::Djb2, KeyHasher::Sdbm] {
            let a = hasher.hash(b"user:1001");
            let b = hasher.hash(b"user:1001");
            assert_eq!(a, b, "{} must be deterministic", hasher);
        }
    }

    #[test]
    fn test_sum_is_additive() {
        assert_eq!(KeyHasher::Sum.hash(b"ab"), (b'a' + b'b') as u64);
        // Anagrams collide under the additive sum.
        assert_eq!(KeyHasher::Sum.hash(b"ab"), KeyHasher::Sum.hash(b"ba"));
    }

    #[test]
    fn test_djb2_separates_anagrams() {
        assert_ne!(KeyHasher::Djb2.hash(b"ab"), KeyHasher::Djb2.hash(b"ba"));
    }

    #[test]
    fn test_xor_stays_below_256() {
        for key in [&b"hello"[..], b"a-much-longer-key-with-many-bytes", b""] {
            assert!(KeyHasher::Xor.hash(key) < 256);
        }
    }

    #[test]
    fn test_parse_names() {
        assert_eq!("sum".parse::<KeyHasher>().unwrap(), KeyHasher::Sum);
        assert_eq!("djb2".parse::<KeyHasher>().unwrap(), KeyHasher::Djb2);
        assert_eq!("sdbm".parse::<KeyHasher>().unwrap(), KeyHasher::Sdbm);
        assert_eq!("xor".parse::<KeyHasher>().unwrap(), KeyHasher::Xor);
        assert!("fnv".parse::<KeyHasher>().is_err());
    }

    #[test]
    fn test_empty_key() {
        // An empty key routes somewhere stable rather than panicking.
        for hasher in [KeyHasher::Sum, KeyHasher::Xor, KeyHasher::Djb2, KeyHasher::Sdbm] {
            let _ = hasher.hash(b"");
        }
    }
}
