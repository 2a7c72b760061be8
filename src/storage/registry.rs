//! Named Database Registry
//!
//! Process-wide mapping from database name to [`Database`], shared by every
//! client session. The registry only synchronizes structural mutation
//! (create, load): lookups take the read lock, so sessions working on
//! different databases never block each other here. Registry locks are
//! never held across shard locks.
//!
//! A `default` database always exists; SELECT with a numeric index (Redis
//! client compatibility) routes to it. Databases are only removed by
//! process exit — there is no implicit eviction of whole databases.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, RwLock};
use tracing::info;

use crate::errors::{StoreError, StoreResult};
use crate::persist::snapshot;
use crate::storage::engine::{Database, DatabaseOptions};

/// Name of the database every session starts on.
pub const DEFAULT_DB: &str = "default";

/// Registry-level configuration fixed at process start.
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Upper bound on resident databases, the default included.
    pub max_databases: usize,
    /// Options applied to every database this registry creates or loads.
    pub db_opts: DatabaseOptions,
    /// Directory snapshot files are written to and loaded from.
    pub data_dir: PathBuf,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            max_databases: 10,
            db_opts: DatabaseOptions::default(),
            data_dir: PathBuf::from("."),
        }
    }
}

/// The process-wide database registry.
pub struct Registry {
    dbs: RwLock<HashMap<String, Arc<Database>>>,
    opts: RegistryOptions,
}

impl Registry {
    /// Creates a registry holding only the `default` database.
    pub fn new(opts: RegistryOptions) -> Self {
        let mut dbs = HashMap::new();
        dbs.insert(
            DEFAULT_DB.to_string(),
            Arc::new(Database::new(DEFAULT_DB, opts.db_opts.clone())),
        );
        Self {
            dbs: RwLock::new(dbs),
            opts,
        }
    }

    pub fn options(&self) -> &RegistryOptions {
        &self.opts
    }

    /// Resolves a database by name. Read-only; safe under concurrent
    /// create/load elsewhere.
    pub fn get(&self, name: &str) -> StoreResult<Arc<Database>> {
        self.dbs
            .read()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| StoreError::DbNotFound(name.to_string()))
    }

    /// The always-present default database.
    pub fn default_db(&self) -> Arc<Database> {
        self.get(DEFAULT_DB).expect("default database always registered")
    }

    /// Creates a fresh empty database. Fails when the name is taken or the
    /// registry is at capacity.
    pub fn create(&self, name: &str) -> StoreResult<Arc<Database>> {
        validate_name(name)?;
        let mut dbs = self.dbs.write().unwrap();
        if dbs.contains_key(name) {
            return Err(StoreError::DbAlreadyExists(name.to_string()));
        }
        if dbs.len() >= self.opts.max_databases {
            return Err(StoreError::DbLimit(self.opts.max_databases));
        }
        let db = Arc::new(Database::new(name, self.opts.db_opts.clone()));
        dbs.insert(name.to_string(), db.clone());
        info!(db = name, "database created");
        Ok(db)
    }

    /// Returns the named database, materializing it from its snapshot file
    /// when it is not already resident. Fails with `SnapshotNotFound` when
    /// no snapshot exists.
    pub fn load(&self, name: &str) -> StoreResult<Arc<Database>> {
        validate_name(name)?;
        if let Ok(db) = self.get(name) {
            return Ok(db);
        }
        // Snapshot decoding happens outside the registry lock; a concurrent
        // load of the same name is resolved at insert time below.
        let loaded = snapshot::load(&self.opts.data_dir, name, self.opts.db_opts.clone())?;
        let mut dbs = self.dbs.write().unwrap();
        if let Some(existing) = dbs.get(name) {
            return Ok(existing.clone());
        }
        if dbs.len() >= self.opts.max_databases {
            return Err(StoreError::DbLimit(self.opts.max_databases));
        }
        let db = Arc::new(loaded);
        dbs.insert(name.to_string(), db.clone());
        info!(db = name, entries = db.size(), "database loaded from snapshot");
        Ok(db)
    }

    /// Writes the named database's snapshot file.
    pub fn save(&self, name: &str) -> StoreResult<()> {
        let db = self.get(name)?;
        snapshot::save(&self.opts.data_dir, &db)
    }

    /// Clears the contents of every registered database, leaving them all
    /// registered.
    pub fn flush_all(&self) {
        let dbs: Vec<Arc<Database>> = self.dbs.read().unwrap().values().cloned().collect();
        for db in dbs {
            db.flush();
        }
    }

    /// Snapshot of the currently registered databases, for the sweeper.
    pub fn databases(&self) -> Vec<Arc<Database>> {
        self.dbs.read().unwrap().values().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.dbs.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Database names double as snapshot file names, so they must be UTF-8 and
/// free of path tricks.
fn validate_name(name: &str) -> StoreResult<()> {
    let ok = !name.is_empty()
        && name.len() <= 128
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if ok {
        Ok(())
    } else {
        Err(StoreError::InvalidDbName)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn registry() -> Registry {
        Registry::new(RegistryOptions {
            max_databases: 3,
            db_opts: DatabaseOptions {
                shard_count: 8,
                ..DatabaseOptions::default()
            },
            data_dir: std::env::temp_dir(),
        })
    }

    #[test]
    fn test_default_db_exists() {
        let reg = registry();
        assert_eq!(reg.len(), 1);
        assert_eq!(reg.default_db().name(), DEFAULT_DB);
    }

    #[test]
    fn test_create_and_get() {
        let reg = registry();
        reg.create("orders").unwrap();
        assert_eq!(reg.get("orders").unwrap().name(), "orders");
    }

    #[test]
    fn test_create_existing_fails() {
        let reg = registry();
        reg.create("orders").unwrap();
        assert!(matches!(
            reg.create("orders"),
            Err(StoreError::DbAlreadyExists(_))
        ));
    }

    #[test]
    fn test_get_missing_fails() {
        let reg = registry();
        assert!(matches!(reg.get("nope"), Err(StoreError::DbNotFound(_))));
    }

    #[test]
    fn test_capacity_enforced() {
        let reg = registry();
        reg.create("a").unwrap();
        reg.create("b").unwrap();
        assert!(matches!(reg.create("c"), Err(StoreError::DbLimit(3))));
    }

    #[test]
    fn test_invalid_names_rejected() {
        let reg = registry();
        for bad in ["", "../etc", "a/b", ".hidden", "with space"] {
            assert!(
                matches!(reg.create(bad), Err(StoreError::InvalidDbName)),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_isolation_between_databases() {
        let reg = registry();
        let a = reg.create("a").unwrap();
        let b = reg.create("b").unwrap();
        a.set(Bytes::from("k"), Bytes::from("from-a"), None);
        assert_eq!(b.get(&Bytes::from("k")).unwrap(), None);
        assert_eq!(a.get(&Bytes::from("k")).unwrap(), Some(Bytes::from("from-a")));
    }

    #[test]
    fn test_flush_all_keeps_databases_registered() {
        let reg = registry();
        let a = reg.create("a").unwrap();
        a.set(Bytes::from("k"), Bytes::from("v"), None);
        reg.default_db().set(Bytes::from("k"), Bytes::from("v"), None);
        reg.flush_all();
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.get("a").unwrap().size(), 0);
        assert_eq!(reg.default_db().size(), 0);
    }

    #[test]
    fn test_load_missing_snapshot_fails() {
        let reg = Registry::new(RegistryOptions {
            max_databases: 3,
            db_opts: DatabaseOptions::default(),
            data_dir: std::env::temp_dir().join("shardkv-definitely-missing"),
        });
        assert!(matches!(
            reg.load("ghost"),
            Err(StoreError::SnapshotNotFound(_))
        ));
    }
}
