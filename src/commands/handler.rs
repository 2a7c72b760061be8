//! Command Dispatcher
//!
//! The only entry point the protocol layer uses: a parsed command (array of
//! bulk strings) goes in, a typed [`RespValue`] reply comes out. The
//! dispatcher validates arity and argument types before touching the engine
//! (a partially-valid command never executes), resolves the session's
//! current database, and converts every [`StoreError`] into an error reply.
//! Nothing here panics on client input.
//!
//! One `CommandHandler` exists per client connection and carries the
//! session state: the name of the currently selected database. Only
//! SELECT, CREATEDB and LOADDB change it.

use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use crate::errors::StoreError;
use crate::protocol::RespValue;
use crate::storage::engine::Database;
use crate::storage::registry::{Registry, DEFAULT_DB};

/// Per-connection command dispatcher and session state.
#[derive(Clone)]
pub struct CommandHandler {
    registry: Arc<Registry>,
    /// The session's currently selected database name.
    current_db: String,
}

impl CommandHandler {
    /// Creates a handler for a fresh session, positioned on the default
    /// database.
    pub fn new(registry: Arc<Registry>) -> Self {
        Self {
            registry,
            current_db: DEFAULT_DB.to_string(),
        }
    }

    /// Name of the database this session currently operates on.
    pub fn current_db(&self) -> &str {
        &self.current_db
    }

    /// Executes one parsed command and returns the reply.
    pub fn execute(&mut self, command: RespValue) -> RespValue {
        let args = match command {
            RespValue::Array(args) if !args.is_empty() => args,
            RespValue::Array(_) => return RespValue::error("ERR empty command"),
            _ => return RespValue::error("ERR invalid command format"),
        };

        let name = match &args[0] {
            RespValue::BulkString(b) => match std::str::from_utf8(b) {
                Ok(s) => s.to_uppercase(),
                Err(_) => return RespValue::error("ERR invalid command name"),
            },
            RespValue::SimpleString(s) => s.to_uppercase(),
            _ => return RespValue::error("ERR invalid command name"),
        };

        self.dispatch(&name, &args[1..])
    }

    fn dispatch(&mut self, cmd: &str, args: &[RespValue]) -> RespValue {
        match cmd {
            "PING" => self.cmd_ping(args),
            "GET" => self.cmd_get(args),
            "SET" => self.cmd_set(args),
            "DEL" => self.cmd_del(args),
            "EXISTS" => self.cmd_exists(args),
            "DBSIZE" => self.cmd_dbsize(args),
            "FLUSHDB" => self.cmd_flushdb(args),
            "FLUSHALL" => self.cmd_flushall(args),
            "SELECT" => self.cmd_select(args),
            "CREATEDB" => self.cmd_createdb(args),
            "LOADDB" => self.cmd_loaddb(args),
            "SAVE" => self.cmd_save(args),
            "CONFIG" => self.cmd_config(args),
            "HSET" => self.cmd_hset(args),
            "HGET" => self.cmd_hget(args),
            "HGETALL" => self.cmd_hgetall(args),
            "HDEL" => self.cmd_hdel(args),
            "QUIT" => RespValue::ok(),
            _ => RespValue::error(format!("ERR unknown command '{}'", cmd)),
        }
    }

    // ========================================================================
    // Helpers
    // ========================================================================

    /// The session's database. The current name always resolves because
    /// databases are never unregistered, but a broken session still gets an
    /// error reply rather than a panic.
    fn db(&self) -> Result<Arc<Database>, StoreError> {
        self.registry.get(&self.current_db)
    }

    fn arg_bytes(arg: &RespValue) -> Option<Bytes> {
        match arg {
            RespValue::BulkString(b) => Some(b.clone()),
            RespValue::SimpleString(s) => Some(Bytes::from(s.clone())),
            _ => None,
        }
    }

    fn arg_string(arg: &RespValue) -> Option<String> {
        match arg {
            RespValue::BulkString(b) => std::str::from_utf8(b).ok().map(|s| s.to_string()),
            RespValue::SimpleString(s) => Some(s.clone()),
            _ => None,
        }
    }

    fn arg_int(arg: &RespValue) -> Option<i64> {
        match arg {
            RespValue::Integer(n) => Some(*n),
            RespValue::BulkString(b) => std::str::from_utf8(b).ok().and_then(|s| s.parse().ok()),
            RespValue::SimpleString(s) => s.parse().ok(),
            _ => None,
        }
    }

    fn wrong_arity(cmd: &str) -> RespValue {
        RespValue::error(format!("ERR wrong number of arguments for '{}' command", cmd))
    }

    fn reply_err(e: StoreError) -> RespValue {
        RespValue::error(e.to_string())
    }

    // ========================================================================
    // Connection commands
    // ========================================================================

    fn cmd_ping(&self, args: &[RespValue]) -> RespValue {
        match args {
            [] => RespValue::pong(),
            [msg] => match Self::arg_bytes(msg) {
                Some(b) => RespValue::BulkString(b),
                None => RespValue::error("ERR invalid argument"),
            },
            _ => Self::wrong_arity("ping"),
        }
    }

    // ========================================================================
    // String commands
    // ========================================================================

    fn cmd_get(&self, args: &[RespValue]) -> RespValue {
        let [key] = args else {
            return Self::wrong_arity("get");
        };
        let Some(key) = Self::arg_bytes(key) else {
            return RespValue::error("ERR invalid key");
        };
        let db = match self.db() {
            Ok(db) => db,
            Err(e) => return Self::reply_err(e),
        };
        match db.get(&key) {
            Ok(Some(value)) => RespValue::BulkString(value),
            Ok(None) => RespValue::Null,
            Err(e) => Self::reply_err(e),
        }
    }

    /// `SET key value [EX seconds | PX milliseconds]`
    fn cmd_set(&self, args: &[RespValue]) -> RespValue {
        if args.len() < 2 {
            return Self::wrong_arity("set");
        }
        let (Some(key), Some(value)) = (Self::arg_bytes(&args[0]), Self::arg_bytes(&args[1]))
        else {
            return RespValue::error("ERR invalid argument");
        };

        let mut ttl: Option<Duration> = None;
        let mut i = 2;
        while i < args.len() {
            let Some(opt) = Self::arg_string(&args[i]) else {
                return RespValue::error("ERR syntax error");
            };
            match opt.to_uppercase().as_str() {
                "EX" | "PX" => {
                    i += 1;
                    let amount = match args.get(i).and_then(Self::arg_int) {
                        Some(n) if n > 0 => n as u64,
                        _ => return RespValue::error("ERR invalid expire time in 'set' command"),
                    };
                    ttl = Some(if opt.eq_ignore_ascii_case("ex") {
                        Duration::from_secs(amount)
                    } else {
                        Duration::from_millis(amount)
                    });
                }
                _ => return RespValue::error("ERR syntax error"),
            }
            i += 1;
        }

        let db = match self.db() {
            Ok(db) => db,
            Err(e) => return Self::reply_err(e),
        };
        db.set(key, value, ttl);
        RespValue::ok()
    }

    fn cmd_del(&self, args: &[RespValue]) -> RespValue {
        if args.is_empty() {
            return Self::wrong_arity("del");
        }
        let Some(keys) = args.iter().map(Self::arg_bytes).collect::<Option<Vec<_>>>() else {
            return RespValue::error("ERR invalid key");
        };
        let db = match self.db() {
            Ok(db) => db,
            Err(e) => return Self::reply_err(e),
        };
        RespValue::int(db.delete_many(&keys) as i64)
    }

    fn cmd_exists(&self, args: &[RespValue]) -> RespValue {
        if args.is_empty() {
            return Self::wrong_arity("exists");
        }
        let Some(keys) = args.iter().map(Self::arg_bytes).collect::<Option<Vec<_>>>() else {
            return RespValue::error("ERR invalid key");
        };
        let db = match self.db() {
            Ok(db) => db,
            Err(e) => return Self::reply_err(e),
        };
        RespValue::int(db.exists_count(&keys) as i64)
    }

    // ========================================================================
    // Hash commands
    // ========================================================================

    /// `HSET key field value [field value ...]`
    fn cmd_hset(&self, args: &[RespValue]) -> RespValue {
        if args.len() < 3 || (args.len() - 1) % 2 != 0 {
            return Self::wrong_arity("hset");
        }
        let Some(key) = Self::arg_bytes(&args[0]) else {
            return RespValue::error("ERR invalid key");
        };
        let mut pairs = Vec::with_capacity((args.len() - 1) / 2);
        for chunk in args[1..].chunks(2) {
            let (Some(field), Some(value)) =
                (Self::arg_bytes(&chunk[0]), Self::arg_bytes(&chunk[1]))
            else {
                return RespValue::error("ERR invalid argument");
            };
            pairs.push((field, value));
        }
        let db = match self.db() {
            Ok(db) => db,
            Err(e) => return Self::reply_err(e),
        };
        match db.hset(key, pairs) {
            Ok(added) => RespValue::int(added),
            Err(e) => Self::reply_err(e),
        }
    }

    fn cmd_hget(&self, args: &[RespValue]) -> RespValue {
        let [key, field] = args else {
            return Self::wrong_arity("hget");
        };
        let (Some(key), Some(field)) = (Self::arg_bytes(key), Self::arg_bytes(field)) else {
            return RespValue::error("ERR invalid argument");
        };
        let db = match self.db() {
            Ok(db) => db,
            Err(e) => return Self::reply_err(e),
        };
        match db.hget(&key, &field) {
            Ok(Some(value)) => RespValue::BulkString(value),
            Ok(None) => RespValue::Null,
            Err(e) => Self::reply_err(e),
        }
    }

    fn cmd_hgetall(&self, args: &[RespValue]) -> RespValue {
        let [key] = args else {
            return Self::wrong_arity("hgetall");
        };
        let Some(key) = Self::arg_bytes(key) else {
            return RespValue::error("ERR invalid key");
        };
        let db = match self.db() {
            Ok(db) => db,
            Err(e) => return Self::reply_err(e),
        };
        match db.hgetall(&key) {
            Ok(pairs) => RespValue::pairs(pairs),
            Err(e) => Self::reply_err(e),
        }
    }

    fn cmd_hdel(&self, args: &[RespValue]) -> RespValue {
        if args.len() < 2 {
            return Self::wrong_arity("hdel");
        }
        let Some(key) = Self::arg_bytes(&args[0]) else {
            return RespValue::error("ERR invalid key");
        };
        let Some(fields) = args[1..].iter().map(Self::arg_bytes).collect::<Option<Vec<_>>>()
        else {
            return RespValue::error("ERR invalid argument");
        };
        let db = match self.db() {
            Ok(db) => db,
            Err(e) => return Self::reply_err(e),
        };
        match db.hdel(&key, &fields) {
            Ok(removed) => RespValue::int(removed),
            Err(e) => Self::reply_err(e),
        }
    }

    // ========================================================================
    // Database commands
    // ========================================================================

    fn cmd_dbsize(&self, args: &[RespValue]) -> RespValue {
        if !args.is_empty() {
            return Self::wrong_arity("dbsize");
        }
        match self.db() {
            Ok(db) => RespValue::int(db.size() as i64),
            Err(e) => Self::reply_err(e),
        }
    }

    fn cmd_flushdb(&self, args: &[RespValue]) -> RespValue {
        if !args.is_empty() {
            return Self::wrong_arity("flushdb");
        }
        match self.db() {
            Ok(db) => {
                db.flush();
                RespValue::ok()
            }
            Err(e) => Self::reply_err(e),
        }
    }

    fn cmd_flushall(&self, args: &[RespValue]) -> RespValue {
        if !args.is_empty() {
            return Self::wrong_arity("flushall");
        }
        self.registry.flush_all();
        RespValue::ok()
    }

    /// `SELECT db` — a numeric index is accepted for Redis client
    /// compatibility and routes to the default database; a name resolves
    /// against the registry.
    fn cmd_select(&mut self, args: &[RespValue]) -> RespValue {
        let [target] = args else {
            return Self::wrong_arity("select");
        };
        let Some(name) = Self::arg_string(target) else {
            return RespValue::error("ERR invalid database name");
        };
        if name.parse::<u64>().is_ok() {
            self.current_db = DEFAULT_DB.to_string();
            return RespValue::ok();
        }
        match self.registry.get(&name) {
            Ok(_) => {
                debug!(db = %name, "session switched database");
                self.current_db = name;
                RespValue::ok()
            }
            Err(e) => Self::reply_err(e),
        }
    }

    fn cmd_createdb(&mut self, args: &[RespValue]) -> RespValue {
        let [name] = args else {
            return Self::wrong_arity("createdb");
        };
        let Some(name) = Self::arg_string(name) else {
            return RespValue::error("ERR invalid database name");
        };
        match self.registry.create(&name) {
            Ok(_) => {
                self.current_db = name;
                RespValue::ok()
            }
            Err(e) => Self::reply_err(e),
        }
    }

    fn cmd_loaddb(&mut self, args: &[RespValue]) -> RespValue {
        let [name] = args else {
            return Self::wrong_arity("loaddb");
        };
        let Some(name) = Self::arg_string(name) else {
            return RespValue::error("ERR invalid database name");
        };
        match self.registry.load(&name) {
            Ok(_) => {
                self.current_db = name;
                RespValue::ok()
            }
            Err(e) => Self::reply_err(e),
        }
    }

    fn cmd_save(&self, args: &[RespValue]) -> RespValue {
        if !args.is_empty() {
            return Self::wrong_arity("save");
        }
        match self.registry.save(&self.current_db) {
            Ok(()) => RespValue::ok(),
            Err(e) => Self::reply_err(e),
        }
    }

    // ========================================================================
    // Server commands
    // ========================================================================

    /// `CONFIG GET save|appendonly` — fixed stub replies with no backing
    /// state; enough for redis-cli and client libraries that probe
    /// persistence settings on connect.
    fn cmd_config(&self, args: &[RespValue]) -> RespValue {
        let [sub, param] = args else {
            return Self::wrong_arity("config");
        };
        let Some(sub) = Self::arg_string(sub) else {
            return RespValue::error("ERR invalid argument");
        };
        if !sub.eq_ignore_ascii_case("get") {
            return RespValue::error(format!("ERR unknown CONFIG subcommand '{}'", sub));
        }
        let Some(param) = Self::arg_string(param) else {
            return RespValue::error("ERR invalid argument");
        };
        match param.to_lowercase().as_str() {
            "save" => RespValue::Array(vec![RespValue::bulk("save"), RespValue::bulk("")]),
            "appendonly" => {
                RespValue::Array(vec![RespValue::bulk("appendonly"), RespValue::bulk("no")])
            }
            _ => RespValue::Array(Vec::new()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::engine::DatabaseOptions;
    use crate::storage::registry::RegistryOptions;
    use tempfile::TempDir;

    fn handler() -> CommandHandler {
        handler_with_dir(std::env::temp_dir())
    }

    fn handler_with_dir(data_dir: std::path::PathBuf) -> CommandHandler {
        let registry = Arc::new(Registry::new(RegistryOptions {
            max_databases: 10,
            db_opts: DatabaseOptions {
                shard_count: 16,
                ..DatabaseOptions::default()
            },
            data_dir,
        }));
        CommandHandler::new(registry)
    }

    fn cmd(parts: &[&str]) -> RespValue {
        RespValue::Array(parts.iter().map(|p| RespValue::bulk(p.to_string())).collect())
    }

    fn bulk(s: &str) -> RespValue {
        RespValue::bulk(s.to_string())
    }

    #[test]
    fn test_ping() {
        let mut h = handler();
        assert_eq!(h.execute(cmd(&["PING"])), RespValue::pong());
        assert_eq!(h.execute(cmd(&["ping", "hi"])), bulk("hi"));
    }

    #[test]
    fn test_set_get_roundtrip() {
        let mut h = handler();
        assert_eq!(h.execute(cmd(&["SET", "name", "ann"])), RespValue::ok());
        assert_eq!(h.execute(cmd(&["GET", "name"])), bulk("ann"));
        assert_eq!(h.execute(cmd(&["GET", "missing"])), RespValue::Null);
    }

    #[test]
    fn test_set_with_px_expires() {
        let mut h = handler();
        assert_eq!(
            h.execute(cmd(&["SET", "tmp", "v", "PX", "40"])),
            RespValue::ok()
        );
        assert_eq!(h.execute(cmd(&["GET", "tmp"])), bulk("v"));
        std::thread::sleep(Duration::from_millis(80));
        assert_eq!(h.execute(cmd(&["GET", "tmp"])), RespValue::Null);
        assert_eq!(h.execute(cmd(&["DBSIZE"])), RespValue::int(0));
    }

    #[test]
    fn test_set_with_ex_accepted() {
        let mut h = handler();
        assert_eq!(
            h.execute(cmd(&["SET", "k", "v", "EX", "100"])),
            RespValue::ok()
        );
        assert_eq!(h.execute(cmd(&["GET", "k"])), bulk("v"));
    }

    #[test]
    fn test_set_rejects_bad_expiry() {
        let mut h = handler();
        assert!(h.execute(cmd(&["SET", "k", "v", "EX", "0"])).is_error());
        assert!(h.execute(cmd(&["SET", "k", "v", "EX", "nan"])).is_error());
        assert!(h.execute(cmd(&["SET", "k", "v", "EX"])).is_error());
        assert!(h.execute(cmd(&["SET", "k", "v", "NX"])).is_error());
        // None of the rejected forms executed.
        assert_eq!(h.execute(cmd(&["GET", "k"])), RespValue::Null);
    }

    #[test]
    fn test_del_and_exists() {
        let mut h = handler();
        h.execute(cmd(&["SET", "a", "1"]));
        h.execute(cmd(&["SET", "b", "2"]));
        assert_eq!(h.execute(cmd(&["EXISTS", "a", "b", "c"])), RespValue::int(2));
        assert_eq!(h.execute(cmd(&["DEL", "a", "b", "c"])), RespValue::int(2));
        assert_eq!(h.execute(cmd(&["DEL", "a"])), RespValue::int(0));
    }

    #[test]
    fn test_wrong_arity_never_executes() {
        let mut h = handler();
        assert!(h.execute(cmd(&["GET"])).is_error());
        assert!(h.execute(cmd(&["SET", "only-key"])).is_error());
        assert!(h.execute(cmd(&["DEL"])).is_error());
        assert!(h.execute(cmd(&["HSET", "k", "f"])).is_error());
        assert!(h.execute(cmd(&["HSET", "k", "f", "v", "dangling"])).is_error());
        assert!(h.execute(cmd(&["SELECT"])).is_error());
        assert_eq!(h.execute(cmd(&["DBSIZE"])), RespValue::int(0));
    }

    #[test]
    fn test_unknown_command() {
        let mut h = handler();
        assert_eq!(
            h.execute(cmd(&["OBJECT", "ENCODING", "k"])),
            RespValue::error("ERR unknown command 'OBJECT'")
        );
    }

    #[test]
    fn test_hash_scenario() {
        let mut h = handler();
        assert_eq!(
            h.execute(cmd(&["HSET", "user1", "name", "ann"])),
            RespValue::int(1)
        );
        assert_eq!(h.execute(cmd(&["HGET", "user1", "name"])), bulk("ann"));
        assert_eq!(
            h.execute(cmd(&["HGETALL", "user1"])),
            RespValue::Array(vec![bulk("name"), bulk("ann")])
        );
        assert_eq!(h.execute(cmd(&["HDEL", "user1", "name"])), RespValue::int(1));
        assert_eq!(h.execute(cmd(&["HGETALL", "user1"])), RespValue::Array(vec![]));
    }

    #[test]
    fn test_hash_on_string_key_is_error() {
        let mut h = handler();
        h.execute(cmd(&["SET", "s", "v"]));
        let reply = h.execute(cmd(&["HGET", "s", "f"]));
        assert_eq!(
            reply,
            RespValue::error("WRONGTYPE Operation against a key holding the wrong kind of value")
        );
    }

    #[test]
    fn test_select_numeric_routes_to_default() {
        let mut h = handler();
        assert_eq!(h.execute(cmd(&["SELECT", "0"])), RespValue::ok());
        assert_eq!(h.current_db(), DEFAULT_DB);
        assert_eq!(h.execute(cmd(&["SELECT", "7"])), RespValue::ok());
        assert_eq!(h.current_db(), DEFAULT_DB);
    }

    #[test]
    fn test_select_missing_database_errors() {
        let mut h = handler();
        assert!(h.execute(cmd(&["SELECT", "nope"])).is_error());
        assert_eq!(h.current_db(), DEFAULT_DB);
    }

    #[test]
    fn test_createdb_selects_and_isolates() {
        let mut h = handler();
        h.execute(cmd(&["SET", "k", "default-value"]));
        assert_eq!(h.execute(cmd(&["CREATEDB", "orders"])), RespValue::ok());
        assert_eq!(h.current_db(), "orders");
        // Writes to one database are invisible in the other.
        assert_eq!(h.execute(cmd(&["GET", "k"])), RespValue::Null);
        h.execute(cmd(&["SET", "k", "orders-value"]));
        assert_eq!(h.execute(cmd(&["SELECT", "default"])), RespValue::ok());
        assert_eq!(h.execute(cmd(&["GET", "k"])), bulk("default-value"));
    }

    #[test]
    fn test_createdb_twice_fails() {
        let mut h = handler();
        assert_eq!(h.execute(cmd(&["CREATEDB", "orders"])), RespValue::ok());
        assert!(h.execute(cmd(&["CREATEDB", "orders"])).is_error());
    }

    #[test]
    fn test_orders_scenario() {
        let mut h = handler();
        assert_eq!(h.execute(cmd(&["CREATEDB", "orders"])), RespValue::ok());
        assert_eq!(h.execute(cmd(&["SELECT", "orders"])), RespValue::ok());
        assert_eq!(
            h.execute(cmd(&["SET", "o1", "42", "PX", "60"])),
            RespValue::ok()
        );
        assert_eq!(h.execute(cmd(&["GET", "o1"])), bulk("42"));
        std::thread::sleep(Duration::from_millis(100));
        assert_eq!(h.execute(cmd(&["GET", "o1"])), RespValue::Null);
        assert_eq!(h.execute(cmd(&["DBSIZE"])), RespValue::int(0));
    }

    #[test]
    fn test_flushdb_only_clears_current() {
        let mut h = handler();
        h.execute(cmd(&["SET", "k", "v"]));
        h.execute(cmd(&["CREATEDB", "other"]));
        h.execute(cmd(&["SET", "k2", "v2"]));
        assert_eq!(h.execute(cmd(&["FLUSHDB"])), RespValue::ok());
        assert_eq!(h.execute(cmd(&["DBSIZE"])), RespValue::int(0));
        h.execute(cmd(&["SELECT", "default"]));
        assert_eq!(h.execute(cmd(&["DBSIZE"])), RespValue::int(1));
        assert_eq!(h.execute(cmd(&["FLUSHALL"])), RespValue::ok());
        assert_eq!(h.execute(cmd(&["DBSIZE"])), RespValue::int(0));
    }

    #[test]
    fn test_save_and_loaddb_roundtrip() {
        let dir = TempDir::new().unwrap();
        {
            let mut h = handler_with_dir(dir.path().to_path_buf());
            h.execute(cmd(&["CREATEDB", "shop"]));
            h.execute(cmd(&["SET", "greeting", "hello"]));
            h.execute(cmd(&["HSET", "user1", "name", "ann"]));
            assert_eq!(h.execute(cmd(&["SAVE"])), RespValue::ok());
        }
        // Fresh registry, as after a restart.
        let mut h = handler_with_dir(dir.path().to_path_buf());
        assert!(h.execute(cmd(&["SELECT", "shop"])).is_error());
        assert_eq!(h.execute(cmd(&["LOADDB", "shop"])), RespValue::ok());
        assert_eq!(h.current_db(), "shop");
        assert_eq!(h.execute(cmd(&["GET", "greeting"])), bulk("hello"));
        assert_eq!(h.execute(cmd(&["HGET", "user1", "name"])), bulk("ann"));
    }

    #[test]
    fn test_loaddb_without_snapshot_errors() {
        let dir = TempDir::new().unwrap();
        let mut h = handler_with_dir(dir.path().to_path_buf());
        assert!(h.execute(cmd(&["LOADDB", "ghost"])).is_error());
        assert_eq!(h.current_db(), DEFAULT_DB);
    }

    #[test]
    fn test_config_stubs() {
        let mut h = handler();
        assert_eq!(
            h.execute(cmd(&["CONFIG", "GET", "save"])),
            RespValue::Array(vec![bulk("save"), bulk("")])
        );
        assert_eq!(
            h.execute(cmd(&["CONFIG", "GET", "appendonly"])),
            RespValue::Array(vec![bulk("appendonly"), bulk("no")])
        );
        assert_eq!(
            h.execute(cmd(&["CONFIG", "GET", "maxmemory"])),
            RespValue::Array(vec![])
        );
    }

    #[test]
    fn test_quit_replies_ok() {
        let mut h = handler();
        assert_eq!(h.execute(cmd(&["QUIT"])), RespValue::ok());
    }

    #[test]
    fn test_non_array_command_rejected() {
        let mut h = handler();
        assert!(h.execute(RespValue::bulk("GET")).is_error());
        assert!(h.execute(RespValue::Array(vec![])).is_error());
    }
}
