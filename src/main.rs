//! shardkv server binary
//!
//! Parses the command line, wires up logging, builds the database registry
//! and background sweeper, and runs the accept loop until Ctrl+C.

use shardkv::commands::CommandHandler;
use shardkv::connection::{handle_connection, ConnectionStats};
use shardkv::storage::{
    DatabaseOptions, ExpiryConfig, ExpirySweeper, KeyHasher, Registry, RegistryOptions,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

/// Server configuration assembled from command-line flags.
struct Config {
    host: String,
    port: u16,
    /// Per-database memory ceiling; `None` disables eviction entirely.
    max_memory: Option<usize>,
    shard_count: usize,
    hasher: KeyHasher,
    /// Track recency and evict LRU entries under memory pressure.
    lru: bool,
    max_databases: usize,
    data_dir: PathBuf,
    /// Active expiry sweep base interval; zero disables the sweeper.
    sweep_interval: Duration,
    verbose: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: shardkv::DEFAULT_HOST.to_string(),
            port: shardkv::DEFAULT_PORT,
            max_memory: None,
            shard_count: 256,
            hasher: KeyHasher::default(),
            lru: false,
            max_databases: 10,
            data_dir: PathBuf::from("."),
            sweep_interval: Duration::from_millis(100),
            verbose: false,
        }
    }
}

impl Config {
    /// Parse configuration from command-line arguments.
    fn from_args() -> Self {
        let mut config = Config::default();
        let args: Vec<String> = std::env::args().collect();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--host" | "-h" => config.host = take_value(&args, &mut i, "--host"),
                "--port" | "-p" => {
                    config.port = parse_or_exit(&take_value(&args, &mut i, "--port"), "port");
                }
                "--maxmemory" | "-m" => {
                    let raw = take_value(&args, &mut i, "--maxmemory");
                    match parse_size(&raw) {
                        Some(0) => config.max_memory = None,
                        Some(bytes) => config.max_memory = Some(bytes),
                        None => {
                            eprintln!("Error: invalid size '{}'", raw);
                            std::process::exit(1);
                        }
                    }
                }
                "--shards" => {
                    config.shard_count =
                        parse_or_exit(&take_value(&args, &mut i, "--shards"), "shard count");
                    if config.shard_count == 0 {
                        eprintln!("Error: shard count must be at least 1");
                        std::process::exit(1);
                    }
                }
                "--hash" => {
                    let raw = take_value(&args, &mut i, "--hash");
                    config.hasher = raw.parse().unwrap_or_else(|e| {
                        eprintln!("Error: {}", e);
                        std::process::exit(1);
                    });
                }
                "--lru" => config.lru = true,
                "--max-databases" => {
                    config.max_databases = parse_or_exit(
                        &take_value(&args, &mut i, "--max-databases"),
                        "database limit",
                    );
                    if config.max_databases == 0 {
                        eprintln!("Error: database limit must be at least 1");
                        std::process::exit(1);
                    }
                }
                "--data-dir" => {
                    config.data_dir = PathBuf::from(take_value(&args, &mut i, "--data-dir"));
                }
                "--sweep-interval" => {
                    let ms: u64 = parse_or_exit(
                        &take_value(&args, &mut i, "--sweep-interval"),
                        "sweep interval",
                    );
                    config.sweep_interval = Duration::from_millis(ms);
                }
                "--verbose" | "-v" => config.verbose = true,
                "--version" => {
                    println!("shardkv version {}", shardkv::VERSION);
                    std::process::exit(0);
                }
                "--help" => {
                    print_help();
                    std::process::exit(0);
                }
                other => {
                    eprintln!("Unknown argument: {}", other);
                    print_help();
                    std::process::exit(1);
                }
            }
            i += 1;
        }

        config
    }

    fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Returns the value following a flag, exiting with a message when it is
/// missing.
fn take_value(args: &[String], i: &mut usize, flag: &str) -> String {
    *i += 1;
    match args.get(*i) {
        Some(v) => v.clone(),
        None => {
            eprintln!("Error: {} requires a value", flag);
            std::process::exit(1);
        }
    }
}

fn parse_or_exit<T: std::str::FromStr>(raw: &str, what: &str) -> T {
    raw.parse().unwrap_or_else(|_| {
        eprintln!("Error: invalid {} '{}'", what, raw);
        std::process::exit(1);
    })
}

/// Parses byte sizes with optional `kb`/`mb`/`gb` (or `k`/`m`/`g`)
/// suffixes: `1073741824`, `512mb`, `1g`.
fn parse_size(raw: &str) -> Option<usize> {
    let lower = raw.to_lowercase();
    let (digits, multiplier) = if let Some(n) = lower.strip_suffix("kb").or(lower.strip_suffix('k'))
    {
        (n, 1024)
    } else if let Some(n) = lower.strip_suffix("mb").or(lower.strip_suffix('m')) {
        (n, 1024 * 1024)
    } else if let Some(n) = lower.strip_suffix("gb").or(lower.strip_suffix('g')) {
        (n, 1024 * 1024 * 1024)
    } else {
        (lower.as_str(), 1)
    };
    digits.parse::<usize>().ok().map(|n| n * multiplier)
}

fn print_help() {
    println!(
        r#"
shardkv - A Sharded, Multi-Database In-Memory Key-Value Store

USAGE:
    shardkv [OPTIONS]

OPTIONS:
    -h, --host <HOST>            Host to bind to (default: 127.0.0.1)
    -p, --port <PORT>            Port to listen on (default: 6379)
    -m, --maxmemory <SIZE>       Per-database memory ceiling, e.g. 512mb or 1g
                                 (default: unlimited; 0 also means unlimited)
        --shards <N>             Shards per database (default: 256)
        --hash <NAME>            Key hash strategy: sum, xor, djb2, sdbm
                                 (default: sum)
        --lru                    Evict least-recently-used keys under memory
                                 pressure (requires --maxmemory)
        --max-databases <N>      Maximum number of databases (default: 10)
        --data-dir <DIR>         Directory for snapshot files (default: .)
        --sweep-interval <MS>    Active expiry sweep interval in milliseconds;
                                 0 disables the sweeper (default: 100)
    -v, --verbose                Debug-level logging
        --version                Print version information
        --help                   Print this help message

EXAMPLES:
    shardkv                                  # defaults, port 6379
    shardkv -m 1g --lru --shards 128         # bounded memory with LRU
    shardkv --hash djb2 --data-dir /var/kv   # better key spread, snapshots
                                             # under /var/kv

CONNECTING:
    Use redis-cli or any Redis client:
    $ redis-cli -p 6379
    127.0.0.1:6379> CREATEDB orders
    OK
    127.0.0.1:6379> SET o1 42 EX 1000
    OK
"#
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_args();

    let level = if config.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .init();

    let registry = Arc::new(Registry::new(RegistryOptions {
        max_databases: config.max_databases,
        db_opts: DatabaseOptions {
            shard_count: config.shard_count,
            hasher: config.hasher,
            max_memory: config.max_memory,
            track_lru: config.lru,
        },
        data_dir: config.data_dir.clone(),
    }));
    info!(
        shards = config.shard_count,
        hash = %config.hasher,
        max_memory = ?config.max_memory,
        lru = config.lru,
        max_databases = config.max_databases,
        data_dir = %config.data_dir.display(),
        "registry initialized"
    );

    let _sweeper = if config.sweep_interval.is_zero() {
        info!("active expiry sweeper disabled");
        None
    } else {
        Some(ExpirySweeper::start(
            Arc::clone(&registry),
            ExpiryConfig {
                base_interval: config.sweep_interval,
                ..ExpiryConfig::default()
            },
        ))
    };

    let stats = Arc::new(ConnectionStats::new());
    let listener = TcpListener::bind(config.bind_address()).await?;
    info!("listening on {}", config.bind_address());

    let shutdown = async {
        signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
        info!("shutdown signal received, stopping server...");
    };

    tokio::select! {
        _ = accept_loop(listener, registry, stats) => {}
        _ = shutdown => {}
    }

    info!("server shutdown complete");
    Ok(())
}

/// Accepts connections forever, one handler task per client.
async fn accept_loop(
    listener: TcpListener,
    registry: Arc<Registry>,
    stats: Arc<ConnectionStats>,
) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let commands = CommandHandler::new(Arc::clone(&registry));
                let stats = Arc::clone(&stats);
                tokio::spawn(async move {
                    handle_connection(stream, addr, commands, stats).await;
                });
            }
            Err(e) => {
                error!("failed to accept connection: {}", e);
            }
        }
    }
}
