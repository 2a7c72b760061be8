//! Command Processing Module
//!
//! Receives parsed RESP commands from the connection layer, executes them
//! against the storage engine through the session's current database, and
//! produces typed replies.
//!
//! Surface: `PING`, `GET`, `SET` (with `EX`/`PX`), `DEL`, `EXISTS`,
//! `DBSIZE`, `FLUSHDB`, `FLUSHALL`, `SELECT`, `CREATEDB`, `LOADDB`,
//! `SAVE`, `CONFIG GET`, `HSET`, `HGET`, `HGETALL`, `HDEL`, `QUIT`.

pub mod handler;

pub use handler::CommandHandler;
