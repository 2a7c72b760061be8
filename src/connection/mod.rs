//! Connection Module
//!
//! Accept-loop plumbing: each client gets its own async task that reads
//! bytes, parses RESP, dispatches through its session's
//! [`CommandHandler`](crate::commands::CommandHandler), and writes replies.
//! Partial commands and pipelined batches are both handled by the
//! accumulation buffer.

pub mod handler;

pub use handler::{handle_connection, ConnectionError, ConnectionHandler, ConnectionStats};
