//! Client Connection Handling
//!
//! One task per connected client. TCP is a stream, so incoming bytes are
//! accumulated in a `BytesMut` buffer and handed to the RESP parser until
//! it either yields a complete command (dispatch it, write the reply) or
//! asks for more data (read again). Several commands arriving in one read
//! are all executed before the next read, which gives pipelining for free.
//!
//! The command handler lives inside the connection handler because it
//! carries per-session state: the currently selected database.

use crate::commands::CommandHandler;
use crate::protocol::{parser, ParseError, RespValue};
use bytes::{Buf, BytesMut};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt, BufWriter};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Read chunk size.
const READ_BUFFER_SIZE: usize = 4096;

/// Errors that end a connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("client disconnected mid-command")]
    ClientDisconnected,

    #[error("protocol error: {0}")]
    Protocol(#[from] ParseError),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Server-wide connection counters, shared across all handler tasks.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    pub connections_accepted: AtomicU64,
    pub active_connections: AtomicU64,
    pub commands_processed: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    fn opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    fn closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    fn command(&self) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
    }
}

/// Drives a single client connection to completion.
pub struct ConnectionHandler {
    stream: BufWriter<TcpStream>,
    addr: SocketAddr,
    buffer: BytesMut,
    commands: CommandHandler,
    stats: Arc<ConnectionStats>,
}

impl ConnectionHandler {
    pub fn new(
        stream: TcpStream,
        addr: SocketAddr,
        commands: CommandHandler,
        stats: Arc<ConnectionStats>,
    ) -> Self {
        stats.opened();
        Self {
            stream: BufWriter::new(stream),
            addr,
            buffer: BytesMut::with_capacity(READ_BUFFER_SIZE),
            commands,
            stats,
        }
    }

    /// The read-parse-execute-reply loop. Returns when the client
    /// disconnects, sends QUIT, or violates the protocol.
    pub async fn run(mut self) -> Result<(), ConnectionError> {
        debug!(client = %self.addr, "client connected");
        let result = self.main_loop().await;
        match &result {
            Ok(()) => debug!(client = %self.addr, "client disconnected"),
            Err(ConnectionError::ClientDisconnected) => {
                debug!(client = %self.addr, "client disconnected mid-command")
            }
            Err(e) => warn!(client = %self.addr, error = %e, "connection closed on error"),
        }
        self.stats.closed();
        result
    }

    async fn main_loop(&mut self) -> Result<(), ConnectionError> {
        loop {
            while let Some((command, consumed)) = parser::parse(&self.buffer)? {
                self.buffer.advance(consumed);
                let quit = is_quit(&command);
                let reply = self.commands.execute(command);
                self.stats.command();

                let mut out = BytesMut::new();
                reply.write_to(&mut out);
                self.stream.write_all(&out).await?;

                if quit {
                    self.stream.flush().await?;
                    return Ok(());
                }
            }
            self.stream.flush().await?;

            let read = self.stream.read_buf(&mut self.buffer).await?;
            if read == 0 {
                if self.buffer.is_empty() {
                    return Ok(());
                }
                return Err(ConnectionError::ClientDisconnected);
            }
        }
    }
}

fn is_quit(command: &RespValue) -> bool {
    let RespValue::Array(items) = command else {
        return false;
    };
    match items.first() {
        Some(RespValue::BulkString(b)) => b.eq_ignore_ascii_case(b"QUIT"),
        Some(RespValue::SimpleString(s)) => s.eq_ignore_ascii_case("quit"),
        _ => false,
    }
}

/// Entry point used by the accept loop: wraps the stream in a handler and
/// runs it, logging the outcome.
pub async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    commands: CommandHandler,
    stats: Arc<ConnectionStats>,
) {
    let handler = ConnectionHandler::new(stream, addr, commands, stats);
    if let Err(e) = handler.run().await {
        match e {
            ConnectionError::ClientDisconnected => {}
            e => info!(client = %addr, error = %e, "connection terminated"),
        }
    }
}
