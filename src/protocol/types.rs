//! RESP Reply and Command Values
//!
//! The single value type shared by both directions of the wire: incoming
//! commands arrive as `Array(BulkString...)`, and every engine result is
//! rendered back as one of these before serialization. All types terminate
//! with CRLF; a nil bulk string is `$-1\r\n`.

use bytes::{BufMut, Bytes, BytesMut};

/// A value in the RESP protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// Non-binary status line, e.g. `+OK\r\n`.
    SimpleString(String),
    /// Error line, e.g. `-ERR unknown command\r\n`.
    Error(String),
    /// Signed 64-bit integer, e.g. `:12\r\n`.
    Integer(i64),
    /// Binary-safe string, `$<len>\r\n<data>\r\n`.
    BulkString(Bytes),
    /// Nil bulk string, `$-1\r\n`.
    Null,
    /// Array of values, `*<count>\r\n...`.
    Array(Vec<RespValue>),
}

impl RespValue {
    pub fn ok() -> Self {
        RespValue::SimpleString("OK".to_string())
    }

    pub fn pong() -> Self {
        RespValue::SimpleString("PONG".to_string())
    }

    pub fn error(msg: impl Into<String>) -> Self {
        RespValue::Error(msg.into())
    }

    pub fn bulk(data: impl Into<Bytes>) -> Self {
        RespValue::BulkString(data.into())
    }

    pub fn int(n: i64) -> Self {
        RespValue::Integer(n)
    }

    /// Renders a field/value listing as the flat array HGETALL replies
    /// with.
    pub fn pairs(pairs: Vec<(Bytes, Bytes)>) -> Self {
        let mut out = Vec::with_capacity(pairs.len() * 2);
        for (field, value) in pairs {
            out.push(RespValue::BulkString(field));
            out.push(RespValue::BulkString(value));
        }
        RespValue::Array(out)
    }

    pub fn is_error(&self) -> bool {
        matches!(self, RespValue::Error(_))
    }

    /// Serializes this value into its wire form.
    pub fn write_to(&self, buf: &mut BytesMut) {
        match self {
            RespValue::SimpleString(s) => {
                buf.put_u8(b'+');
                buf.put_slice(s.as_bytes());
                buf.put_slice(b"\r\n");
            }
            RespValue::Error(s) => {
                buf.put_u8(b'-');
                buf.put_slice(s.as_bytes());
                buf.put_slice(b"\r\n");
            }
            RespValue::Integer(n) => {
                buf.put_u8(b':');
                buf.put_slice(n.to_string().as_bytes());
                buf.put_slice(b"\r\n");
            }
            RespValue::BulkString(data) => {
                buf.put_u8(b'$');
                buf.put_slice(data.len().to_string().as_bytes());
                buf.put_slice(b"\r\n");
                buf.put_slice(data);
                buf.put_slice(b"\r\n");
            }
            RespValue::Null => buf.put_slice(b"$-1\r\n"),
            RespValue::Array(items) => {
                buf.put_u8(b'*');
                buf.put_slice(items.len().to_string().as_bytes());
                buf.put_slice(b"\r\n");
                for item in items {
                    item.write_to(buf);
                }
            }
        }
    }

    /// Serializes into a fresh buffer; the tests and the client-facing
    /// writer share this.
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::new();
        self.write_to(&mut buf);
        buf.freeze()
    }
}
