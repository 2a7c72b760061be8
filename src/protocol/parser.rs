//! Incremental RESP Parser
//!
//! TCP delivers a byte stream, so a read may hold half a command or three
//! commands at once. The parser works against whatever bytes the
//! connection buffer currently holds and reports one of three outcomes:
//!
//! - `Ok(Some((value, consumed)))` — a complete value; advance the buffer
//!   by `consumed` and dispatch.
//! - `Ok(None)` — the data so far is a valid prefix; wait for more bytes.
//! - `Err(_)` — protocol violation; the connection should be dropped.
//!
//! Bare lines without a type prefix are accepted as inline commands
//! (`PING\r\n`), matching redis-cli behavior for hand-typed input.

use bytes::Bytes;
use thiserror::Error;

use crate::protocol::types::RespValue;

/// Largest accepted bulk string, matching the Redis limit.
pub const MAX_BULK_SIZE: usize = 512 * 1024 * 1024;

/// Cap on array nesting; command arrays are flat, anything deeper is
/// hostile input.
const MAX_DEPTH: usize = 8;

/// Errors that terminate a connection.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ParseError {
    #[error("invalid integer in {0} header")]
    BadLength(&'static str),

    #[error("invalid UTF-8 in line")]
    BadUtf8,

    #[error("bulk string of {0} bytes exceeds the {MAX_BULK_SIZE} limit")]
    BulkTooLarge(usize),

    #[error("array nesting deeper than {MAX_DEPTH}")]
    TooDeep,

    #[error("protocol violation: {0}")]
    Protocol(&'static str),
}

/// Parses a single RESP value from the front of `buf`.
pub fn parse(buf: &[u8]) -> Result<Option<(RespValue, usize)>, ParseError> {
    parse_at(buf, 0, 0)
}

/// Parses the value starting at `pos`, returning it with the offset just
/// past its terminator.
fn parse_at(
    buf: &[u8],
    pos: usize,
    depth: usize,
) -> Result<Option<(RespValue, usize)>, ParseError> {
    if depth > MAX_DEPTH {
        return Err(ParseError::TooDeep);
    }
    let Some(&prefix) = buf.get(pos) else {
        return Ok(None);
    };
    match prefix {
        b'+' | b'-' | b':' => {
            let Some((line, next)) = take_line(buf, pos + 1) else {
                return Ok(None);
            };
            let text = std::str::from_utf8(line).map_err(|_| ParseError::BadUtf8)?;
            let value = match prefix {
                b'+' => RespValue::SimpleString(text.to_string()),
                b'-' => RespValue::Error(text.to_string()),
                _ => RespValue::Integer(
                    text.parse().map_err(|_| ParseError::BadLength("integer"))?,
                ),
            };
            Ok(Some((value, next)))
        }
        b'$' => parse_bulk(buf, pos),
        b'*' => parse_array(buf, pos, depth),
        _ => parse_inline(buf, pos),
    }
}

fn parse_bulk(buf: &[u8], pos: usize) -> Result<Option<(RespValue, usize)>, ParseError> {
    let Some((line, data_start)) = take_line(buf, pos + 1) else {
        return Ok(None);
    };
    let len = parse_length(line, "bulk string")?;
    let Some(len) = len else {
        return Ok(Some((RespValue::Null, data_start)));
    };
    if len > MAX_BULK_SIZE {
        return Err(ParseError::BulkTooLarge(len));
    }
    let end = data_start + len + 2;
    if buf.len() < end {
        return Ok(None);
    }
    if &buf[data_start + len..end] != b"\r\n" {
        return Err(ParseError::Protocol("bulk string missing trailing CRLF"));
    }
    let data = Bytes::copy_from_slice(&buf[data_start..data_start + len]);
    Ok(Some((RespValue::BulkString(data), end)))
}

fn parse_array(
    buf: &[u8],
    pos: usize,
    depth: usize,
) -> Result<Option<(RespValue, usize)>, ParseError> {
    let Some((line, mut cursor)) = take_line(buf, pos + 1) else {
        return Ok(None);
    };
    let count = parse_length(line, "array")?;
    let Some(count) = count else {
        return Ok(Some((RespValue::Null, cursor)));
    };
    let mut items = Vec::with_capacity(count.min(64));
    for _ in 0..count {
        match parse_at(buf, cursor, depth + 1)? {
            Some((item, next)) => {
                items.push(item);
                cursor = next;
            }
            None => return Ok(None),
        }
    }
    Ok(Some((RespValue::Array(items), cursor)))
}

/// A bare `SET key value\r\n` line becomes an array of bulk strings.
fn parse_inline(buf: &[u8], pos: usize) -> Result<Option<(RespValue, usize)>, ParseError> {
    let Some((line, next)) = take_line(buf, pos) else {
        return Ok(None);
    };
    let text = std::str::from_utf8(line).map_err(|_| ParseError::BadUtf8)?;
    let items: Vec<RespValue> = text
        .split_whitespace()
        .map(|word| RespValue::BulkString(Bytes::copy_from_slice(word.as_bytes())))
        .collect();
    if items.is_empty() {
        return Err(ParseError::Protocol("empty inline command"));
    }
    Ok(Some((RespValue::Array(items), next)))
}

/// Length header: `-1` encodes nil, anything else must be non-negative.
fn parse_length(line: &[u8], what: &'static str) -> Result<Option<usize>, ParseError> {
    let text = std::str::from_utf8(line).map_err(|_| ParseError::BadLength(what))?;
    let n: i64 = text.parse().map_err(|_| ParseError::BadLength(what))?;
    match n {
        -1 => Ok(None),
        n if n < 0 => Err(ParseError::BadLength(what)),
        n => Ok(Some(n as usize)),
    }
}

/// Returns the line starting at `from` (without CRLF) and the offset just
/// past its CRLF, or `None` when the terminator has not arrived yet.
fn take_line(buf: &[u8], from: usize) -> Option<(&[u8], usize)> {
    let mut i = from;
    while i + 1 < buf.len() {
        if buf[i] == b'\r' && buf[i + 1] == b'\n' {
            return Some((&buf[from..i], i + 2));
        }
        i += 1;
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete(input: &[u8]) -> (RespValue, usize) {
        parse(input).unwrap().unwrap()
    }

    #[test]
    fn test_simple_string() {
        let (value, consumed) = complete(b"+OK\r\n");
        assert_eq!(value, RespValue::SimpleString("OK".to_string()));
        assert_eq!(consumed, 5);
    }

    #[test]
    fn test_error_line() {
        let (value, _) = complete(b"-ERR boom\r\n");
        assert_eq!(value, RespValue::Error("ERR boom".to_string()));
    }

    #[test]
    fn test_integer() {
        assert_eq!(complete(b":42\r\n").0, RespValue::Integer(42));
        assert_eq!(complete(b":-7\r\n").0, RespValue::Integer(-7));
    }

    #[test]
    fn test_bulk_string() {
        let (value, consumed) = complete(b"$5\r\nhello\r\n");
        assert_eq!(value, RespValue::BulkString(Bytes::from("hello")));
        assert_eq!(consumed, 11);
    }

    #[test]
    fn test_bulk_string_binary_safe() {
        let (value, _) = complete(b"$5\r\nhe\x00lo\r\n");
        assert_eq!(value, RespValue::BulkString(Bytes::from(&b"he\x00lo"[..])));
    }

    #[test]
    fn test_null_bulk() {
        assert_eq!(complete(b"$-1\r\n").0, RespValue::Null);
    }

    #[test]
    fn test_empty_bulk() {
        assert_eq!(complete(b"$0\r\n\r\n").0, RespValue::BulkString(Bytes::new()));
    }

    #[test]
    fn test_command_array() {
        let (value, consumed) = complete(b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n");
        assert_eq!(
            value,
            RespValue::Array(vec![
                RespValue::BulkString(Bytes::from("GET")),
                RespValue::BulkString(Bytes::from("name")),
            ])
        );
        assert_eq!(consumed, 23);
    }

    #[test]
    fn test_incomplete_returns_none() {
        for prefix_len in 1..22 {
            let input = &b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n"[..prefix_len];
            assert_eq!(parse(input).unwrap(), None, "prefix of {} bytes", prefix_len);
        }
    }

    #[test]
    fn test_two_pipelined_commands() {
        let input = b"+OK\r\n+OK\r\n";
        let (_, consumed) = complete(input);
        assert_eq!(consumed, 5);
        let (second, _) = complete(&input[consumed..]);
        assert_eq!(second, RespValue::SimpleString("OK".to_string()));
    }

    #[test]
    fn test_inline_command() {
        let (value, consumed) = complete(b"SET greeting hello\r\n");
        assert_eq!(
            value,
            RespValue::Array(vec![
                RespValue::BulkString(Bytes::from("SET")),
                RespValue::BulkString(Bytes::from("greeting")),
                RespValue::BulkString(Bytes::from("hello")),
            ])
        );
        assert_eq!(consumed, 20);
    }

    #[test]
    fn test_bad_length_rejected() {
        assert!(matches!(parse(b"$abc\r\n"), Err(ParseError::BadLength(_))));
        assert!(matches!(parse(b"*-5\r\n"), Err(ParseError::BadLength(_))));
        assert!(matches!(parse(b":ten\r\n"), Err(ParseError::BadLength(_))));
    }

    #[test]
    fn test_missing_bulk_terminator_rejected() {
        assert!(matches!(
            parse(b"$3\r\nabcXY"),
            Err(ParseError::Protocol(_))
        ));
    }

    #[test]
    fn test_nesting_limit() {
        let mut input = Vec::new();
        for _ in 0..20 {
            input.extend_from_slice(b"*1\r\n");
        }
        input.extend_from_slice(b":1\r\n");
        assert!(matches!(parse(&input), Err(ParseError::TooDeep)));
    }

    #[test]
    fn test_roundtrip_with_serializer() {
        let original = RespValue::Array(vec![
            RespValue::bulk("SET"),
            RespValue::bulk("key"),
            RespValue::bulk("value"),
        ]);
        let wire = original.to_bytes();
        let (parsed, consumed) = complete(&wire);
        assert_eq!(parsed, original);
        assert_eq!(consumed, wire.len());
    }
}
