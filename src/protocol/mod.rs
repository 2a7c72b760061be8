//! RESP Protocol Implementation
//!
//! The wire boundary: an incremental parser turning raw bytes into
//! [`RespValue`] commands, and serialization of typed replies back into
//! RESP. The engine never sees bytes that have not passed through here.
//!
//! ```ignore
//! use shardkv::protocol::{parser, RespValue};
//!
//! let data = b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n";
//! let (command, consumed) = parser::parse(data).unwrap().unwrap();
//!
//! let reply = RespValue::bulk("ann");
//! let wire = reply.to_bytes();
//! ```

pub mod parser;
pub mod types;

pub use parser::{parse, ParseError};
pub use types::RespValue;
