//! RESP Protocol Implementation
//!
//! Everything needed to turn a received byte frame into a typed value and a
//! typed value back into wire bytes.
//!
//! ## Modules
//!
//! - `reader`: position-tracked cursor over a byte slice
//! - `parser`: one-shot decoder for a single top-level RESP value
//! - `types`: the `RespValue` enum and the reply writer
//!
//! ## Example
//!
//! ```
//! use solokv::protocol::{parse_command, RespValue};
//! use bytes::Bytes;
//!
//! let value = parse_command(b"*2\r\n$3\r\nGET\r\n$4\r\nname\r\n").unwrap();
//! assert!(matches!(value, RespValue::Array(_)));
//!
//! let reply = RespValue::bulk_string(Bytes::from("Ada"));
//! assert_eq!(&reply.serialize()[..], b"$3\r\nAda\r\n");
//! ```

pub mod parser;
pub mod reader;
pub mod types;

pub use parser::{parse_command, parse_next, ParseError, ParseResult};
pub use reader::ByteReader;
pub use types::{write_error, RespValue};
