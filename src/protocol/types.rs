//! RESP Value Type and Reply Writer
//!
//! The `RespValue` enum covers the RESP kinds this server speaks, for both
//! decoded commands and encoded replies:
//!
//! - `+` Simple String
//! - `-` Simple Error
//! - `:` Integer
//! - `$` Bulk String
//! - `*` Array
//! - `_` Null
//!
//! Every frame element is terminated with CRLF (`\r\n`). Bulk string lengths
//! are byte counts, so values are binary-safe.
//!
//! ## Examples
//!
//! Simple String: `+OK\r\n`
//! Error: `-invalid arguments\r\n`
//! Integer: `:1000\r\n`
//! Bulk String: `$5\r\nhello\r\n`
//! Null: `_\r\n`

use bytes::Bytes;
use std::fmt;

/// The CRLF separator used between RESP frame elements.
pub const CRLF: &[u8] = b"\r\n";

/// RESP type prefix bytes.
pub mod prefix {
    pub const SIMPLE_STRING: u8 = b'+';
    pub const ERROR: u8 = b'-';
    pub const INTEGER: u8 = b':';
    pub const BULK_STRING: u8 = b'$';
    pub const ARRAY: u8 = b'*';
    pub const NULL: u8 = b'_';
}

/// A single value in the RESP protocol.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RespValue {
    /// Non-binary-safe string, cannot contain CRLF. Format: `+<string>\r\n`
    SimpleString(String),

    /// A short human-readable error reason. Format: `-<message>\r\n`
    Error(String),

    /// 64-bit signed integer. Format: `:<integer>\r\n`
    Integer(i64),

    /// Binary-safe string. Format: `$<length>\r\n<data>\r\n`
    BulkString(Bytes),

    /// Ordered sequence of values. Format: `*<count>\r\n<element>...`
    Array(Vec<RespValue>),

    /// The null value. Format: `_\r\n`
    Null,
}

impl RespValue {
    /// Creates a simple string value.
    pub fn simple_string(s: impl Into<String>) -> Self {
        RespValue::SimpleString(s.into())
    }

    /// Creates an error value.
    pub fn error(s: impl Into<String>) -> Self {
        RespValue::Error(s.into())
    }

    /// Creates an integer value.
    pub fn integer(n: i64) -> Self {
        RespValue::Integer(n)
    }

    /// Creates a bulk string value.
    pub fn bulk_string(data: impl Into<Bytes>) -> Self {
        RespValue::BulkString(data.into())
    }

    /// The canonical `+OK` reply.
    pub fn ok() -> Self {
        RespValue::SimpleString("OK".to_string())
    }

    /// Encodes this value as RESP wire bytes.
    pub fn serialize(&self) -> Bytes {
        let mut buf = Vec::new();
        self.serialize_into(&mut buf);
        Bytes::from(buf)
    }

    /// Encodes this value into an existing buffer.
    pub fn serialize_into(&self, buf: &mut Vec<u8>) {
        match self {
            RespValue::SimpleString(s) => {
                buf.push(prefix::SIMPLE_STRING);
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(CRLF);
            }
            RespValue::Error(s) => {
                buf.push(prefix::ERROR);
                buf.extend_from_slice(s.as_bytes());
                buf.extend_from_slice(CRLF);
            }
            RespValue::Integer(n) => {
                buf.push(prefix::INTEGER);
                buf.extend_from_slice(n.to_string().as_bytes());
                buf.extend_from_slice(CRLF);
            }
            RespValue::BulkString(data) => {
                buf.push(prefix::BULK_STRING);
                buf.extend_from_slice(data.len().to_string().as_bytes());
                buf.extend_from_slice(CRLF);
                buf.extend_from_slice(data);
                buf.extend_from_slice(CRLF);
            }
            RespValue::Array(values) => {
                buf.push(prefix::ARRAY);
                buf.extend_from_slice(values.len().to_string().as_bytes());
                buf.extend_from_slice(CRLF);
                for value in values {
                    value.serialize_into(buf);
                }
            }
            RespValue::Null => {
                buf.push(prefix::NULL);
                buf.extend_from_slice(CRLF);
            }
        }
    }

    /// The inner bytes of a BulkString.
    pub fn as_bulk(&self) -> Option<&Bytes> {
        match self {
            RespValue::BulkString(b) => Some(b),
            _ => None,
        }
    }
}

/// Encodes an error message as a RESP error reply: `-<message>\r\n`.
pub fn write_error(message: impl fmt::Display) -> Bytes {
    let mut buf = Vec::new();
    buf.push(prefix::ERROR);
    buf.extend_from_slice(message.to_string().as_bytes());
    buf.extend_from_slice(CRLF);
    Bytes::from(buf)
}
