//! RESP Command Parser
//!
//! Decodes exactly one top-level RESP value from a [`ByteReader`]. The parser
//! runs inside the executor, on a complete frame the connection layer already
//! received, so it is one-shot: there is no resumable "need more data" state.
//! Short input is a protocol error, not a retry.
//!
//! Grammar:
//!
//! ```text
//! value    := '*' integer CRLF value{n}          -- Array of n
//!           | '$' integer CRLF byte{n} CRLF      -- BulkString of n bytes
//!           | '+' bytes-until-CRLF CRLF          -- SimpleString
//!           | ':' integer CRLF                   -- Integer
//!           | '_' CRLF                           -- Null
//! integer  := ASCII decimal digits
//! ```
//!
//! Length runs are read until the first non-digit; the mandatory CRLF after
//! them is consumed via `skip_separator`. The trailing CRLF after a bulk
//! string payload is consumed when present but not required, since framing
//! between messages is the connection layer's concern.
//!
//! Clients must send commands as arrays; [`parse_command`] rejects any other
//! top-level type.

use crate::protocol::reader::ByteReader;
use crate::protocol::types::{prefix, RespValue};
use bytes::Bytes;
use thiserror::Error;

/// Errors produced while decoding a RESP frame.
///
/// These messages are wire-visible: the executor renders them directly into
/// `-<message>\r\n` error replies.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The reader was exhausted before a value started.
    #[error("empty payload")]
    EmptyPayload,

    /// The top-level value was not an array.
    #[error("invalid protocol, expected array")]
    ExpectArray,

    /// An array length was missing or not an integer.
    #[error("invalid protocol, expected array elements")]
    ExpectArrayElements,

    /// A bulk string length was missing or not an integer.
    #[error("invalid protocol, expected bulk string")]
    ExpectBulkString,

    /// Fewer payload bytes remained than the bulk string length promised.
    #[error("invalid protocol, unexpected end of bulk string")]
    UnexpectedEndOfBulkString,

    /// The leading type byte is outside the recognized set.
    #[error("invalid protocol, type '{0}' not recognized or not supported")]
    UnsupportedType(char),

    /// An integer value failed to parse.
    #[error("value is not an integer or out of range")]
    InvalidInteger,
}

/// Result type for parsing operations.
pub type ParseResult<T> = Result<T, ParseError>;

/// Decodes one client command frame. Only arrays are accepted at the top
/// level; anything else is a protocol error.
pub fn parse_command(buf: &[u8]) -> ParseResult<RespValue> {
    let mut reader = ByteReader::new(buf);
    match reader.peek() {
        None => Err(ParseError::EmptyPayload),
        Some(prefix::ARRAY) => parse_next(&mut reader),
        Some(_) => Err(ParseError::ExpectArray),
    }
}

/// Decodes the next RESP value from the reader.
pub fn parse_next(reader: &mut ByteReader<'_>) -> ParseResult<RespValue> {
    reader.skip_separator();

    let Some(tag) = reader.take() else {
        return Err(ParseError::EmptyPayload);
    };

    match tag {
        prefix::BULK_STRING => parse_bulk_string(reader),
        prefix::SIMPLE_STRING => parse_simple_string(reader),
        prefix::INTEGER => parse_integer(reader),
        prefix::ARRAY => parse_array(reader),
        prefix::NULL => {
            reader.skip_separator();
            Ok(RespValue::Null)
        }
        other => Err(ParseError::UnsupportedType(other as char)),
    }
}

/// Reads a run of ASCII digits as an unsigned length. `None` when the next
/// byte is not a digit or the run overflows.
fn read_length(reader: &mut ByteReader<'_>) -> Option<usize> {
    let mut n: usize = 0;
    let mut digits = 0;
    while let Some(b) = reader.peek() {
        if !b.is_ascii_digit() {
            break;
        }
        reader.skip(1);
        n = n.checked_mul(10)?.checked_add((b - b'0') as usize)?;
        digits += 1;
    }
    (digits > 0).then_some(n)
}

/// `*<n>\r\n` followed by `n` values.
fn parse_array(reader: &mut ByteReader<'_>) -> ParseResult<RespValue> {
    let n = read_length(reader).ok_or(ParseError::ExpectArrayElements)?;
    reader.skip_separator();

    let mut elements = Vec::with_capacity(n);
    for _ in 0..n {
        elements.push(parse_next(reader)?);
    }
    Ok(RespValue::Array(elements))
}

/// `$<n>\r\n` followed by exactly `n` payload bytes.
fn parse_bulk_string(reader: &mut ByteReader<'_>) -> ParseResult<RespValue> {
    let n = read_length(reader).ok_or(ParseError::ExpectBulkString)?;
    reader.skip_separator();

    let rest = reader.rest();
    if rest.len() < n {
        return Err(ParseError::UnexpectedEndOfBulkString);
    }
    let data = Bytes::copy_from_slice(&rest[..n]);
    reader.skip(n);
    reader.skip_separator();

    Ok(RespValue::BulkString(data))
}

/// `+<bytes>\r\n`. Reads up to but not including the CRLF; a frame ending
/// without one simply terminates the string.
fn parse_simple_string(reader: &mut ByteReader<'_>) -> ParseResult<RespValue> {
    let mut buf = Vec::new();
    while let Some(b) = reader.peek() {
        if b == b'\r' && reader.peek_next() == Some(b'\n') {
            reader.skip(2);
            break;
        }
        buf.push(b);
        reader.skip(1);
    }
    Ok(RespValue::SimpleString(
        String::from_utf8_lossy(&buf).into_owned(),
    ))
}

/// `:<n>\r\n` with an optional leading minus sign.
fn parse_integer(reader: &mut ByteReader<'_>) -> ParseResult<RespValue> {
    let negative = if reader.peek() == Some(b'-') {
        reader.skip(1);
        true
    } else {
        false
    };

    let n = read_length(reader).ok_or(ParseError::InvalidInteger)?;
    let n = i64::try_from(n).map_err(|_| ParseError::InvalidInteger)?;
    reader.skip_separator();

    Ok(RespValue::Integer(if negative { -n } else { n }))
}
