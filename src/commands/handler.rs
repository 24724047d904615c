//! Command Handlers
//!
//! The dispatch table mapping RESP verbs to operations on the keyspace.
//! Handlers are plain synchronous functions over `&mut Keyspace`; they run
//! inside the executor, so they never need locks and never block.
//!
//! Supported commands:
//!
//! - `PING`
//! - `SET key value [NX|XX]`
//! - `GET key`
//! - `DEL key [key ...]`
//! - `INCR key` / `DECR key`
//! - `EXPIRE key seconds` / `PEXPIRE key milliseconds`
//! - `TTL key` / `PTTL key`
//!
//! Verbs match case-insensitively. Arguments must be bulk strings; numeric
//! arguments are decoded as signed decimal. Any other verb gets
//! `-command <X> is not supported`.
//!
//! A quirk inherited deliberately: a plain SET does *not* clear an existing
//! TTL on the key. `test_set_preserves_existing_ttl` pins this down so a
//! future change of heart is a conscious one.

use crate::protocol::RespValue;
use crate::storage::{now_millis, Keyspace, StoredValue, Ttl};
use bytes::Bytes;

const ERR_INVALID_ARGUMENTS: &str = "invalid arguments";
const ERR_NOT_AN_INTEGER: &str = "value is not an integer or out of range";

/// TTL reply resolution.
#[derive(Debug, Clone, Copy)]
enum TtlUnit {
    Seconds,
    Millis,
}

/// Executes one decoded command against the keyspace.
///
/// The command must be a non-empty array whose first element is a bulk
/// string naming the verb; anything else is answered with an error reply,
/// never a crash.
pub fn dispatch(keyspace: &mut Keyspace, command: RespValue) -> RespValue {
    let elements = match command {
        RespValue::Array(elements) => elements,
        _ => return RespValue::error(ERR_INVALID_ARGUMENTS),
    };

    let Some((verb_value, args)) = elements.split_first() else {
        return RespValue::error(ERR_INVALID_ARGUMENTS);
    };
    let Some(verb_bytes) = verb_value.as_bulk() else {
        return RespValue::error(ERR_INVALID_ARGUMENTS);
    };
    let verb = String::from_utf8_lossy(verb_bytes).to_uppercase();

    match verb.as_str() {
        "PING" => RespValue::simple_string("PONG"),
        "SET" => cmd_set(keyspace, args),
        "GET" => cmd_get(keyspace, args),
        "DEL" => cmd_del(keyspace, args),
        "INCR" => cmd_step(keyspace, args, 1),
        "DECR" => cmd_step(keyspace, args, -1),
        "EXPIRE" => cmd_expire(keyspace, args, 1000),
        "PEXPIRE" => cmd_expire(keyspace, args, 1),
        "TTL" => cmd_ttl(keyspace, args, TtlUnit::Seconds),
        "PTTL" => cmd_ttl(keyspace, args, TtlUnit::Millis),
        _ => RespValue::error(format!("command {} is not supported", verb)),
    }
}

/// The bulk-string payload of argument `i`, if it is one.
fn arg_bulk(args: &[RespValue], i: usize) -> Option<&Bytes> {
    args.get(i).and_then(RespValue::as_bulk)
}

/// Decodes argument `i` as a signed decimal integer.
fn arg_i64(args: &[RespValue], i: usize) -> Option<i64> {
    let bytes = arg_bulk(args, i)?;
    std::str::from_utf8(bytes).ok()?.parse().ok()
}

/// SET key value [NX|XX]
///
/// Overwriting an existing key replies with the previous value's textual
/// form as a bulk string; a fresh key replies `+OK`. NX skips the write
/// when the key exists, XX when it does not; both no-ops reply Null.
fn cmd_set(keyspace: &mut Keyspace, args: &[RespValue]) -> RespValue {
    if args.len() < 2 {
        return RespValue::error(ERR_INVALID_ARGUMENTS);
    }
    let (Some(key), Some(value)) = (arg_bulk(args, 0), arg_bulk(args, 1)) else {
        return RespValue::error(ERR_INVALID_ARGUMENTS);
    };
    let (key, value) = (key.clone(), value.clone());

    let mut nx = false;
    let mut xx = false;
    for modifier in &args[2..] {
        let Some(m) = modifier.as_bulk() else {
            return RespValue::error(ERR_INVALID_ARGUMENTS);
        };
        match String::from_utf8_lossy(m).to_uppercase().as_str() {
            "NX" => nx = true,
            "XX" => xx = true,
            _ => return RespValue::error(ERR_INVALID_ARGUMENTS),
        }
    }

    let prev = keyspace.lookup(&key).cloned();
    if (nx && prev.is_some()) || (xx && prev.is_none()) {
        return RespValue::Null;
    }

    keyspace.set_value(key, StoredValue::Str(value));
    match prev {
        Some(prev) => RespValue::BulkString(prev.render()),
        None => RespValue::ok(),
    }
}

/// GET key
fn cmd_get(keyspace: &mut Keyspace, args: &[RespValue]) -> RespValue {
    let Some(key) = arg_bulk(args, 0) else {
        return RespValue::error(ERR_INVALID_ARGUMENTS);
    };
    match keyspace.lookup(key) {
        Some(value) => RespValue::BulkString(value.render()),
        None => RespValue::Null,
    }
}

/// DEL key [key ...]
///
/// Counts only keys that were actually present (an already-expired key is
/// absent, it just has not been reclaimed yet).
fn cmd_del(keyspace: &mut Keyspace, args: &[RespValue]) -> RespValue {
    if args.is_empty() {
        return RespValue::error(ERR_INVALID_ARGUMENTS);
    }

    let mut removed = 0i64;
    for arg in args {
        let Some(key) = arg.as_bulk() else {
            return RespValue::error(ERR_INVALID_ARGUMENTS);
        };
        let key = key.clone();
        if keyspace.lookup(&key).is_some() && keyspace.del_key(&key) {
            removed += 1;
        }
    }
    RespValue::Integer(removed)
}

/// INCR / DECR. A missing key starts at 1 for INCR and 0 for DECR (the
/// value after/before the first step, respectively); a key holding a string
/// is an error.
fn cmd_step(keyspace: &mut Keyspace, args: &[RespValue], delta: i64) -> RespValue {
    let Some(key) = arg_bulk(args, 0) else {
        return RespValue::error(ERR_INVALID_ARGUMENTS);
    };
    let key = key.clone();

    match keyspace.lookup(&key).cloned() {
        None => {
            let initial = if delta > 0 { 1 } else { 0 };
            keyspace.set_value(key, StoredValue::Int(initial));
            RespValue::Integer(initial)
        }
        Some(StoredValue::Int(current)) => match current.checked_add(delta) {
            Some(next) => {
                keyspace.set_value(key, StoredValue::Int(next));
                RespValue::Integer(next)
            }
            None => RespValue::error(ERR_NOT_AN_INTEGER),
        },
        Some(StoredValue::Str(_)) => RespValue::error(ERR_NOT_AN_INTEGER),
    }
}

/// EXPIRE / PEXPIRE. `unit_ms` scales the count into milliseconds; the
/// stored deadline is absolute wall-clock time.
fn cmd_expire(keyspace: &mut Keyspace, args: &[RespValue], unit_ms: i64) -> RespValue {
    if args.len() < 2 {
        return RespValue::error(ERR_INVALID_ARGUMENTS);
    }
    let Some(key) = arg_bulk(args, 0) else {
        return RespValue::error(ERR_INVALID_ARGUMENTS);
    };
    let key = key.clone();
    let Some(count) = arg_i64(args, 1) else {
        return RespValue::error(ERR_NOT_AN_INTEGER);
    };

    if keyspace.lookup(&key).is_none() {
        return RespValue::Integer(0);
    }

    let deadline = now_millis().saturating_add(count.saturating_mul(unit_ms));
    keyspace.set_expire(key, deadline);
    RespValue::Integer(1)
}

/// TTL / PTTL. `-2` for a missing key, `-1` for a key with no expiry,
/// otherwise the remaining time (seconds truncate the millisecond gap).
fn cmd_ttl(keyspace: &mut Keyspace, args: &[RespValue], unit: TtlUnit) -> RespValue {
    let Some(key) = arg_bulk(args, 0) else {
        return RespValue::error(ERR_INVALID_ARGUMENTS);
    };
    let key = key.clone();

    if keyspace.lookup(&key).is_none() {
        return RespValue::Integer(-2);
    }

    match keyspace.load_ttl(&key) {
        Ttl::NoExpiry => RespValue::Integer(-1),
        Ttl::Expired => RespValue::Integer(-2),
        Ttl::Remaining(ms) => RespValue::Integer(match unit {
            TtlUnit::Seconds => ms / 1000,
            TtlUnit::Millis => ms,
        }),
    }
}
