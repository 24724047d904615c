//! Keyspace and TTL Index
//!
//! Two mappings make up the server's state: the keyspace proper (key to
//! stored value) and an auxiliary expire index (key to absolute deadline in
//! Unix milliseconds). A key may live in the keyspace without an expire
//! entry; the reverse can only happen transiently inside a single executor
//! step and is never observable from outside.
//!
//! ## Ownership
//!
//! The [`Keyspace`] is owned by the command executor and mutated by nothing
//! else; none of its methods take locks on the main map. The
//! [`ExpireIndex`] is the one shared piece: the expiry sweeper reads it
//! concurrently (under a short read lock) to find candidates, but deletions
//! are routed back through the executor queue, so writes stay single-owner.
//!
//! ## Expiry contract
//!
//! A deadline at or before the current time means the key is gone. `lookup`
//! enforces this lazily: an expired key is removed from both maps before the
//! call reports absence, so no caller ever observes a dead value.

use bytes::Bytes;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Current wall-clock time in Unix milliseconds.
pub fn now_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// True once `deadline` (Unix ms) has been reached.
#[inline]
pub fn is_time_expired(deadline: i64, now: i64) -> bool {
    deadline <= now
}

/// A value held in the keyspace.
///
/// Which variant a key holds depends on the command that stored it: SET
/// stores strings, INCR/DECR store integers. GET replies with the textual
/// rendering of either.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredValue {
    /// A binary-safe string, as received on the wire.
    Str(Bytes),
    /// A signed 64-bit counter.
    Int(i64),
}

impl StoredValue {
    /// Textual rendering used for GET and for SET's previous-value reply.
    pub fn render(&self) -> Bytes {
        match self {
            StoredValue::Str(b) => b.clone(),
            StoredValue::Int(n) => Bytes::from(n.to_string()),
        }
    }
}

/// Remaining time-to-live for a key, before translation into the RESP
/// sentinel integers at the reply boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    /// The key has no expire entry.
    NoExpiry,
    /// The expire entry's deadline has already passed.
    Expired,
    /// Milliseconds until the deadline.
    Remaining(i64),
}

/// The shared expire index: key to absolute Unix-millisecond deadline.
///
/// Mutated only through [`Keyspace`] methods (the executor); the sweeper
/// holds its own `Arc` and reads concurrently.
#[derive(Debug, Default)]
pub struct ExpireIndex {
    entries: RwLock<HashMap<Bytes, i64>>,
}

impl ExpireIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// The deadline for `key`, if one is set.
    pub fn deadline(&self, key: &[u8]) -> Option<i64> {
        self.entries.read().unwrap().get(key).copied()
    }

    /// Number of keys carrying a deadline.
    pub fn len(&self) -> usize {
        self.entries.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn insert(&self, key: Bytes, deadline: i64) {
        self.entries.write().unwrap().insert(key, deadline);
    }

    fn remove(&self, key: &[u8]) {
        self.entries.write().unwrap().remove(key);
    }

    /// One bounded sweep pass: visits entries in arbitrary order and collects
    /// keys whose deadline has passed. Every `check_every` visits the elapsed
    /// time is compared against `budget`; once over, the pass stops where it
    /// is. Holds the read lock for the duration of the scan, which the budget
    /// keeps short.
    pub fn collect_expired(&self, now: i64, check_every: usize, budget: Duration) -> Vec<Bytes> {
        let start = Instant::now();
        let mut expired = Vec::new();
        let mut visited = 0usize;

        let entries = self.entries.read().unwrap();
        for (key, deadline) in entries.iter() {
            if visited >= check_every {
                visited = 0;
                if start.elapsed() > budget {
                    break;
                }
            }
            if is_time_expired(*deadline, now) {
                expired.push(key.clone());
            }
            visited += 1;
        }
        expired
    }
}

/// The executor-owned key/value table plus its expire index.
///
/// Not thread-safe by design: exactly one task (the executor) holds it, and
/// queue ordering replaces per-key locking.
#[derive(Debug)]
pub struct Keyspace {
    mem: HashMap<Bytes, StoredValue>,
    expire: Arc<ExpireIndex>,
}

impl Keyspace {
    pub fn new(expire: Arc<ExpireIndex>) -> Self {
        Self {
            mem: HashMap::new(),
            expire,
        }
    }

    /// Fetches the value for `key`, lazily expiring it first: a key whose
    /// deadline has passed is removed from both maps and reported absent.
    pub fn lookup(&mut self, key: &[u8]) -> Option<&StoredValue> {
        if self.mem.contains_key(key) {
            if let Some(deadline) = self.expire.deadline(key) {
                if is_time_expired(deadline, now_millis()) {
                    tracing::debug!(key = %String::from_utf8_lossy(key), "key found expired during lookup");
                    self.del_key(key);
                    return None;
                }
            }
        }
        self.mem.get(key)
    }

    /// Inserts or overwrites the keyspace entry. Leaves any expire entry
    /// untouched; clearing TTL is the caller's decision.
    pub fn set_value(&mut self, key: Bytes, value: StoredValue) {
        self.mem.insert(key, value);
    }

    /// Inserts or overwrites the expire deadline for `key` (Unix ms).
    pub fn set_expire(&mut self, key: Bytes, deadline: i64) {
        tracing::debug!(key = %String::from_utf8_lossy(&key), deadline, "set TTL");
        self.expire.insert(key, deadline);
    }

    /// Removes `key` from the keyspace and the expire index. Returns whether
    /// a keyspace entry existed.
    pub fn del_key(&mut self, key: &[u8]) -> bool {
        self.expire.remove(key);
        self.mem.remove(key).is_some()
    }

    /// Remaining TTL for `key`. Callers decide what absence of the key
    /// itself means; this only consults the expire index.
    pub fn load_ttl(&self, key: &[u8]) -> Ttl {
        match self.expire.deadline(key) {
            None => Ttl::NoExpiry,
            Some(deadline) => {
                let gap = deadline - now_millis();
                if gap <= 0 {
                    Ttl::Expired
                } else {
                    Ttl::Remaining(gap)
                }
            }
        }
    }

    /// Number of keys in the keyspace.
    pub fn len(&self) -> usize {
        self.mem.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mem.is_empty()
    }

    /// The shared expire index handle.
    pub fn expire_index(&self) -> &Arc<ExpireIndex> {
        &self.expire
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyspace() -> Keyspace {
        Keyspace::new(Arc::new(ExpireIndex::new()))
    }

    #[test]
    fn test_set_and_lookup() {
        let mut ks = keyspace();
        ks.set_value(Bytes::from("name"), StoredValue::Str(Bytes::from("Ada")));
        assert_eq!(
            ks.lookup(b"name"),
            Some(&StoredValue::Str(Bytes::from("Ada")))
        );
        assert_eq!(ks.lookup(b"missing"), None);
    }

    #[test]
    fn test_overwrite_changes_kind() {
        let mut ks = keyspace();
        ks.set_value(Bytes::from("k"), StoredValue::Str(Bytes::from("7")));
        ks.set_value(Bytes::from("k"), StoredValue::Int(8));
        assert_eq!(ks.lookup(b"k"), Some(&StoredValue::Int(8)));
    }

    #[test]
    fn test_render() {
        assert_eq!(StoredValue::Str(Bytes::from("abc")).render(), Bytes::from("abc"));
        assert_eq!(StoredValue::Int(-5).render(), Bytes::from("-5"));
    }

    #[test]
    fn test_del_key_removes_both_entries() {
        let mut ks = keyspace();
        ks.set_value(Bytes::from("k"), StoredValue::Str(Bytes::from("v")));
        ks.set_expire(Bytes::from("k"), now_millis() + 10_000);

        assert!(ks.del_key(b"k"));
        assert_eq!(ks.lookup(b"k"), None);
        assert_eq!(ks.expire_index().deadline(b"k"), None);
        assert!(!ks.del_key(b"k"));
    }

    #[test]
    fn test_lookup_lazily_expires() {
        let mut ks = keyspace();
        ks.set_value(Bytes::from("k"), StoredValue::Str(Bytes::from("v")));
        ks.set_expire(Bytes::from("k"), now_millis() - 1);

        assert_eq!(ks.lookup(b"k"), None);
        // Both entries must be gone, not just hidden.
        assert_eq!(ks.len(), 0);
        assert!(ks.expire_index().is_empty());
    }

    #[test]
    fn test_lookup_honors_future_deadline() {
        let mut ks = keyspace();
        ks.set_value(Bytes::from("k"), StoredValue::Str(Bytes::from("v")));
        ks.set_expire(Bytes::from("k"), now_millis() + 60_000);
        assert!(ks.lookup(b"k").is_some());
    }

    #[test]
    fn test_set_value_preserves_expire_entry() {
        let mut ks = keyspace();
        ks.set_value(Bytes::from("k"), StoredValue::Str(Bytes::from("v")));
        let deadline = now_millis() + 60_000;
        ks.set_expire(Bytes::from("k"), deadline);

        ks.set_value(Bytes::from("k"), StoredValue::Str(Bytes::from("w")));
        assert_eq!(ks.expire_index().deadline(b"k"), Some(deadline));
    }

    #[test]
    fn test_load_ttl_states() {
        let mut ks = keyspace();
        ks.set_value(Bytes::from("k"), StoredValue::Str(Bytes::from("v")));

        assert_eq!(ks.load_ttl(b"k"), Ttl::NoExpiry);

        ks.set_expire(Bytes::from("k"), now_millis() + 5_000);
        match ks.load_ttl(b"k") {
            Ttl::Remaining(ms) => assert!(ms > 4_000 && ms <= 5_000),
            other => panic!("expected Remaining, got {:?}", other),
        }

        ks.set_expire(Bytes::from("k"), now_millis() - 5);
        assert_eq!(ks.load_ttl(b"k"), Ttl::Expired);
    }

    #[test]
    fn test_deadline_at_now_is_expired() {
        let now = now_millis();
        assert!(is_time_expired(now, now));
        assert!(is_time_expired(now - 1, now));
        assert!(!is_time_expired(now + 1, now));
    }

    #[test]
    fn test_collect_expired_finds_past_deadlines() {
        let index = ExpireIndex::new();
        let now = now_millis();
        index.insert(Bytes::from("dead1"), now - 10);
        index.insert(Bytes::from("dead2"), now - 1);
        index.insert(Bytes::from("alive"), now + 10_000);

        let mut expired = index.collect_expired(now, 15, Duration::from_millis(5));
        expired.sort();
        assert_eq!(expired, vec![Bytes::from("dead1"), Bytes::from("dead2")]);
    }

    #[test]
    fn test_collect_expired_scans_large_population() {
        let index = ExpireIndex::new();
        let now = now_millis();
        for i in 0..100_000 {
            index.insert(Bytes::from(format!("key{}", i)), now - 1);
        }
        // A generous budget covers the whole population in one pass.
        let expired = index.collect_expired(now, 15, Duration::from_secs(30));
        assert_eq!(expired.len(), 100_000);
    }

    #[test]
    fn test_collect_expired_aborts_once_over_budget() {
        let index = ExpireIndex::new();
        let now = now_millis();
        for i in 0..100_000 {
            index.insert(Bytes::from(format!("key{}", i)), now - 1);
        }
        // A zero budget fails the very first clock check, so the pass stops
        // at the first check window instead of scanning the whole index.
        let expired = index.collect_expired(now, 15, Duration::ZERO);
        assert!(expired.len() <= 15, "visited {} entries", expired.len());
        assert!(!expired.is_empty());
    }
}
