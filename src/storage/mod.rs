//! Storage Layer
//!
//! The keyspace, its TTL index, and the background expiry sweeper.
//!
//! ```text
//!                    ┌──────────────────────────────┐
//!   Executor ───────>│ Keyspace                     │
//!   (sole mutator)   │   mem:    key -> StoredValue │
//!                    │   expire: key -> deadline ms │<──── read-only scan
//!                    └──────────────────────────────┘          │
//!                                                      expiry sweeper
//!                                                    (deletes via queue)
//! ```
//!
//! Keys with a deadline die in two ways:
//! 1. **Lazy**: any lookup that finds the deadline passed removes the key
//!    before reporting absence.
//! 2. **Active**: the sweeper periodically scans the expire index and
//!    enqueues deletions for whatever lazy expiry has not caught.

pub mod expiry;
pub mod keyspace;

pub use expiry::{run_sweeper, SweeperConfig};
pub use keyspace::{is_time_expired, now_millis, ExpireIndex, Keyspace, StoredValue, Ttl};
