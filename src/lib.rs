//! # solokv - A Single-Writer In-Memory Key-Value Server
//!
//! solokv is a minimal RESP-speaking key/value server. Its defining choice
//! is how it stays correct under concurrency: instead of locking the
//! keyspace, every state transition (client commands and internal expiry
//! deletions alike) is funneled through one bounded queue into a single
//! executor task that owns the data outright.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                             solokv                               │
//! │                                                                  │
//! │  ┌───────────┐   frames    ┌───────────────┐                     │
//! │  │ TCP       │────────────>│               │      ┌───────────┐  │
//! │  │ conn task │<── replies ─│    bounded    │      │ Keyspace  │  │
//! │  └───────────┘             │    command    │─────>│ + expire  │  │
//! │  ┌───────────┐             │     queue     │      │   index   │  │
//! │  │ TCP       │────────────>│       │       │      └───────────┘  │
//! │  │ conn task │<────────────│       ▼       │            ▲        │
//! │  └───────────┘             │   Executor    │            │ reads  │
//! │                            │ (single task) │      ┌───────────┐  │
//! │  deletes, via queue ──────>│               │<─────│  Expiry   │  │
//! │                            └───────────────┘      │  Sweeper  │  │
//! │                                                   └───────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Supported commands
//!
//! `PING`, `SET key value [NX|XX]`, `GET`, `DEL key...`, `INCR`, `DECR`,
//! `EXPIRE`, `PEXPIRE`, `TTL`, `PTTL`.
//!
//! ## Design highlights
//!
//! ### Single-writer keyspace
//!
//! The executor is the only code that mutates the keyspace and its TTL
//! index. Handlers are synchronous, so no two mutations ever interleave and
//! queue order is the serialization order; per-key locking is unnecessary.
//!
//! ### Lazy + active expiry
//!
//! Keys with a TTL die on the next access that finds their deadline passed,
//! and a background sweeper reclaims the rest. The sweeper scans the expire
//! index under a time budget and routes every deletion through the command
//! queue, so it composes with live traffic at queue granularity.
//!
//! ### Backpressure over buffering
//!
//! The command queue is bounded; when the executor falls behind, producers
//! wait on the enqueue and connection read loops slow down with it.

pub mod commands;
pub mod connection;
pub mod executor;
pub mod pool;
pub mod protocol;
pub mod storage;

pub use commands::dispatch;
pub use connection::{handle_connection, ConnectionStats};
pub use executor::{command_queue, Command, CommandSender, Executor, QUEUE_CAPACITY};
pub use pool::BufferPool;
pub use protocol::{parse_command, ParseError, RespValue};
pub use storage::{run_sweeper, ExpireIndex, Keyspace, SweeperConfig};

/// The default port solokv listens on (same as Redis).
pub const DEFAULT_PORT: u16 = 6379;

/// The default host solokv binds to.
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Version of solokv.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
