//! Command Queue and Single-Writer Executor
//!
//! The concurrency backbone of the server. All state transitions, client
//! commands and internal expiry deletions alike, travel through one bounded
//! MPSC queue and are applied by one task:
//!
//! ```text
//!  connection tasks ──┐
//!                     ├──> bounded queue ──> Executor ──> Keyspace
//!  expiry sweeper  ───┘      (cap 500)     (sole owner)
//! ```
//!
//! Because the executor is the only mutator and handlers run synchronously
//! inside it, no two mutations ever interleave; the queue's FIFO order is
//! the server's serialization order.
//!
//! ## Modules
//!
//! - `queue`: `Command` work units and the `CommandSender` producer handle
//! - `worker`: the executor task itself

pub mod queue;
pub mod worker;

pub use queue::{command_queue, Command, CommandSender, ServerAction, QUEUE_CAPACITY};
pub use worker::Executor;
