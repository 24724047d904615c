//! Command Dispatch Layer
//!
//! Receives decoded RESP arrays from the executor, validates their shape,
//! and routes them to the handler for their verb:
//!
//! ```text
//! parsed frame ──> dispatch() ──> cmd_*() ──> Keyspace
//! ```
//!
//! Handlers are pure synchronous functions; all concurrency concerns live a
//! layer up in the executor.

pub mod handler;

pub use handler::dispatch;
