//! Connection Layer
//!
//! Accepted sockets are served by one async task each (spawned from the
//! accept loop in `main`). Connections do no parsing and no storage work;
//! they ferry raw frames to the executor queue and write the encoded
//! replies back, so the only shared things here are the command sender, the
//! scratch buffer pool, and the [`ConnectionStats`] counters.

pub mod handler;

pub use handler::{handle_connection, ConnectionError, ConnectionStats};
