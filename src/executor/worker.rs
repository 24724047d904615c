//! Single-Writer Command Executor
//!
//! The executor is the serialization point of the whole server: one task
//! that owns the [`Keyspace`] outright and consumes the command queue. With
//! every mutation funneled through here, queue ordering replaces per-key
//! locking; there is no lock around the keyspace at all.
//!
//! For a client command the cycle is: dequeue, parse the frame, dispatch to
//! the handler table, encode the reply, deliver it on the command's reply
//! channel. Server commands just run their action. Every failure mode turns
//! into a reply: parse errors and semantic errors become `-...` error
//! frames, and a panicking handler is caught and answered with
//! `-internal error`. No client payload can take the executor down.
//!
//! Reply delivery uses `try_send`. The reply channel always has capacity
//! for one message, so the only ways a send can fail are a slow client that
//! never drained its previous reply or a client that disconnected; both
//! mean "drop the reply and move on", never "block the executor".

use crate::commands::dispatch;
use crate::executor::queue::Command;
use crate::protocol::{parse_command, write_error, RespValue};
use crate::storage::Keyspace;
use bytes::Bytes;
use std::panic::{catch_unwind, AssertUnwindSafe};
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, trace};

/// The single consumer of the command queue and sole owner of the keyspace.
pub struct Executor {
    keyspace: Keyspace,
    queue: mpsc::Receiver<Command>,
    shutdown: watch::Receiver<bool>,
}

impl Executor {
    pub fn new(
        keyspace: Keyspace,
        queue: mpsc::Receiver<Command>,
        shutdown: watch::Receiver<bool>,
    ) -> Self {
        Self {
            keyspace,
            queue,
            shutdown,
        }
    }

    /// Runs until the shutdown token flips or every sender is gone. Once
    /// cancelled, no further commands are drained; pending reply channels
    /// are simply dropped and connections time out on their own.
    pub async fn run(mut self) {
        info!("command executor started");

        loop {
            tokio::select! {
                changed = self.shutdown.changed() => {
                    if changed.is_err() || *self.shutdown.borrow() {
                        break;
                    }
                }
                cmd = self.queue.recv() => {
                    match cmd {
                        None => break,
                        Some(Command::Client { buf, reply }) => {
                            let out = self.process_client(&buf);
                            if reply.try_send(out).is_err() {
                                debug!("client gone before reply delivery, dropping");
                            }
                        }
                        Some(Command::Server { action }) => {
                            action(&mut self.keyspace);
                        }
                    }
                }
            }
        }

        info!("command executor stopped");
    }

    /// Parse, dispatch, encode. Always produces exactly one reply frame.
    fn process_client(&mut self, buf: &[u8]) -> Bytes {
        trace!(len = buf.len(), "processing client frame");

        let value = match parse_command(buf) {
            Ok(value) => value,
            Err(e) => return write_error(e),
        };

        let keyspace = &mut self.keyspace;
        let reply = match catch_unwind(AssertUnwindSafe(|| dispatch(keyspace, value))) {
            Ok(reply) => reply,
            Err(_) => {
                error!("command handler panicked");
                RespValue::error("internal error")
            }
        };

        reply.serialize()
    }
}
