//! Command Queue
//!
//! The bounded MPSC channel feeding the executor. Two kinds of work unit
//! travel on it:
//!
//! - [`Command::Client`]: a raw frame received from a connection, carrying
//!   the connection's reply channel. The executor parses, dispatches, and
//!   sends the encoded reply back on that channel.
//! - [`Command::Server`]: an internal mutation (today: expiry deletions from
//!   the sweeper). No reply.
//!
//! The queue is the admission-control point: producers await on `send` when
//! it is full, so backpressure propagates all the way to the connection read
//! loops. It is also the ordering point: everything that touches the
//! keyspace is serialized here.

use crate::storage::Keyspace;
use bytes::Bytes;
use std::fmt;
use tokio::sync::mpsc;
use tracing::debug;

/// Default capacity of the command queue.
pub const QUEUE_CAPACITY: usize = 500;

/// A deferred mutation run by the executor against the keyspace it owns.
pub type ServerAction = Box<dyn FnOnce(&mut Keyspace) + Send>;

/// One unit of work for the executor.
pub enum Command {
    /// A raw RESP frame from a client plus the channel its reply goes to.
    Client {
        buf: Bytes,
        reply: mpsc::Sender<Bytes>,
    },
    /// A server-originated side effect on the keyspace.
    Server { action: ServerAction },
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Command::Client { buf, .. } => f.debug_struct("Client").field("len", &buf.len()).finish(),
            Command::Server { .. } => f.debug_struct("Server").finish_non_exhaustive(),
        }
    }
}

/// Creates the command queue. The receiver half goes to the executor; the
/// sender half is cloned into every producer (connections, sweeper).
pub fn command_queue(capacity: usize) -> (CommandSender, mpsc::Receiver<Command>) {
    let (tx, rx) = mpsc::channel(capacity);
    (CommandSender { tx }, rx)
}

/// Cloneable producer handle for the command queue.
#[derive(Debug, Clone)]
pub struct CommandSender {
    tx: mpsc::Sender<Command>,
}

impl CommandSender {
    /// Enqueues a command, awaiting while the queue is full. Fails only when
    /// the executor has shut down.
    pub async fn send(&self, cmd: Command) -> Result<(), mpsc::error::SendError<Command>> {
        self.tx.send(cmd).await
    }

    /// Enqueues a deletion of `key`, routed through the executor so it
    /// serializes with client commands. A failed send just means the
    /// executor is gone.
    pub async fn queue_delete(&self, key: Bytes) {
        let cmd = Command::Server {
            action: Box::new(move |keyspace: &mut Keyspace| {
                keyspace.del_key(&key);
            }),
        };
        if self.send(cmd).await.is_err() {
            debug!("executor gone, dropping queued delete");
        }
    }
}
