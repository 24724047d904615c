//! Connection Handler
//!
//! One task per accepted TCP connection. The connection never touches the
//! keyspace itself; it is a courier between the socket and the executor:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────┐
//! │ loop:                                                  │
//! │   read a frame into a pooled scratch buffer            │
//! │   enqueue Command::Client { frame, reply channel }     │  ──> executor
//! │   await the encoded reply                              │  <── executor
//! │   write it to the socket                               │
//! └────────────────────────────────────────────────────────┘
//! ```
//!
//! The enqueue awaits when the command queue is full, which is the server's
//! backpressure: a saturated executor slows every read loop down instead of
//! buffering unboundedly.
//!
//! Each command gets a fresh capacity-1 reply channel whose only sender
//! travels with the command. The executor can therefore always deliver
//! without blocking, and if it shuts down with the command in flight the
//! channel closes and the connection unblocks instead of waiting forever.

use crate::executor::{Command, CommandSender};
use crate::pool::{BufferPool, BUF_CAP};
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tracing::{debug, warn};

/// Server-wide connection counters, shared across all connection tasks.
#[derive(Debug, Default)]
pub struct ConnectionStats {
    /// Total connections accepted over the process lifetime.
    pub connections_accepted: AtomicU64,
    /// Currently open connections.
    pub active_connections: AtomicU64,
    /// Total replies delivered to clients.
    pub commands_processed: AtomicU64,
}

impl ConnectionStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn connection_opened(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
        self.active_connections.fetch_add(1, Ordering::Relaxed);
    }

    pub fn connection_closed(&self) {
        self.active_connections.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn command_processed(&self) {
        self.commands_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Number of currently open connections.
    pub fn conn_count(&self) -> u64 {
        self.active_connections.load(Ordering::Relaxed)
    }
}

/// Errors that end a connection.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Socket-level failure; the connection closes with no reply attempt.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The executor has shut down; no further commands can be served.
    #[error("executor unavailable")]
    ExecutorGone,
}

/// Serves one client until it disconnects, the executor goes away, or the
/// socket errors.
pub async fn handle_connection(
    mut stream: TcpStream,
    addr: SocketAddr,
    sender: CommandSender,
    stats: Arc<ConnectionStats>,
    pool: Arc<BufferPool>,
) {
    stats.connection_opened();
    debug!(client = %addr, count = stats.conn_count(), "client connected");

    let mut buf = pool.get();
    buf.resize(BUF_CAP, 0);

    let result = connection_loop(&mut stream, &mut buf, &sender, &stats).await;
    pool.put(buf);

    match result {
        Ok(()) => debug!(client = %addr, "client disconnected"),
        Err(ConnectionError::Io(ref e))
            if e.kind() == std::io::ErrorKind::ConnectionReset =>
        {
            debug!(client = %addr, "connection reset by client")
        }
        Err(e) => warn!(client = %addr, error = %e, "connection closed with error"),
    }

    stats.connection_closed();
    debug!(client = %addr, count = stats.conn_count(), "client closed");
}

async fn connection_loop(
    stream: &mut TcpStream,
    buf: &mut Vec<u8>,
    sender: &CommandSender,
    stats: &ConnectionStats,
) -> Result<(), ConnectionError> {
    loop {
        let n = stream.read(&mut buf[..]).await?;
        if n == 0 {
            return Ok(());
        }

        let frame = Bytes::copy_from_slice(&buf[..n]);
        let (reply_tx, mut reply_rx) = mpsc::channel::<Bytes>(1);

        sender
            .send(Command::Client {
                buf: frame,
                reply: reply_tx,
            })
            .await
            .map_err(|_| ConnectionError::ExecutorGone)?;

        // The executor holds the only sender now; a closed channel means it
        // dropped the command during shutdown.
        let Some(reply) = reply_rx.recv().await else {
            return Err(ConnectionError::ExecutorGone);
        };

        stream.write_all(&reply).await?;
        stats.command_processed();
    }
}
