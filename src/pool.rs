//! Scratch Buffer Pool
//!
//! Connections read into short scratch buffers that get recycled here
//! instead of reallocated per read. The pool deliberately stays small in
//! both directions: buffers start at [`BUF_CAP`] bytes, and one returned
//! with a larger capacity is dropped on the floor so the pool never drifts
//! toward holding big allocations.

use std::sync::Mutex;

/// Capacity of pooled buffers, in bytes.
pub const BUF_CAP: usize = 1024;

/// A free list of reusable byte buffers.
#[derive(Debug, Default)]
pub struct BufferPool {
    bufs: Mutex<Vec<Vec<u8>>>,
}

impl BufferPool {
    pub fn new() -> Self {
        Self::default()
    }

    /// Takes a cleared buffer from the pool, or allocates a fresh one.
    pub fn get(&self) -> Vec<u8> {
        self.bufs
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Vec::with_capacity(BUF_CAP))
    }

    /// Returns a buffer to the pool. Oversized buffers are discarded.
    pub fn put(&self, mut buf: Vec<u8>) {
        if buf.capacity() > BUF_CAP {
            return;
        }
        buf.clear();
        self.bufs.lock().unwrap().push(buf);
    }

    /// Number of buffers currently pooled.
    pub fn idle(&self) -> usize {
        self.bufs.lock().unwrap().len()
    }
}
