//! Linear accumulation buffer with lazy compaction.
//!
//! `[offset, offset + len)` holds unconsumed bytes. Consuming only moves
//! `offset` forward; valid bytes are moved back to the start of the
//! buffer only when an append would not fit the trailing free region.
//! This is not a ring buffer: data never wraps.

use tracing::trace;

use crate::error::DemuxError;
use crate::DemuxResult;

/// Growable-in-place byte queue of fixed capacity.
#[derive(Debug, Clone)]
pub struct ByteQueue {
    buf: Vec<u8>,
    offset: usize,
    len: usize,
}

impl ByteQueue {
    /// Create an empty queue holding at most `capacity` bytes.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity],
            offset: 0,
            len: 0,
        }
    }

    /// Maximum number of bytes the queue can hold.
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Number of unconsumed bytes.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true when nothing is buffered.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Offset of the first unconsumed byte inside the buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Free space available to appends, counting the leading free region.
    pub fn free(&self) -> usize {
        self.buf.len() - self.len
    }

    /// Free space after the valid region, without compaction.
    pub fn tail_free(&self) -> usize {
        self.buf.len() - (self.offset + self.len)
    }

    /// The unconsumed bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.buf[self.offset..self.offset + self.len]
    }

    /// Append `data`, compacting first only if the trailing region is too small.
    pub fn append(&mut self, data: &[u8]) -> DemuxResult<()> {
        if data.len() > self.free() {
            return Err(DemuxError::Overflow {
                needed: data.len(),
                available: self.free(),
            });
        }

        if data.len() > self.tail_free() {
            self.compact();
        }

        let end = self.offset + self.len;
        self.buf[end..end + data.len()].copy_from_slice(data);
        self.len += data.len();
        Ok(())
    }

    /// Discard `n` bytes from the front.
    ///
    /// # Panics
    /// Panics if `n` exceeds the buffered length.
    pub fn consume(&mut self, n: usize) {
        assert!(n <= self.len, "consume({n}) past buffered length {}", self.len);
        self.offset += n;
        self.len -= n;
    }

    /// Consume `n` bytes from the front and return them.
    ///
    /// The returned span stays in place inside the buffer; no copy is made.
    pub fn take(&mut self, n: usize) -> &[u8] {
        let start = self.offset;
        self.consume(n);
        &self.buf[start..start + n]
    }

    /// Drop everything buffered.
    pub fn clear(&mut self) {
        self.offset = 0;
        self.len = 0;
    }

    fn compact(&mut self) {
        trace!(offset = self.offset, len = self.len, "Compacting byte queue");
        self.buf.copy_within(self.offset..self.offset + self.len, 0);
        self.offset = 0;
    }
}
