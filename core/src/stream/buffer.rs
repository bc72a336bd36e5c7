//! stream/buffer.rs
//! Fixed-capacity ingest buffer.
//!
//! The buffer only stores bytes; deciding *when* to flush is split between
//! `needs_flush_for` (capacity) and the writer (segment boundary, shutdown).

use crate::types::UsageError;

#[derive(Debug)]
pub struct IngestBuffer {
    bytes: Box<[u8]>,
    len: usize,
}

impl IngestBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            bytes: vec![0u8; capacity].into_boxed_slice(),
            len: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.bytes.len()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Buffered bytes in ingest order.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// A single append must stay strictly below capacity.
    pub fn check_fits(&self, incoming: usize) -> Result<(), UsageError> {
        if incoming >= self.capacity() {
            return Err(UsageError::OversizedWrite { len: incoming, capacity: self.capacity() });
        }
        Ok(())
    }

    /// True when appending `incoming` bytes requires a mandatory flush first.
    pub fn needs_flush_for(&self, incoming: usize) -> bool {
        self.len + incoming >= self.capacity()
    }

    /// Copy `data` after the buffered bytes.
    ///
    /// The caller flushes first when `needs_flush_for` says so; an append that
    /// still does not fit is rejected without touching the buffer.
    pub fn append(&mut self, data: &[u8]) -> Result<(), UsageError> {
        self.check_fits(data.len())?;
        let end = self.len + data.len();
        if end > self.capacity() {
            return Err(UsageError::OversizedWrite { len: end, capacity: self.capacity() });
        }
        self.bytes[self.len..end].copy_from_slice(data);
        self.len = end;
        Ok(())
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}
