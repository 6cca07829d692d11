//! Bounded output sink.
//!
//! Every formatter writes through an [`OutputSink`]. The sink stores bytes
//! while room remains and counts the logical length of everything it was
//! asked to emit, stored or not. That count is what `snprintf` returns.
//!
//! Design invariant: the sink never writes past the end of its buffer, and
//! the last slot is held back for the terminator so `finish` always fits.

/// Truncating writer over a caller-supplied buffer.
#[derive(Debug)]
pub struct OutputSink<'b> {
    buf: &'b mut [u8],
    written: usize,
    logical: u64,
    overflow: bool,
}

impl<'b> OutputSink<'b> {
    /// Wrap `buf`. An empty buffer turns the sink into a pure length counter.
    #[must_use]
    pub fn new(buf: &'b mut [u8]) -> Self {
        Self {
            buf,
            written: 0,
            logical: 0,
            overflow: false,
        }
    }

    /// Size of the backing buffer, terminator slot included.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Bytes physically stored so far (never more than `capacity - 1`).
    #[must_use]
    pub fn written(&self) -> usize {
        self.written
    }

    /// Bytes the output would occupy with unlimited capacity.
    #[must_use]
    pub fn logical_len(&self) -> u64 {
        self.logical
    }

    /// True once the logical length counter has wrapped.
    #[must_use]
    pub fn overflowed(&self) -> bool {
        self.overflow
    }

    /// The stored bytes, without terminator.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.written]
    }

    fn room(&self) -> usize {
        self.buf.len().saturating_sub(1) - self.written
    }

    fn advance(&mut self, count: usize) {
        match self.logical.checked_add(count as u64) {
            Some(next) => self.logical = next,
            None => {
                self.logical = u64::MAX;
                self.overflow = true;
            }
        }
    }

    /// Emit one byte.
    #[inline]
    pub fn put(&mut self, byte: u8) {
        self.advance(1);
        if self.room() > 0 {
            self.buf[self.written] = byte;
            self.written += 1;
        }
    }

    /// Emit a run of bytes, storing the prefix that fits.
    pub fn put_bytes(&mut self, bytes: &[u8]) {
        self.advance(bytes.len());
        let n = bytes.len().min(self.room());
        self.buf[self.written..self.written + n].copy_from_slice(&bytes[..n]);
        self.written += n;
    }

    /// Emit `count` copies of `byte`.
    pub fn put_repeat(&mut self, byte: u8, count: usize) {
        self.advance(count);
        let n = count.min(self.room());
        self.buf[self.written..self.written + n].fill(byte);
        self.written += n;
    }

    /// Write the NUL terminator after the stored bytes (no-op for an empty buffer).
    pub fn finish(&mut self) {
        if let Some(slot) = self.buf.get_mut(self.written) {
            *slot = 0;
        }
    }
}
