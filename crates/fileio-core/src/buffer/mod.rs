//! Buffer engine.
//!
//! One contiguous byte region serving both I/O directions, never both at
//! once. While writing, `pos` is the next free byte and everything before it
//! is pending output. While reading, `pos` is the next byte to consume and
//! `rem` counts what the last refill left. The handle resets the accounting
//! whenever the direction toggles.

/// Fallback buffer length when the backend reports no preferred block size.
pub const DEFAULT_BUFFER_SIZE: usize = 8192;

/// The internal buffer and its bookkeeping.
#[derive(Debug)]
pub struct BufferEngine {
    data: Box<[u8]>,
    pos: usize,
    rem: usize,
}

impl BufferEngine {
    /// Allocates a buffer of `len` bytes (at least 1).
    pub fn new(len: usize) -> BufferEngine {
        BufferEngine {
            data: vec![0u8; len.max(1)].into_boxed_slice(),
            pos: 0,
            rem: 0,
        }
    }

    /// Total capacity in bytes.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True when neither direction holds any bytes.
    pub fn is_empty(&self) -> bool {
        self.pos == 0 && self.rem == 0
    }

    // -----------------------------------------------------------------------
    // Writing direction
    // -----------------------------------------------------------------------

    /// Pending output bytes.
    pub fn bytes_used(&self) -> usize {
        self.pos
    }

    /// Free space before a flush is forced.
    pub fn space_left(&self) -> usize {
        self.data.len() - self.pos
    }

    /// Whether `n` more bytes fit without flushing.
    pub fn fits(&self, n: usize) -> bool {
        self.space_left() >= n
    }

    /// True when no output is pending.
    pub fn is_clear(&self) -> bool {
        self.pos == 0
    }

    /// Copies `src` in at the cursor. `src` must fit.
    pub fn copy_in(&mut self, src: &[u8]) {
        debug_assert!(self.fits(src.len()));
        self.data[self.pos..self.pos + src.len()].copy_from_slice(src);
        self.pos += src.len();
    }

    /// The pending output, from the buffer start to the cursor.
    pub fn pending(&self) -> &[u8] {
        &self.data[..self.pos]
    }

    /// The free tail from the cursor on, for in-place encoding.
    pub fn tail_mut(&mut self) -> &mut [u8] {
        &mut self.data[self.pos..]
    }

    /// Accepts `n` bytes written into the tail.
    pub fn advance(&mut self, n: usize) {
        debug_assert!(n <= self.space_left());
        self.pos += n;
    }

    /// All pending output left the backend; the buffer is clear again.
    pub fn mark_flushed(&mut self) {
        self.pos = 0;
    }

    /// A flush stopped after `flushed` bytes: keep the unwritten remainder,
    /// moved to the buffer start, so a later flush can retry it.
    pub fn retain_unflushed(&mut self, flushed: usize) {
        debug_assert!(flushed <= self.pos);
        self.data.copy_within(flushed..self.pos, 0);
        self.pos -= flushed;
    }

    // -----------------------------------------------------------------------
    // Reading direction
    // -----------------------------------------------------------------------

    /// Read-ahead bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.rem
    }

    /// Copies up to `dst.len()` read-ahead bytes out, returning the count.
    pub fn copy_out(&mut self, dst: &mut [u8]) -> usize {
        let n = dst.len().min(self.rem);
        dst[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        self.rem -= n;
        n
    }

    /// Consumes one read-ahead byte.
    pub fn take_byte(&mut self) -> Option<u8> {
        if self.rem == 0 {
            return None;
        }
        let c = self.data[self.pos];
        self.pos += 1;
        self.rem -= 1;
        Some(c)
    }

    /// The whole buffer, as a refill target. Follow with [`set_filled`].
    ///
    /// [`set_filled`]: BufferEngine::set_filled
    pub fn fill_target(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// A refill deposited `n` bytes at the buffer start.
    pub fn set_filled(&mut self, n: usize) {
        debug_assert!(n <= self.data.len());
        self.pos = 0;
        self.rem = n;
    }

    /// Discards all bookkeeping in both directions.
    pub fn reset(&mut self) {
        self.pos = 0;
        self.rem = 0;
    }
}
