//! Line reframing buffer for the phone feed.
//!
//! The feed is newline-delimited JSON but arrives in arbitrary TCP/UDS
//! chunks. Bytes accumulate here until a `\n` completes a line; a full
//! buffer with no newline means the peer sent an oversized record, and
//! the only safe recovery is to discard everything and resynchronize at
//! the next newline boundary.

/// Fixed-capacity accumulator that turns a byte stream into lines.
pub struct LineBuffer {
    buf: Vec<u8>,
    capacity: usize,
    overflows: u64,
}

impl LineBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            capacity,
            overflows: 0,
        }
    }

    /// Free space remaining. Reads must never exceed this.
    pub fn space(&self) -> usize {
        self.capacity - self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    /// Append a chunk. Callers size their reads with [`space`](Self::space),
    /// so this never grows past capacity.
    pub fn push(&mut self, chunk: &[u8]) {
        debug_assert!(chunk.len() <= self.space());
        self.buf.extend_from_slice(chunk);
    }

    /// Extract every complete line currently buffered, without the
    /// trailing newline. Blank lines are dropped. Any trailing partial
    /// line stays buffered for the next chunk.
    pub fn take_lines(&mut self) -> Vec<Vec<u8>> {
        let mut lines = Vec::new();
        let mut start = 0;
        for (i, &b) in self.buf.iter().enumerate() {
            if b == b'\n' {
                if i > start {
                    lines.push(self.buf[start..i].to_vec());
                }
                start = i + 1;
            }
        }
        if start > 0 {
            self.buf.drain(..start);
        }
        lines
    }

    /// Discard everything if the buffer filled up without a newline.
    /// Returns the number of bytes dropped, or `None` if there is still
    /// room. The tail of the oversized record still frames as a bogus
    /// line once its newline arrives; the decoder rejects it. Lines
    /// after that frame normally.
    pub fn resync_on_overflow(&mut self) -> Option<usize> {
        if self.buf.len() < self.capacity {
            return None;
        }
        let dropped = self.buf.len();
        self.buf.clear();
        self.overflows += 1;
        Some(dropped)
    }

    /// Drop any partial line, e.g. after a disconnect.
    pub fn clear(&mut self) {
        self.buf.clear();
    }

    pub fn overflows(&self) -> u64 {
        self.overflows
    }
}
