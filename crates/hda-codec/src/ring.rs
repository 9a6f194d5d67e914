/// Power-of-two ring buffer addressed by free-running cursors.
///
/// `rpos` and `wpos` only ever grow; the physical offset of a cursor is `cursor & mask`. Fill level
/// is `wpos - rpos` regardless of how often the cursors have wrapped.
#[derive(Debug, Clone)]
pub struct RingBuffer {
    buf: Vec<u8>,
    rpos: u64,
    wpos: u64,
}

impl RingBuffer {
    /// Capacity of the per-stream ring.
    pub const CAPACITY: usize = 8192;

    pub fn new() -> Self {
        Self::with_capacity(Self::CAPACITY)
    }

    /// `capacity` is rounded up to a power of two.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0; capacity.max(1).next_power_of_two()],
            rpos: 0,
            wpos: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    fn mask(&self) -> u64 {
        self.buf.len() as u64 - 1
    }

    pub fn rpos(&self) -> u64 {
        self.rpos
    }

    pub fn wpos(&self) -> u64 {
        self.wpos
    }

    pub fn used(&self) -> usize {
        (self.wpos - self.rpos) as usize
    }

    pub fn free(&self) -> usize {
        self.capacity() - self.used()
    }

    pub fn is_empty(&self) -> bool {
        self.wpos == self.rpos
    }

    pub fn is_full(&self) -> bool {
        self.used() == self.capacity()
    }

    /// Rewind both cursors to 0. Contents are left in place.
    pub fn reset(&mut self) {
        self.rpos = 0;
        self.wpos = 0;
    }

    /// Contiguous free region starting at `wpos`, at most `max` bytes, never crossing the physical
    /// end of the buffer.
    pub fn write_chunk(&mut self, max: usize) -> &mut [u8] {
        let start = (self.wpos & self.mask()) as usize;
        let len = max.min(self.free()).min(self.capacity() - start);
        &mut self.buf[start..start + len]
    }

    /// Advance `wpos` after filling a [`Self::write_chunk`].
    pub fn commit_write(&mut self, len: usize) {
        debug_assert!(len <= self.free());
        self.wpos += len.min(self.free()) as u64;
    }

    /// Contiguous filled region starting at `rpos`, at most `max` bytes, never crossing the physical
    /// end of the buffer.
    pub fn read_chunk(&self, max: usize) -> &[u8] {
        let start = (self.rpos & self.mask()) as usize;
        let len = max.min(self.used()).min(self.capacity() - start);
        &self.buf[start..start + len]
    }

    /// Mutable view of [`Self::read_chunk`], for transfer primitives that take `&mut [u8]` in
    /// both directions.
    pub fn read_chunk_mut(&mut self, max: usize) -> &mut [u8] {
        let start = (self.rpos & self.mask()) as usize;
        let len = max.min(self.used()).min(self.capacity() - start);
        &mut self.buf[start..start + len]
    }

    /// Advance `rpos` after draining a [`Self::read_chunk`].
    pub fn commit_read(&mut self, len: usize) {
        debug_assert!(len <= self.used());
        self.rpos += len.min(self.used()) as u64;
    }

    /// Copy as much of `data` as fits, returning the byte count taken.
    pub fn push(&mut self, data: &[u8]) -> usize {
        let mut done = 0;
        while done < data.len() {
            let chunk = self.write_chunk(data.len() - done);
            if chunk.is_empty() {
                break;
            }
            let n = chunk.len();
            chunk.copy_from_slice(&data[done..done + n]);
            self.commit_write(n);
            done += n;
        }
        done
    }

    /// Drain up to `out.len()` bytes, returning the byte count produced.
    pub fn pop(&mut self, out: &mut [u8]) -> usize {
        let mut done = 0;
        while done < out.len() {
            let chunk = self.read_chunk(out.len() - done);
            if chunk.is_empty() {
                break;
            }
            let n = chunk.len();
            out[done..done + n].copy_from_slice(chunk);
            self.commit_read(n);
            done += n;
        }
        done
    }

    /// Raw physical contents, for snapshots.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Reinstall snapshot contents and cursors. Returns `false`, leaving `self` untouched, if the
    /// contents have the wrong size or the cursors are inconsistent.
    pub fn restore(&mut self, buf: &[u8], rpos: u64, wpos: u64) -> bool {
        if buf.len() != self.buf.len() || wpos < rpos || wpos - rpos > self.buf.len() as u64 {
            return false;
        }
        self.buf.copy_from_slice(buf);
        self.rpos = rpos;
        self.wpos = wpos;
        true
    }
}

impl Default for RingBuffer {
    fn default() -> Self {
        Self::new()
    }
}
