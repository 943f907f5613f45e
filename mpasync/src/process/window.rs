use std::io::{self, Read, Seek, SeekFrom};

use log::debug;

use crate::utils::errors::ProbeError;

/// Default capacity of the probe window in bytes.
pub const DEFAULT_WINDOW_SIZE: usize = 1024;

/// Fixed-capacity byte window over a seekable input.
///
/// All stream I/O of the prober goes through [`Window::refill`] and
/// [`Window::skip`]; the parsing side only indexes the buffered bytes.
///
/// The cursor may sit up to three bytes before the window start when a
/// header found by a byte scan straddles a refill. Offsets computed from it
/// stay correct because they are relative to [`Window::offset`].
#[derive(Debug)]
pub struct Window {
    data: Box<[u8]>,
    len: usize,
    cursor: isize,
    offset: u64,
}

impl Window {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity].into_boxed_slice(),
            len: 0,
            cursor: 0,
            offset: 0,
        }
    }

    /// Replaces the buffered bytes with the next bytes of `src`.
    ///
    /// Records the stream offset the window starts at and resets the cursor.
    /// Returns the number of bytes buffered, never zero.
    pub fn refill<R: Read + Seek + ?Sized>(&mut self, src: &mut R) -> Result<usize, ProbeError> {
        self.offset = src.stream_position()?;
        self.len = read_full(src, &mut self.data)?;
        self.cursor = 0;

        if self.len == 0 {
            return Err(ProbeError::StreamExhausted(self.offset));
        }

        debug!("Rebuffered {} bytes at {:#010X}", self.len, self.offset);
        Ok(self.len)
    }

    /// Moves the cursor `distance` bytes forward, seeking the stream when
    /// the target lies beyond the buffered bytes.
    ///
    /// Returns `true` when the window has to be refilled before reading.
    pub fn skip<R: Seek + ?Sized>(
        &mut self,
        src: &mut R,
        distance: usize,
        lookahead: usize,
    ) -> io::Result<bool> {
        let target = self.cursor + distance as isize;
        if target + (lookahead as isize) < self.len as isize {
            self.cursor = target;
            return Ok(false);
        }

        // The stream sits right after the buffered bytes.
        let delta = target as i64 - self.len as i64;
        src.seek(SeekFrom::Current(delta))?;
        debug!("Skipping {delta} bytes past the window");
        Ok(true)
    }

    /// Bytes from the cursor to the end of the buffered data.
    pub fn rest(&self) -> &[u8] {
        let start = self.cursor.clamp(0, self.len as isize) as usize;
        &self.data[start..self.len]
    }

    pub fn remaining(&self) -> usize {
        (self.len as isize - self.cursor).max(0) as usize
    }

    /// Returns the byte at the cursor and advances past it.
    pub fn next_byte(&mut self) -> Option<u8> {
        // Bytes before the window start are gone after a refill.
        self.cursor = self.cursor.max(0);

        let byte = *self.data[..self.len].get(self.cursor as usize)?;
        self.cursor += 1;
        Some(byte)
    }

    pub fn advance(&mut self, n: usize) {
        self.cursor += n as isize;
    }

    pub fn rewind(&mut self, n: usize) {
        self.cursor -= n as isize;
    }

    pub fn cursor(&self) -> isize {
        self.cursor
    }

    /// Stream offset of the first buffered byte.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Stream offset of the cursor.
    pub fn position(&self) -> u64 {
        self.offset.saturating_add_signed(self.cursor as i64)
    }
}

/// Reads until `buf` is full or the source reports end of stream.
fn read_full<R: Read + ?Sized>(src: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;

    while filled < buf.len() {
        match src.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }

    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn refill_tracks_offset() -> anyhow::Result<()> {
        let data: Vec<u8> = (0..=255u8).cycle().take(40).collect();
        let mut src = Cursor::new(data);
        let mut window = Window::with_capacity(16);

        assert_eq!(window.refill(&mut src)?, 16);
        assert_eq!(window.offset(), 0);
        assert_eq!(window.rest()[0], 0);

        window.advance(5);
        assert_eq!(window.position(), 5);
        assert_eq!(window.remaining(), 11);

        assert_eq!(window.refill(&mut src)?, 16);
        assert_eq!(window.offset(), 16);
        assert_eq!(window.cursor(), 0);

        assert_eq!(window.refill(&mut src)?, 8);
        assert_eq!(window.offset(), 32);
        assert_eq!(window.rest(), &[32, 33, 34, 35, 36, 37, 38, 39]);
        Ok(())
    }

    #[test]
    fn empty_refill_is_exhaustion() {
        let mut src = Cursor::new(vec![1u8, 2, 3]);
        let mut window = Window::with_capacity(8);

        assert_eq!(window.refill(&mut src).unwrap(), 3);
        assert!(matches!(
            window.refill(&mut src),
            Err(ProbeError::StreamExhausted(3))
        ));
    }

    #[test]
    fn skip_within_and_beyond_window() -> anyhow::Result<()> {
        let data: Vec<u8> = (0..100u8).collect();
        let mut src = Cursor::new(data);
        let mut window = Window::with_capacity(32);
        window.refill(&mut src)?;

        assert!(!window.skip(&mut src, 10, 16)?);
        assert_eq!(window.position(), 10);

        // 10 + 10 + 16 reaches past the 32 buffered bytes.
        assert!(window.skip(&mut src, 10, 16)?);
        window.refill(&mut src)?;
        assert_eq!(window.offset(), 20);
        assert_eq!(window.rest()[0], 20);
        Ok(())
    }

    #[test]
    fn cursor_before_window_start() -> anyhow::Result<()> {
        let data: Vec<u8> = (0..64u8).collect();
        let mut src = Cursor::new(data);
        let mut window = Window::with_capacity(16);
        window.refill(&mut src)?;
        window.refill(&mut src)?;

        assert_eq!(window.next_byte(), Some(16));
        window.rewind(3);
        assert_eq!(window.cursor(), -2);
        assert_eq!(window.position(), 14);
        assert_eq!(window.remaining(), 18);

        // A 20 byte frame starting at 14 ends at 34.
        assert!(window.skip(&mut src, 20, 16)?);
        window.refill(&mut src)?;
        assert_eq!(window.offset(), 34);
        Ok(())
    }

    #[test]
    fn next_byte_stops_at_end() -> anyhow::Result<()> {
        let mut src = Cursor::new(vec![7u8, 8]);
        let mut window = Window::with_capacity(8);
        window.refill(&mut src)?;

        assert_eq!(window.next_byte(), Some(7));
        assert_eq!(window.next_byte(), Some(8));
        assert_eq!(window.next_byte(), None);
        assert_eq!(window.remaining(), 0);
        Ok(())
    }
}
