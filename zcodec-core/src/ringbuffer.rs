//! Sliding history window for DEFLATE decompression.
//!
//! The decoder writes straight into the caller's output slice. Back-references
//! that reach further back than the current call's output are resolved from
//! this window, which keeps the most recent `2^wbits` bytes produced over the
//! whole session. The window is circular: `wnext` is where the next byte goes
//! and `whave` counts valid bytes (saturating at `wsize`).
//!
//! Storage is allocated on first use, so a stream that completes in a single
//! call never pays for it.

use crate::error::{CodecError, Result};

/// Largest window: 32 KiB (`windowBits = 15`).
pub const MAX_WINDOW_BITS: u32 = 15;

/// Circular history buffer for the decoder.
#[derive(Debug, Clone, Default)]
pub struct SlidingWindow {
    /// Backing storage, empty until first use.
    buffer: Vec<u8>,
    /// log2 of the window size to allocate.
    wbits: u32,
    /// Active window size, 0 until storage is in use.
    wsize: usize,
    /// Valid bytes in the window.
    whave: usize,
    /// Write position.
    wnext: usize,
}

impl SlidingWindow {
    /// Create an unallocated window of `2^wbits` bytes.
    pub fn new(wbits: u32) -> Self {
        Self {
            wbits,
            ..Self::default()
        }
    }

    /// log2 of the window size.
    #[inline]
    pub fn wbits(&self) -> u32 {
        self.wbits
    }

    /// Change the window size. Storage of a different size is released.
    pub fn set_wbits(&mut self, wbits: u32) {
        if wbits != self.wbits {
            self.buffer = Vec::new();
        }
        self.wbits = wbits;
        self.clear();
    }

    /// Active window size; 0 until the first [`update`](Self::update).
    #[inline]
    pub fn wsize(&self) -> usize {
        self.wsize
    }

    /// Number of valid history bytes.
    #[inline]
    pub fn whave(&self) -> usize {
        self.whave
    }

    /// Next write position.
    #[inline]
    pub fn wnext(&self) -> usize {
        self.wnext
    }

    /// Forget the history but keep the storage.
    pub fn clear(&mut self) {
        self.wsize = 0;
        self.whave = 0;
        self.wnext = 0;
    }

    /// Release the storage.
    pub fn release(&mut self) {
        self.buffer = Vec::new();
        self.clear();
    }

    fn ensure_allocated(&mut self) -> Result<()> {
        let size = 1usize << self.wbits;
        if self.buffer.len() != size {
            let mut buffer = Vec::new();
            buffer
                .try_reserve_exact(size)
                .map_err(|_| CodecError::Mem)?;
            buffer.resize(size, 0);
            self.buffer = buffer;
        }
        if self.wsize == 0 {
            self.wsize = size;
            self.wnext = 0;
            self.whave = 0;
        }
        Ok(())
    }

    /// Append `data`, the most recent output, to the history.
    ///
    /// Only the last `wsize` bytes of `data` matter.
    pub fn update(&mut self, data: &[u8]) -> Result<()> {
        self.ensure_allocated()?;
        let wsize = self.wsize;

        if data.len() >= wsize {
            self.buffer[..wsize].copy_from_slice(&data[data.len() - wsize..]);
            self.wnext = 0;
            self.whave = wsize;
            return Ok(());
        }

        let mut copy = data.len();
        let dist = (wsize - self.wnext).min(copy);
        let start = data.len() - copy;
        self.buffer[self.wnext..self.wnext + dist].copy_from_slice(&data[start..start + dist]);
        copy -= dist;
        if copy > 0 {
            self.buffer[..copy].copy_from_slice(&data[data.len() - copy..]);
            self.wnext = copy;
            self.whave = wsize;
        } else {
            self.wnext += dist;
            if self.wnext == wsize {
                self.wnext = 0;
            }
            if self.whave < wsize {
                self.whave += dist;
            }
        }
        Ok(())
    }

    /// Contiguous run of history starting `dist` bytes before the write
    /// position, ending at the wrap point or at `wnext`.
    ///
    /// `dist` must be in `1..=whave`.
    #[inline]
    pub fn history(&self, dist: usize) -> &[u8] {
        debug_assert!(dist > 0 && dist <= self.whave);
        if dist > self.wnext {
            let back = dist - self.wnext;
            &self.buffer[self.wsize - back..self.wsize]
        } else {
            &self.buffer[self.wnext - dist..self.wnext]
        }
    }

    /// Copy of the valid history, oldest byte first.
    pub fn contents(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.whave);
        if self.whave == 0 {
            return out;
        }
        out.extend_from_slice(&self.buffer[self.wnext..self.whave]);
        out.extend_from_slice(&self.buffer[..self.wnext]);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lazy_allocation() {
        let window = SlidingWindow::new(9);
        assert_eq!(window.wsize(), 0);
        assert_eq!(window.whave(), 0);
        assert!(window.contents().is_empty());
    }

    #[test]
    fn test_update_small_then_history() {
        let mut window = SlidingWindow::new(9);
        window.update(b"hello").unwrap();
        assert_eq!(window.wsize(), 512);
        assert_eq!(window.whave(), 5);
        assert_eq!(window.wnext(), 5);
        assert_eq!(window.history(3), b"llo");
        assert_eq!(window.contents(), b"hello");
    }

    #[test]
    fn test_update_wraps() {
        let mut window = SlidingWindow::new(9);
        let first: Vec<u8> = (0..500u32).map(|i| i as u8).collect();
        window.update(&first).unwrap();
        let second: Vec<u8> = (500..530u32).map(|i| i as u8).collect();
        window.update(&second).unwrap();

        assert_eq!(window.whave(), 512);
        assert_eq!(window.wnext(), 18);

        let expected: Vec<u8> = (18..530u32).map(|i| i as u8).collect();
        assert_eq!(window.contents(), expected);

        // 20 back crosses the wrap point: first segment ends at wsize.
        let seg = window.history(20);
        assert_eq!(seg, &[(510u32) as u8, (511u32) as u8][..]);
    }

    #[test]
    fn test_update_larger_than_window() {
        let mut window = SlidingWindow::new(9);
        let data: Vec<u8> = (0..2000u32).map(|i| (i % 251) as u8).collect();
        window.update(&data).unwrap();
        assert_eq!(window.whave(), 512);
        assert_eq!(window.wnext(), 0);
        assert_eq!(window.contents(), &data[data.len() - 512..]);
    }

    #[test]
    fn test_set_wbits_clears() {
        let mut window = SlidingWindow::new(9);
        window.update(b"abc").unwrap();
        window.set_wbits(10);
        assert_eq!(window.whave(), 0);
        window.update(b"x").unwrap();
        assert_eq!(window.wsize(), 1024);
    }
}
