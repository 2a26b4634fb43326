//! Stream cursors shared between the caller and an engine.
//!
//! A compress/decompress session is driven by repeated calls. Each call
//! borrows one input slice and one output slice through a
//! [`StreamContext`]; the engine advances `next_in`/`next_out` in place and
//! the caller inspects them afterwards. Values that must survive from one
//! call to the next (totals, running checksum, last message) live in a
//! [`StreamInfo`] owned by the engine.

/// Per-call input/output cursor record.
///
/// ```
/// use zcodec_core::stream::StreamContext;
///
/// let input = b"abc";
/// let mut output = [0u8; 8];
/// let mut strm = StreamContext::new(input, &mut output);
/// assert_eq!(strm.avail_in(), 3);
/// assert_eq!(strm.avail_out(), 8);
/// ```
#[derive(Debug)]
pub struct StreamContext<'a> {
    /// Input bytes available for this call.
    pub input: &'a [u8],
    /// Read cursor into `input`.
    pub next_in: usize,
    /// Output space available for this call.
    pub output: &'a mut [u8],
    /// Write cursor into `output`.
    pub next_out: usize,
}

impl<'a> StreamContext<'a> {
    /// Create a cursor over `input` and `output`, both positioned at 0.
    pub fn new(input: &'a [u8], output: &'a mut [u8]) -> Self {
        Self {
            input,
            next_in: 0,
            output,
            next_out: 0,
        }
    }

    /// Bytes of input not yet consumed.
    #[inline]
    pub fn avail_in(&self) -> usize {
        self.input.len() - self.next_in
    }

    /// Bytes of output space not yet filled.
    #[inline]
    pub fn avail_out(&self) -> usize {
        self.output.len() - self.next_out
    }

    /// Unconsumed input.
    #[inline]
    pub fn remaining_input(&self) -> &[u8] {
        &self.input[self.next_in..]
    }

    /// Output written so far in this context.
    #[inline]
    pub fn written(&self) -> &[u8] {
        &self.output[..self.next_out]
    }

    /// Take the next input byte, if any.
    #[inline]
    pub fn next_byte(&mut self) -> Option<u8> {
        let byte = self.input.get(self.next_in).copied()?;
        self.next_in += 1;
        Some(byte)
    }

    /// Copy as much of `data` as fits into the output; returns the count.
    #[inline]
    pub fn write_output(&mut self, data: &[u8]) -> usize {
        let len = data.len().min(self.avail_out());
        self.output[self.next_out..self.next_out + len].copy_from_slice(&data[..len]);
        self.next_out += len;
        len
    }
}

/// Persistent per-session counters and diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamInfo {
    /// Total input bytes consumed over the session.
    pub total_in: u64,
    /// Total output bytes produced over the session.
    pub total_out: u64,
    /// Running checksum: Adler-32 for zlib, CRC-32 for gzip, 0 for raw.
    pub adler: u32,
    /// Last diagnostic message, set on error.
    pub msg: Option<&'static str>,
    /// Data type hint: detected text/binary on the compress side, block
    /// position bits on the decompress side.
    pub data_type: i32,
}

impl StreamInfo {
    /// Clear counters and message, keeping nothing from a previous session.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Data type detected by the compressor.
pub mod data_type {
    /// Binary data.
    pub const BINARY: i32 = 0;
    /// Text data.
    pub const TEXT: i32 = 1;
    /// Not yet known.
    pub const UNKNOWN: i32 = 2;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_advances() {
        let input = [1u8, 2, 3];
        let mut output = [0u8; 2];
        let mut strm = StreamContext::new(&input, &mut output);

        assert_eq!(strm.next_byte(), Some(1));
        assert_eq!(strm.avail_in(), 2);
        assert_eq!(strm.remaining_input(), &[2, 3]);

        assert_eq!(strm.write_output(&[9, 8, 7]), 2);
        assert_eq!(strm.avail_out(), 0);
        assert_eq!(strm.written(), &[9, 8]);
    }

    #[test]
    fn test_next_byte_exhausted() {
        let mut output: [u8; 0] = [];
        let mut strm = StreamContext::new(&[], &mut output);
        assert_eq!(strm.next_byte(), None);
        assert_eq!(strm.next_in, 0);
    }

    #[test]
    fn test_info_reset() {
        let mut info = StreamInfo {
            total_in: 5,
            total_out: 7,
            adler: 3,
            msg: Some("bad"),
            data_type: 1,
        };
        info.reset();
        assert_eq!(info, StreamInfo::default());
    }
}
