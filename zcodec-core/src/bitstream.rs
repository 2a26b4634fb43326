//! Bit-level staging for the DEFLATE encoder and decoder.
//!
//! Both directions of DEFLATE pack variable-length codes LSB-first within
//! bytes. Neither side owns an I/O handle: the caller lends a fresh pair of
//! slices on every call through a [`StreamContext`], so bits are staged in
//! memory between calls.
//!
//! - [`PendingBuf`] collects compressed output. Codes are accumulated in a
//!   64-bit register and spilled as whole bytes into a byte queue, which is
//!   drained into the caller's output whenever there is room.
//! - [`BitAccumulator`] holds input bits pulled from the caller's input but
//!   not yet consumed by the decoder.
//!
//! # Example
//!
//! ```
//! use zcodec_core::bitstream::{BitAccumulator, PendingBuf};
//! use zcodec_core::stream::StreamContext;
//!
//! let mut pending = PendingBuf::with_capacity(64);
//! pending.send_bits(0b101, 3);
//! pending.send_bits(0b1100, 4);
//! pending.windup();
//!
//! let mut out = [0u8; 4];
//! let mut strm = StreamContext::new(&[], &mut out);
//! assert_eq!(pending.flush_to(&mut strm), 1);
//!
//! let written = [out[0]];
//! let mut dummy = [0u8; 0];
//! let mut strm = StreamContext::new(&written, &mut dummy);
//! let mut acc = BitAccumulator::new();
//! assert!(acc.need(&mut strm, 7));
//! assert_eq!(acc.take(3), 0b101);
//! assert_eq!(acc.take(4), 0b1100);
//! ```

use crate::stream::StreamContext;

/// Staging buffer for compressed output not yet delivered to the caller.
///
/// `capacity` is the nominal size used by the encoder to decide when a block
/// must be flushed; the backing storage may grow past it when a stored block
/// is emitted in one piece.
#[derive(Debug, Clone)]
pub struct PendingBuf {
    /// Queued output bytes; `buf[out..]` is still undelivered.
    buf: Vec<u8>,
    /// Delivery cursor into `buf`.
    out: usize,
    /// Nominal capacity.
    capacity: usize,
    /// Bit register (LSB-first).
    bit_buf: u64,
    /// Number of valid bits in `bit_buf`.
    bit_count: u32,
}

impl PendingBuf {
    /// Create an empty buffer with the given nominal capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: Vec::with_capacity(capacity),
            out: 0,
            capacity,
            bit_buf: 0,
            bit_count: 0,
        }
    }

    /// Nominal capacity in bytes.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of whole bytes waiting to be delivered.
    #[inline]
    pub fn pending(&self) -> usize {
        self.buf.len() - self.out
    }

    /// Number of bits in the register that do not yet form a queued byte.
    #[inline]
    pub fn bit_count(&self) -> u32 {
        self.bit_count
    }

    /// Whether nothing at all is waiting, neither bytes nor bits.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.pending() == 0 && self.bit_count == 0
    }

    /// Drop everything, bytes and bits.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.out = 0;
        self.bit_buf = 0;
        self.bit_count = 0;
    }

    /// Queue one byte. The bit register must be empty.
    #[inline]
    pub fn put_byte(&mut self, byte: u8) {
        debug_assert!(self.bit_count == 0);
        self.buf.push(byte);
    }

    /// Queue a 16-bit value, least significant byte first.
    #[inline]
    pub fn put_short(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Queue a 16-bit value, most significant byte first.
    #[inline]
    pub fn put_short_msb(&mut self, value: u16) {
        self.buf.extend_from_slice(&value.to_be_bytes());
    }

    /// Queue a 32-bit value, least significant byte first.
    #[inline]
    pub fn put_u32_le(&mut self, value: u32) {
        self.buf.extend_from_slice(&value.to_le_bytes());
    }

    /// Queue raw bytes. The bit register must be empty.
    #[inline]
    pub fn put_bytes(&mut self, data: &[u8]) {
        debug_assert!(self.bit_count == 0);
        self.buf.extend_from_slice(data);
    }

    /// Position marker for [`since`](Self::since).
    ///
    /// Markers are invalidated by a [`flush_to`](Self::flush_to) that drains
    /// the queue completely.
    #[inline]
    pub fn mark(&self) -> usize {
        self.buf.len()
    }

    /// Bytes queued after `mark` was taken.
    #[inline]
    pub fn since(&self, mark: usize) -> &[u8] {
        &self.buf[mark.min(self.buf.len())..]
    }

    /// Append `length` low bits of `value` to the bit register.
    #[inline]
    pub fn send_bits(&mut self, value: u32, length: u32) {
        debug_assert!(length <= 32);
        if length == 0 {
            return;
        }
        let mask = if length == 32 {
            u32::MAX
        } else {
            (1u32 << length) - 1
        };
        self.bit_buf |= u64::from(value & mask) << self.bit_count;
        self.bit_count += length;
        if self.bit_count >= 32 {
            self.buf
                .extend_from_slice(&(self.bit_buf as u32).to_le_bytes());
            self.bit_buf >>= 32;
            self.bit_count -= 32;
        }
    }

    /// Move every whole byte of the bit register into the queue, leaving at
    /// most 7 bits behind.
    #[inline]
    pub fn flush_bits(&mut self) {
        while self.bit_count >= 8 {
            self.buf.push(self.bit_buf as u8);
            self.bit_buf >>= 8;
            self.bit_count -= 8;
        }
    }

    /// Pad the bit register with zeros to a byte boundary and queue it.
    #[inline]
    pub fn windup(&mut self) {
        self.flush_bits();
        if self.bit_count > 0 {
            self.buf.push(self.bit_buf as u8);
        }
        self.bit_buf = 0;
        self.bit_count = 0;
    }

    /// Deliver as many queued bytes as fit into `strm`'s output.
    ///
    /// Whole bytes of the bit register are queued first. Returns the number
    /// of bytes written.
    pub fn flush_to(&mut self, strm: &mut StreamContext<'_>) -> usize {
        self.flush_bits();
        let written = strm.write_output(&self.buf[self.out..]);
        self.out += written;
        if self.out == self.buf.len() {
            self.buf.clear();
            self.out = 0;
        }
        written
    }
}

/// Input bit accumulator for the decoder.
///
/// Holds fewer than 64 bits; the decoder never asks for more than 32 at a
/// time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BitAccumulator {
    hold: u64,
    bits: u32,
}

impl BitAccumulator {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Discard all held bits.
    #[inline]
    pub fn clear(&mut self) {
        self.hold = 0;
        self.bits = 0;
    }

    /// Raw register contents.
    #[inline]
    pub fn hold(&self) -> u64 {
        self.hold
    }

    /// Number of valid bits.
    #[inline]
    pub fn bits(&self) -> u32 {
        self.bits
    }

    /// Append one input byte above the current bits.
    #[inline]
    pub fn pull_byte(&mut self, byte: u8) {
        self.hold |= u64::from(byte) << self.bits;
        self.bits += 8;
    }

    /// Pull bytes from `strm` until at least `n` bits are held.
    ///
    /// Returns `false` if the input ran out first; whatever was pulled is
    /// kept so the next call can resume.
    #[inline]
    pub fn need(&mut self, strm: &mut StreamContext<'_>, n: u32) -> bool {
        while self.bits < n {
            match strm.next_byte() {
                Some(byte) => self.pull_byte(byte),
                None => return false,
            }
        }
        true
    }

    /// Low `n` bits without consuming them.
    #[inline]
    pub fn peek(&self, n: u32) -> u32 {
        if n == 0 {
            return 0;
        }
        (self.hold & ((1u64 << n) - 1)) as u32
    }

    /// Consume `n` bits.
    #[inline]
    pub fn drop_bits(&mut self, n: u32) {
        debug_assert!(n <= self.bits);
        self.hold >>= n;
        self.bits -= n;
    }

    /// Return the low `n` bits and consume them.
    #[inline]
    pub fn take(&mut self, n: u32) -> u32 {
        let value = self.peek(n);
        self.drop_bits(n);
        value
    }

    /// Discard bits up to the next byte boundary.
    #[inline]
    pub fn byte_align(&mut self) {
        let extra = self.bits & 7;
        self.drop_bits(extra);
    }

    /// Give back whole unused bytes: drops them from the register and
    /// returns how many input bytes the caller should rewind.
    #[inline]
    pub fn return_whole_bytes(&mut self) -> usize {
        let len = (self.bits >> 3) as usize;
        self.bits -= (len as u32) << 3;
        self.hold &= (1u64 << self.bits) - 1;
        len
    }
}
