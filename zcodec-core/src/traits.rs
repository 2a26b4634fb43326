//! Core traits and parameter types for streaming compression.
//!
//! The engines are driven one step at a time: each step borrows a
//! [`StreamContext`], makes as much progress as the two slices allow and
//! reports a [`Status`]. The traits here give both directions a common
//! shape plus "run to completion" helpers for in-memory use.

use crate::error::{CodecError, Result, Status};
use crate::stream::StreamContext;

/// Output chunk used by the provided `*_all` helpers.
const ALL_CHUNK: usize = 32768;

/// Flush mode for a `deflate`/`inflate` step.
///
/// Values are ordered by strength; the numeric form is the zlib constant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum Flush {
    /// Buffer as much as possible.
    #[default]
    NoFlush = 0,
    /// Emit pending output, byte-aligned with an empty fixed block.
    Partial = 1,
    /// Emit pending output followed by an empty stored block.
    Sync = 2,
    /// Like `Sync`, and forget history so no match crosses this point.
    Full = 3,
    /// Complete the stream.
    Finish = 4,
    /// Stop at the next block boundary.
    Block = 5,
    /// Stop after the next block header (decoder only).
    Trees = 6,
}

impl Flush {
    /// Parse a zlib flush constant.
    pub fn from_i32(value: i32) -> Result<Self> {
        Ok(match value {
            0 => Self::NoFlush,
            1 => Self::Partial,
            2 => Self::Sync,
            3 => Self::Full,
            4 => Self::Finish,
            5 => Self::Block,
            6 => Self::Trees,
            _ => return Err(CodecError::usage("invalid flush value")),
        })
    }

    /// Ordering used to detect repeated flushes: every mode ranks by value
    /// doubled, except `Block`, which ranks between `NoFlush` and `Partial`.
    #[inline]
    pub fn rank(self) -> i32 {
        let f = self as i32;
        (f * 2) - if f > 4 { 9 } else { 0 }
    }
}

/// Match-finding strategy for the compressor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Strategy {
    /// Lazy/greedy matching chosen by level.
    #[default]
    Default = 0,
    /// Favour literals over short matches, for filtered data.
    Filtered = 1,
    /// Huffman coding only, no string matching.
    HuffmanOnly = 2,
    /// Matches of distance one only (run-length encoding).
    Rle = 3,
    /// Forbid dynamic Huffman blocks.
    Fixed = 4,
}

impl Strategy {
    /// Parse a zlib strategy constant.
    pub fn from_i32(value: i32) -> Result<Self> {
        Ok(match value {
            0 => Self::Default,
            1 => Self::Filtered,
            2 => Self::HuffmanOnly,
            3 => Self::Rle,
            4 => Self::Fixed,
            _ => return Err(CodecError::usage("invalid strategy")),
        })
    }
}

/// A streaming decompressor (decoder).
pub trait Decompressor {
    /// Run one decode step over `strm`.
    fn decompress(&mut self, strm: &mut StreamContext<'_>, flush: Flush) -> Result<Status>;

    /// Reset to the initial state, keeping the configuration.
    fn reset(&mut self);

    /// Whether the end of the stream has been reached.
    fn is_finished(&self) -> bool;

    /// Decompress a complete in-memory stream.
    ///
    /// Stops at the end of the stream; trailing input is ignored.
    fn decompress_all(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let mut input_pos = 0;
        let mut buffer = vec![0u8; ALL_CHUNK];

        loop {
            let mut strm = StreamContext::new(&input[input_pos..], &mut buffer);
            let status = match self.decompress(&mut strm, Flush::NoFlush) {
                // The output buffer is never full here, so a stall means the
                // input ended early.
                Err(CodecError::Buf { .. }) => {
                    return Err(CodecError::buf("unexpected end of file"));
                }
                other => other?,
            };
            let (consumed, produced) = (strm.next_in, strm.next_out);

            input_pos += consumed;
            output.extend_from_slice(&buffer[..produced]);

            match status {
                Status::StreamEnd => break,
                Status::NeedDict => return Err(CodecError::usage("need dictionary")),
                Status::Ok if consumed == 0 && produced == 0 => {
                    return Err(CodecError::buf("unexpected end of file"));
                }
                Status::Ok => continue,
            }
        }

        Ok(output)
    }
}

/// A streaming compressor (encoder).
pub trait Compressor {
    /// Run one encode step over `strm`.
    fn compress(&mut self, strm: &mut StreamContext<'_>, flush: Flush) -> Result<Status>;

    /// Reset to the initial state, keeping the configuration.
    fn reset(&mut self);

    /// Whether the stream has been completed.
    fn is_finished(&self) -> bool;

    /// Compress `input` and finish the stream.
    fn compress_all(&mut self, input: &[u8]) -> Result<Vec<u8>> {
        let mut output = Vec::new();
        let mut input_pos = 0;
        let mut buffer = vec![0u8; ALL_CHUNK];

        loop {
            let mut strm = StreamContext::new(&input[input_pos..], &mut buffer);
            let status = self.compress(&mut strm, Flush::Finish)?;
            let (consumed, produced) = (strm.next_in, strm.next_out);

            input_pos += consumed;
            output.extend_from_slice(&buffer[..produced]);

            if status == Status::StreamEnd {
                break;
            }
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flush_parse() {
        assert_eq!(Flush::default(), Flush::NoFlush);
        assert_eq!(Flush::from_i32(4).unwrap(), Flush::Finish);
        assert_eq!(Flush::from_i32(6).unwrap(), Flush::Trees);
        assert_eq!(Flush::from_i32(7).unwrap_err().code(), -2);
        assert!(Flush::from_i32(-1).is_err());
    }

    #[test]
    fn test_flush_rank() {
        assert!(Flush::Block.rank() > Flush::NoFlush.rank());
        assert!(Flush::Block.rank() < Flush::Partial.rank());
        assert!(Flush::Finish.rank() > Flush::Full.rank());
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!(Strategy::from_i32(3).unwrap(), Strategy::Rle);
        assert!(Strategy::from_i32(5).is_err());
    }
}
