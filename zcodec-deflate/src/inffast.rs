//! Fast inner loop for literal/length and distance decoding.
//!
//! Runs only while at least 6 input bytes and 258 output bytes are
//! available, so one length/distance pair can always be decoded and copied
//! without checking either buffer mid-symbol. Everything else (block
//! headers, stored blocks, running out of buffer) is left to the slow
//! path in [`crate::inflate`].

use crate::huffman::Code;
use crate::tables::{OP_BASE, OP_END, OP_INVALID};
use zcodec_core::bitstream::BitAccumulator;
use zcodec_core::ringbuffer::SlidingWindow;
use zcodec_core::stream::StreamContext;

/// Input bytes the fast loop needs per symbol.
pub(crate) const FAST_MIN_INPUT: usize = 6;
/// Output bytes the fast loop needs per symbol.
pub(crate) const FAST_MIN_OUTPUT: usize = 258;

/// Tables and limits for one run of the fast loop.
pub(crate) struct FastContext<'a> {
    pub lencode: &'a [Code],
    pub distcode: &'a [Code],
    pub lenbits: u32,
    pub distbits: u32,
    pub window: &'a SlidingWindow,
    /// Largest distance the stream header allows.
    pub dmax: usize,
    /// Reject distances reaching before the start of the history.
    pub sane: bool,
}

/// How the fast loop stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum FastExit {
    /// Buffers got too small; keep decoding codes in the slow path.
    Len,
    /// End-of-block code decoded.
    EndOfBlock,
    /// Corrupt data.
    Bad(&'static str),
}

#[inline]
fn refill(acc: &mut BitAccumulator, input: &[u8], next_in: &mut usize) {
    acc.pull_byte(input[*next_in]);
    *next_in += 1;
}

/// Decode symbols until the end of the block, an error, or until either
/// buffer gets within one symbol of its end.
///
/// `out_start` is where this call's output began; distances up to
/// `next_out - out_start` are copied from the output itself and longer ones
/// come from `ctx.window`. On return fewer than 8 bits are left in `acc`
/// and any whole bytes it held have been given back to the input.
pub(crate) fn inflate_fast(
    strm: &mut StreamContext<'_>,
    acc: &mut BitAccumulator,
    ctx: &FastContext<'_>,
    out_start: usize,
) -> FastExit {
    debug_assert!(strm.avail_in() >= FAST_MIN_INPUT);
    debug_assert!(strm.avail_out() >= FAST_MIN_OUTPUT);

    let input: &[u8] = strm.input;
    let mut next_in = strm.next_in;
    let last = input.len() - (FAST_MIN_INPUT - 1);
    let mut put = strm.next_out;
    let output = &mut strm.output[..];
    let end = output.len() - (FAST_MIN_OUTPUT - 1);
    let whave = ctx.window.whave();

    let exit = 'outer: loop {
        if acc.bits() < 15 {
            refill(acc, input, &mut next_in);
            refill(acc, input, &mut next_in);
        }
        let mut here = ctx.lencode[acc.peek(ctx.lenbits) as usize];

        loop {
            acc.drop_bits(u32::from(here.bits));
            let op = here.op;

            if op == 0 {
                output[put] = here.val as u8;
                put += 1;
                break;
            }

            if op & OP_BASE != 0 {
                let mut len = usize::from(here.val);
                let extra = u32::from(op & 15);
                if extra != 0 {
                    if acc.bits() < extra {
                        refill(acc, input, &mut next_in);
                    }
                    len += acc.take(extra) as usize;
                }

                if acc.bits() < 15 {
                    refill(acc, input, &mut next_in);
                    refill(acc, input, &mut next_in);
                }
                let mut dcode = ctx.distcode[acc.peek(ctx.distbits) as usize];

                let dist = loop {
                    acc.drop_bits(u32::from(dcode.bits));
                    let op = dcode.op;
                    if op & OP_BASE != 0 {
                        let mut dist = usize::from(dcode.val);
                        let extra = u32::from(op & 15);
                        if acc.bits() < extra {
                            refill(acc, input, &mut next_in);
                            if acc.bits() < extra {
                                refill(acc, input, &mut next_in);
                            }
                        }
                        dist += acc.take(extra) as usize;
                        break dist;
                    } else if op & OP_INVALID == 0 {
                        let index = usize::from(dcode.val) + acc.peek(u32::from(op)) as usize;
                        dcode = ctx.distcode[index];
                    } else {
                        break 'outer FastExit::Bad("invalid distance code");
                    }
                };

                if dist > ctx.dmax {
                    break 'outer FastExit::Bad("invalid distance too far back");
                }

                let produced = put - out_start;
                if dist > produced {
                    let mut back = dist - produced;
                    if back > whave {
                        if ctx.sane {
                            break 'outer FastExit::Bad("invalid distance too far back");
                        }
                        let zeros = (back - whave).min(len);
                        output[put..put + zeros].fill(0);
                        put += zeros;
                        len -= zeros;
                        back -= zeros;
                    }
                    while len > 0 && back > 0 {
                        let run = ctx.window.history(back);
                        let n = run.len().min(len);
                        output[put..put + n].copy_from_slice(&run[..n]);
                        put += n;
                        len -= n;
                        back -= n;
                    }
                }
                // Overlapping copy: each byte may depend on one just written.
                for i in put..put + len {
                    output[i] = output[i - dist];
                }
                put += len;
                break;
            }

            if op & OP_INVALID == 0 {
                let index = usize::from(here.val) + acc.peek(u32::from(op)) as usize;
                here = ctx.lencode[index];
                continue;
            }
            if op & OP_END != 0 {
                break 'outer FastExit::EndOfBlock;
            }
            break 'outer FastExit::Bad("invalid literal/length code");
        }

        if next_in >= last || put >= end {
            break FastExit::Len;
        }
    };

    next_in -= acc.return_whole_bytes();
    strm.next_in = next_in;
    strm.next_out = put;
    exit
}
