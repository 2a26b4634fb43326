//! Huffman decode tables for DEFLATE decompression.
//!
//! A decode table is addressed by the next `root` bits of the input (LSB
//! first). Codes no longer than `root` fill every slot whose low bits match
//! them. Longer codes spill into sub-tables: the root slot then holds a link
//! whose `op` is the sub-table's index width and whose `val` is its offset.
//!
//! # Alphabets
//!
//! DEFLATE decodes three alphabets:
//! - **Literal/Length**: 0-285 (0-255 literals, 256 EOB, 257-285 lengths)
//! - **Distance**: 0-29 (back-reference distances)
//! - **Code Length**: 0-18 (for encoding dynamic Huffman trees)
//!
//! # Entry format
//!
//! | `op`             | meaning                                           |
//! |------------------|---------------------------------------------------|
//! | `0`              | literal `val`                                     |
//! | `0000tttt`, t≠0  | link to a sub-table indexed by `t` bits at `val`  |
//! | `0001eeee`       | length or distance base `val`, `e` extra bits     |
//! | `0110_0000`      | end of block                                      |
//! | `0100_0000`      | invalid code                                      |

use crate::tables::{DBASE, DEXT, LBASE, LEXT, MAX_BITS, OP_END, OP_INVALID};
use std::sync::OnceLock;

/// Table space for the worst-case literal/length table with 9 root bits.
pub const ENOUGH_LENS: usize = 852;
/// Table space for the worst-case distance table with 6 root bits.
pub const ENOUGH_DISTS: usize = 592;
/// Total space for one dynamic block's tables.
pub const ENOUGH: usize = ENOUGH_LENS + ENOUGH_DISTS;

/// One decode table entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Code {
    /// Operation, see the module docs.
    pub op: u8,
    /// Bits consumed by this entry.
    pub bits: u8,
    /// Literal, base value or sub-table offset.
    pub val: u16,
}

/// Which alphabet a table decodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeType {
    /// Code length codes (0-18).
    Codes,
    /// Literal/length codes.
    Lens,
    /// Distance codes.
    Dists,
}

/// Why a set of code lengths was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableError {
    /// More codes than the lengths allow.
    OverSubscribed,
    /// Unused code space, not allowed for this alphabet.
    Incomplete,
    /// The reserved table space would be exceeded.
    TooSmall,
}

/// Build a decode table for `lens` into `table`.
///
/// `root` is the requested index width; it is clamped to the range of code
/// lengths actually present. Returns the number of entries used and the
/// final root width.
///
/// A code set with no codes at all yields a 1-bit table whose entries are
/// all invalid, so decoding fails only if a code is actually read. A single
/// code of length one is accepted as a complete set for the non-`Codes`
/// alphabets.
pub fn inflate_table(
    kind: CodeType,
    lens: &[u16],
    table: &mut [Code],
    root: u32,
) -> Result<(usize, u32), TableError> {
    let mut count = [0u16; MAX_BITS + 1];
    for &len in lens {
        count[len as usize] += 1;
    }

    let mut max = MAX_BITS;
    while max >= 1 && count[max] == 0 {
        max -= 1;
    }
    if max == 0 {
        let invalid = Code {
            op: OP_INVALID,
            bits: 1,
            val: 0,
        };
        table[0] = invalid;
        table[1] = invalid;
        return Ok((2, 1));
    }
    let mut root = (root as usize).min(max);

    let mut min = 1;
    while min < max && count[min] == 0 {
        min += 1;
    }
    root = root.max(min);

    let mut left: i32 = 1;
    for &n in count.iter().skip(1) {
        left <<= 1;
        left -= i32::from(n);
        if left < 0 {
            return Err(TableError::OverSubscribed);
        }
    }
    if left > 0 && (kind == CodeType::Codes || max != 1) {
        return Err(TableError::Incomplete);
    }

    // Sort symbols by length, by symbol order within each length.
    let mut offs = [0u16; MAX_BITS + 1];
    for len in 1..MAX_BITS {
        offs[len + 1] = offs[len] + count[len];
    }
    let mut work = [0u16; 320];
    for (sym, &len) in lens.iter().enumerate() {
        if len != 0 {
            work[offs[len as usize] as usize] = sym as u16;
            offs[len as usize] += 1;
        }
    }

    let (base, extra, matched): (&[u16], &[u8], usize) = match kind {
        CodeType::Codes => (&[][..], &[][..], 20),
        CodeType::Lens => (&LBASE[..], &LEXT[..], 257),
        CodeType::Dists => (&DBASE[..], &DEXT[..], 0),
    };
    let limit = match kind {
        CodeType::Codes => usize::MAX,
        CodeType::Lens => ENOUGH_LENS,
        CodeType::Dists => ENOUGH_DISTS,
    };

    let mut huff: usize = 0;
    let mut sym = 0usize;
    let mut len = min;
    let mut next = 0usize;
    let mut curr = root;
    let mut drop = 0usize;
    let mut low = usize::MAX;
    let mut used = 1usize << root;
    let mask = used - 1;

    if used > limit {
        return Err(TableError::TooSmall);
    }

    loop {
        let symbol = work[sym] as usize;
        let here = if symbol + 1 < matched {
            Code {
                op: 0,
                bits: (len - drop) as u8,
                val: symbol as u16,
            }
        } else if symbol >= matched {
            Code {
                op: extra[symbol - matched],
                bits: (len - drop) as u8,
                val: base[symbol - matched],
            }
        } else {
            Code {
                op: OP_END | OP_INVALID,
                bits: (len - drop) as u8,
                val: 0,
            }
        };

        // Replicate for every index whose low bits are this code.
        let incr = 1usize << (len - drop);
        let mut fill = 1usize << curr;
        let table_size = fill;
        loop {
            fill -= incr;
            table[next + (huff >> drop) + fill] = here;
            if fill == 0 {
                break;
            }
        }

        // Increment the bit-reversed code.
        let mut incr = 1usize << (len - 1);
        while huff & incr != 0 {
            incr >>= 1;
        }
        if incr != 0 {
            huff &= incr - 1;
            huff += incr;
        } else {
            huff = 0;
        }

        sym += 1;
        count[len] -= 1;
        if count[len] == 0 {
            if len == max {
                break;
            }
            len = lens[work[sym] as usize] as usize;
        }

        // Start a new sub-table when the code outgrows the root.
        if len > root && (huff & mask) != low {
            if drop == 0 {
                drop = root;
            }
            next += table_size;

            curr = len - drop;
            let mut left: i32 = 1 << curr;
            while curr + drop < max {
                left -= i32::from(count[curr + drop]);
                if left <= 0 {
                    break;
                }
                curr += 1;
                left <<= 1;
            }

            used += 1usize << curr;
            if used > limit {
                return Err(TableError::TooSmall);
            }

            low = huff & mask;
            table[low] = Code {
                op: curr as u8,
                bits: root as u8,
                val: next as u16,
            };
        }
    }

    // An incomplete single-code set leaves one slot to mark invalid.
    if huff != 0 {
        table[next + huff] = Code {
            op: OP_INVALID,
            bits: (len - drop) as u8,
            val: 0,
        };
    }

    Ok((used, root as u32))
}

/// Decode tables for fixed-code blocks.
#[derive(Debug)]
pub struct FixedTables {
    /// Literal/length table, 9 root bits.
    pub lencode: [Code; 512],
    /// Distance table, 5 root bits.
    pub distcode: [Code; 32],
}

/// Root bits of the fixed literal/length table.
pub const FIXED_LENBITS: u32 = 9;
/// Root bits of the fixed distance table.
pub const FIXED_DISTBITS: u32 = 5;

/// Get the fixed-code decode tables.
///
/// Built once on first use and shared read-only afterwards.
pub fn fixed_tables() -> &'static FixedTables {
    static TABLES: OnceLock<FixedTables> = OnceLock::new();

    TABLES.get_or_init(|| {
        let mut lens = [0u16; 288];
        for (sym, len) in lens.iter_mut().enumerate() {
            *len = match sym {
                0..=143 => 8,
                144..=255 => 9,
                256..=279 => 7,
                _ => 8,
            };
        }
        let mut tables = FixedTables {
            lencode: [Code::default(); 512],
            distcode: [Code::default(); 32],
        };
        // Both code sets are complete, so neither build can fail.
        let lens_built = inflate_table(CodeType::Lens, &lens, &mut tables.lencode, FIXED_LENBITS);
        let dists_built =
            inflate_table(CodeType::Dists, &[5u16; 32], &mut tables.distcode, FIXED_DISTBITS);
        debug_assert!(lens_built.is_ok());
        debug_assert!(dists_built.is_ok());
        tables
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::{OP_BASE, bi_reverse};

    #[test]
    fn test_fixed_tables() {
        let fixed = fixed_tables();

        // Literal 0 is the 8-bit code 00110000.
        let idx = bi_reverse(0x30, 8) as usize;
        assert_eq!(fixed.lencode[idx], Code { op: 0, bits: 8, val: 0 });
        assert_eq!(fixed.lencode[idx | 0x100], fixed.lencode[idx]);

        // End of block is seven zero bits.
        assert_eq!(fixed.lencode[0].op, OP_END | OP_INVALID);
        assert_eq!(fixed.lencode[0].bits, 7);

        // Length symbol 257 (code 0000001) has base 3.
        let idx = bi_reverse(1, 7) as usize;
        assert_eq!(fixed.lencode[idx], Code { op: OP_BASE, bits: 7, val: 3 });

        // Distance symbols 30 and 31 are invalid.
        assert_eq!(fixed.distcode[bi_reverse(30, 5) as usize].op, OP_INVALID);
        assert_eq!(
            fixed.distcode[bi_reverse(29, 5) as usize],
            Code {
                op: OP_BASE | 13,
                bits: 5,
                val: 24577
            }
        );
    }

    #[test]
    fn test_fixed_code_sets_fill_tables() {
        let mut lens = [8u16; 288];
        lens[144..256].fill(9);
        lens[256..280].fill(7);
        let mut lencode = [Code::default(); 512];
        assert_eq!(
            inflate_table(CodeType::Lens, &lens, &mut lencode, FIXED_LENBITS),
            Ok((512, FIXED_LENBITS))
        );
        let mut distcode = [Code::default(); 32];
        assert_eq!(
            inflate_table(CodeType::Dists, &[5u16; 32], &mut distcode, FIXED_DISTBITS),
            Ok((32, FIXED_DISTBITS))
        );

        let fixed = fixed_tables();
        assert_eq!(fixed.lencode, lencode);
        assert_eq!(fixed.distcode, distcode);
        assert!(fixed.lencode.iter().all(|code| code.bits != 0));
    }

    #[test]
    fn test_over_subscribed() {
        let lens = [1u16, 1, 1];
        let mut table = [Code::default(); 16];
        assert_eq!(
            inflate_table(CodeType::Codes, &lens, &mut table, 7),
            Err(TableError::OverSubscribed)
        );
    }

    #[test]
    fn test_incomplete_rejected_for_code_lengths() {
        let lens = [1u16, 0, 2];
        let mut table = [Code::default(); 16];
        assert_eq!(
            inflate_table(CodeType::Codes, &lens, &mut table, 7),
            Err(TableError::Incomplete)
        );
        let mut table = [Code::default(); ENOUGH_DISTS];
        assert_eq!(
            inflate_table(CodeType::Dists, &lens, &mut table, 6),
            Err(TableError::Incomplete)
        );
    }

    #[test]
    fn test_single_distance_code() {
        let mut lens = [0u16; 30];
        lens[3] = 1;
        let mut table = [Code::default(); ENOUGH_DISTS];
        let (used, bits) = inflate_table(CodeType::Dists, &lens, &mut table, 6).unwrap();
        assert_eq!(bits, 1);
        assert_eq!(used, 2);
        assert_eq!(table[0], Code { op: OP_BASE, bits: 1, val: 4 });
        assert_eq!(table[1].op, OP_INVALID);
    }

    #[test]
    fn test_empty_code_set() {
        let lens = [0u16; 30];
        let mut table = [Code::default(); ENOUGH_DISTS];
        let (used, bits) = inflate_table(CodeType::Dists, &lens, &mut table, 6).unwrap();
        assert_eq!((used, bits), (2, 1));
        assert_eq!(table[0].op, OP_INVALID);
        assert_eq!(table[1].op, OP_INVALID);
    }

    #[test]
    fn test_sub_tables() {
        // One code of each length 1..=14 and two of length 15: complete and
        // deeper than the 9-bit root.
        let mut lens = [0u16; 288];
        for (sym, len) in lens.iter_mut().enumerate().take(14) {
            *len = sym as u16 + 1;
        }
        lens[14] = 15;
        lens[15] = 15;
        let mut table = [Code::default(); ENOUGH_LENS];
        let (used, bits) = inflate_table(CodeType::Lens, &lens, &mut table, 9).unwrap();
        assert_eq!(bits, 9);
        assert!(used > 512 && used <= ENOUGH_LENS);

        // Symbol 0 has the one-bit code 0.
        assert_eq!(table[0], Code { op: 0, bits: 1, val: 0 });
        // The all-ones root index links to a sub-table.
        let link = table[0x1FF];
        assert!(link.op != 0 && link.op & 0xF0 == 0);
        assert_eq!(link.bits, 9);
    }
}
