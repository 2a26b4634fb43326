//! Constant tables for DEFLATE (RFC 1951).
//!
//! Everything here is computed at compile time: the fixed Huffman codes used
//! by the encoder, the length/distance code maps and their extra-bit counts,
//! and the base/extra tables the decode-table builder consumes.

/// Maximum Huffman code length for literal/length and distance codes.
pub const MAX_BITS: usize = 15;
/// Maximum code length for the bit-length alphabet.
pub const MAX_BL_BITS: usize = 7;
/// Number of length codes, not counting the special END_BLOCK code.
pub const LENGTH_CODES: usize = 29;
/// Number of literal bytes.
pub const LITERALS: usize = 256;
/// Number of literal/length codes, including END_BLOCK.
pub const L_CODES: usize = LITERALS + 1 + LENGTH_CODES;
/// Number of distance codes.
pub const D_CODES: usize = 30;
/// Number of codes used to transfer the bit lengths.
pub const BL_CODES: usize = 19;
/// Heap size for tree construction.
pub const HEAP_SIZE: usize = 2 * L_CODES + 1;
/// End of block literal code.
pub const END_BLOCK: usize = 256;

/// Repeat previous bit length 3-6 times (2 bits of repeat count).
pub const REP_3_6: usize = 16;
/// Repeat a zero length 3-10 times (3 bits of repeat count).
pub const REPZ_3_10: usize = 17;
/// Repeat a zero length 11-138 times (7 bits of repeat count).
pub const REPZ_11_138: usize = 18;

/// Shortest match.
pub const MIN_MATCH: usize = 3;
/// Longest match.
pub const MAX_MATCH: usize = 258;
/// Minimum lookahead, except at the end of the input.
pub const MIN_LOOKAHEAD: usize = MAX_MATCH + MIN_MATCH + 1;

/// Stored block type.
pub const STORED_BLOCK: u32 = 0;
/// Fixed Huffman block type.
pub const STATIC_TREES: u32 = 1;
/// Dynamic Huffman block type.
pub const DYN_TREES: u32 = 2;

/// Extra bits for each length code.
pub const EXTRA_LBITS: [u8; LENGTH_CODES] = [
    0, 0, 0, 0, 0, 0, 0, 0, 1, 1, 1, 1, 2, 2, 2, 2, 3, 3, 3, 3, 4, 4, 4, 4, 5, 5, 5, 5, 0,
];

/// Extra bits for each distance code.
pub const EXTRA_DBITS: [u8; D_CODES] = [
    0, 0, 0, 0, 1, 1, 2, 2, 3, 3, 4, 4, 5, 5, 6, 6, 7, 7, 8, 8, 9, 9, 10, 10, 11, 11, 12, 12, 13,
    13,
];

/// Extra bits for each bit length code.
pub const EXTRA_BLBITS: [u8; BL_CODES] = [0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 2, 3, 7];

/// Order in which bit length code lengths are sent (RFC 1951 Section 3.2.7).
pub const BL_ORDER: [u8; BL_CODES] = [
    16, 17, 18, 0, 8, 7, 9, 6, 10, 5, 11, 4, 12, 3, 13, 2, 14, 1, 15,
];

/// A precomputed code: bit-reversed code value and its length.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticCode {
    /// Code, already reversed for LSB-first output.
    pub code: u16,
    /// Code length in bits.
    pub len: u16,
}

/// Reverse the low `len` bits of `code`.
#[inline]
pub const fn bi_reverse(code: u32, len: u32) -> u32 {
    let mut code = code;
    let mut res = 0u32;
    let mut len = len;
    while len > 0 {
        res |= code & 1;
        code >>= 1;
        res <<= 1;
        len -= 1;
    }
    res >> 1
}

/// Fixed literal/length code lengths (RFC 1951 Section 3.2.6), including the
/// two unused codes 286 and 287.
pub const FIXED_LITLEN_LENGTHS: [u8; L_CODES + 2] = {
    let mut lengths = [0u8; L_CODES + 2];
    let mut n = 0;
    while n < L_CODES + 2 {
        lengths[n] = if n < 144 {
            8
        } else if n < 256 {
            9
        } else if n < 280 {
            7
        } else {
            8
        };
        n += 1;
    }
    lengths
};

/// Canonical codes for a set of lengths, bit-reversed.
const fn canonical_codes<const N: usize>(lengths: &[u8; N]) -> [StaticCode; N] {
    let mut bl_count = [0u16; MAX_BITS + 1];
    let mut n = 0;
    while n < N {
        bl_count[lengths[n] as usize] += 1;
        n += 1;
    }
    bl_count[0] = 0;

    let mut next_code = [0u16; MAX_BITS + 1];
    let mut code = 0u16;
    let mut bits = 1;
    while bits <= MAX_BITS {
        code = (code + bl_count[bits - 1]) << 1;
        next_code[bits] = code;
        bits += 1;
    }

    let mut codes = [StaticCode { code: 0, len: 0 }; N];
    n = 0;
    while n < N {
        let len = lengths[n] as usize;
        if len != 0 {
            codes[n] = StaticCode {
                code: bi_reverse(next_code[len] as u32, len as u32) as u16,
                len: len as u16,
            };
            next_code[len] += 1;
        }
        n += 1;
    }
    codes
}

/// Fixed literal/length tree. Codes 286 and 287 complete the code space.
pub const STATIC_LTREE: [StaticCode; L_CODES + 2] = canonical_codes(&FIXED_LITLEN_LENGTHS);

/// Fixed distance tree: five-bit codes.
pub const STATIC_DTREE: [StaticCode; D_CODES] = {
    let mut codes = [StaticCode { code: 0, len: 0 }; D_CODES];
    let mut n = 0;
    while n < D_CODES {
        codes[n] = StaticCode {
            code: bi_reverse(n as u32, 5) as u16,
            len: 5,
        };
        n += 1;
    }
    codes
};

/// First normalized length (`length - MIN_MATCH`) for each length code.
pub const BASE_LENGTH: [u8; LENGTH_CODES] = {
    let mut base = [0u8; LENGTH_CODES];
    let mut length = 0usize;
    let mut code = 0;
    while code < LENGTH_CODES - 1 {
        base[code] = length as u8;
        length += 1 << EXTRA_LBITS[code];
        code += 1;
    }
    base
};

/// Length code for each normalized match length (0..=255).
///
/// Length 258 (normalized 255) gets the dedicated code 28 rather than the
/// last slot of code 27.
pub const LENGTH_CODE: [u8; MAX_MATCH - MIN_MATCH + 1] = {
    let mut table = [0u8; MAX_MATCH - MIN_MATCH + 1];
    let mut length = 0usize;
    let mut code = 0;
    while code < LENGTH_CODES - 1 {
        let mut n = 0;
        while n < (1 << EXTRA_LBITS[code]) {
            table[length] = code as u8;
            length += 1;
            n += 1;
        }
        code += 1;
    }
    table[length - 1] = code as u8;
    table
};

/// First normalized distance (`distance - 1`) for each distance code.
pub const BASE_DIST: [u16; D_CODES] = {
    let mut base = [0u16; D_CODES];
    let mut dist = 0usize;
    let mut code = 0;
    while code < D_CODES {
        base[code] = dist as u16;
        dist += 1 << EXTRA_DBITS[code];
        code += 1;
    }
    base
};

/// Distance code lookup. Indexes 0..256 map distances below 256 directly;
/// indexes 256..512 map the upper 8 bits of larger distances.
pub const DIST_CODE: [u8; 512] = {
    let mut table = [0u8; 512];
    let mut dist = 0usize;
    let mut code = 0;
    while code < 16 {
        let mut n = 0;
        while n < (1 << EXTRA_DBITS[code]) {
            table[dist] = code as u8;
            dist += 1;
            n += 1;
        }
        code += 1;
    }
    dist >>= 7;
    while code < D_CODES {
        let mut n = 0;
        while n < (1 << (EXTRA_DBITS[code] - 7)) {
            table[256 + dist] = code as u8;
            dist += 1;
            n += 1;
        }
        code += 1;
    }
    table
};

/// Distance code for a normalized distance (`distance - 1`).
#[inline]
pub fn d_code(dist: usize) -> usize {
    if dist < 256 {
        DIST_CODE[dist] as usize
    } else {
        DIST_CODE[256 + (dist >> 7)] as usize
    }
}

/// Decode-table op flag: length or distance base, low four bits are the
/// extra bit count.
pub const OP_BASE: u8 = 16;
/// Decode-table op flag: end of block.
pub const OP_END: u8 = 32;
/// Decode-table op flag: invalid code.
pub const OP_INVALID: u8 = 64;

/// Length base values for symbols 257..=287.
pub const LBASE: [u16; 31] = [
    3, 4, 5, 6, 7, 8, 9, 10, 11, 13, 15, 17, 19, 23, 27, 31, 35, 43, 51, 59, 67, 83, 99, 115, 131,
    163, 195, 227, 258, 0, 0,
];

/// Length ops for symbols 257..=287; 286 and 287 never occur in valid data.
pub const LEXT: [u8; 31] = [
    16, 16, 16, 16, 16, 16, 16, 16, 17, 17, 17, 17, 18, 18, 18, 18, 19, 19, 19, 19, 20, 20, 20, 20,
    21, 21, 21, 21, 16, OP_INVALID, OP_INVALID,
];

/// Distance base values for symbols 0..=31.
pub const DBASE: [u16; 32] = [
    1, 2, 3, 4, 5, 7, 9, 13, 17, 25, 33, 49, 65, 97, 129, 193, 257, 385, 513, 769, 1025, 1537,
    2049, 3073, 4097, 6145, 8193, 12289, 16385, 24577, 0, 0,
];

/// Distance ops for symbols 0..=31; 30 and 31 never occur in valid data.
pub const DEXT: [u8; 32] = [
    16, 16, 16, 16, 17, 17, 18, 18, 19, 19, 20, 20, 21, 21, 22, 22, 23, 23, 24, 24, 25, 25, 26, 26,
    27, 27, 28, 28, 29, 29, OP_INVALID, OP_INVALID,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bi_reverse() {
        assert_eq!(bi_reverse(0b0011_0000, 8), 0b0000_1100);
        assert_eq!(bi_reverse(1, 5), 0b10000);
        assert_eq!(bi_reverse(0, 7), 0);
    }

    #[test]
    fn test_static_ltree_known_codes() {
        // Literal 0 is 00110000 (0x30), sent reversed.
        assert_eq!(STATIC_LTREE[0], StaticCode { code: 0x0C, len: 8 });
        // End of block is seven zero bits.
        assert_eq!(STATIC_LTREE[END_BLOCK], StaticCode { code: 0, len: 7 });
        // Literal 144 is 110010000.
        assert_eq!(STATIC_LTREE[144].len, 9);
        assert_eq!(STATIC_LTREE[144].code, bi_reverse(0b1_1001_0000, 9) as u16);
        assert_eq!(STATIC_LTREE[287].len, 8);
    }

    #[test]
    fn test_static_dtree() {
        assert!(STATIC_DTREE.iter().all(|c| c.len == 5));
        assert_eq!(STATIC_DTREE[1].code, 0b10000);
    }

    #[test]
    fn test_length_code_map() {
        assert_eq!(LENGTH_CODE[0], 0);
        assert_eq!(LENGTH_CODE[8], 8);
        assert_eq!(LENGTH_CODE[9], 8);
        assert_eq!(LENGTH_CODE[254], 27);
        assert_eq!(LENGTH_CODE[255], 28);
        assert_eq!(BASE_LENGTH[27], 224);
        assert_eq!(BASE_LENGTH[28], 0);

        for len in MIN_MATCH..=MAX_MATCH {
            let lc = len - MIN_MATCH;
            let code = LENGTH_CODE[lc] as usize;
            if code == LENGTH_CODES - 1 {
                assert_eq!(len, MAX_MATCH);
                continue;
            }
            let extra = lc - BASE_LENGTH[code] as usize;
            assert!(extra < (1 << EXTRA_LBITS[code]));
            assert_eq!(LBASE[code] as usize + extra, len);
        }
    }

    #[test]
    fn test_dist_code_map() {
        assert_eq!(d_code(0), 0);
        assert_eq!(d_code(3), 3);
        assert_eq!(d_code(4), 4);
        assert_eq!(d_code(255), 15);
        assert_eq!(d_code(256), 16);
        assert_eq!(d_code(32767), 29);
        assert_eq!(BASE_DIST[29], 24576);

        for dist in 0..32768usize {
            let code = d_code(dist);
            let extra = dist - BASE_DIST[code] as usize;
            assert!(extra < (1 << EXTRA_DBITS[code]), "distance {}", dist + 1);
            assert_eq!(DBASE[code] as usize - 1, BASE_DIST[code] as usize);
        }
    }
}
