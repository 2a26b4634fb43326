//! CRC-32 (ISO 3309) as used by the gzip trailer and header CRC.
//!
//! The table is generated at compile time from the reflected polynomial
//! 0xEDB88320. Buffers of 16 bytes or more go through a slicing-by-8 loop
//! that consumes eight bytes per step from eight derived tables; shorter
//! buffers use the classic byte-at-a-time table walk. Both produce the same
//! value.
//!
//! Two interfaces are offered:
//!
//! - [`crc32`] follows the zlib convention: the running value starts at `0`
//!   and the pre/post complement is applied inside every call, so results can
//!   be chained (`crc32(crc32(0, a), b) == crc32(0, ab)`).
//! - [`Crc32`] is an incremental calculator holding the un-complemented
//!   register.

/// CRC-32 lookup table (polynomial 0xEDB88320, reflected).
const CRC32_TABLE: [u32; 256] = {
    let mut table = [0u32; 256];
    let mut i = 0usize;
    while i < 256 {
        let mut crc = i as u32;
        let mut j = 0;
        while j < 8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ 0xEDB88320;
            } else {
                crc >>= 1;
            }
            j += 1;
        }
        table[i] = crc;
        i += 1;
    }
    table
};

/// CRC-32 slicing-by-8 lookup tables.
const CRC32_TABLE_SLICE: [[u32; 256]; 8] = {
    let mut tables = [[0u32; 256]; 8];
    tables[0] = CRC32_TABLE;

    let mut t = 1;
    while t < 8 {
        let mut i = 0usize;
        while i < 256 {
            let prev = tables[t - 1][i];
            tables[t][i] = tables[0][(prev & 0xFF) as usize] ^ (prev >> 8);
            i += 1;
        }
        t += 1;
    }

    tables
};

/// Update a running CRC-32 with `data`.
///
/// Start with `0`; the returned value is the finished checksum of all bytes
/// seen so far and can be fed back in for the next chunk.
///
/// ```
/// use zcodec_core::crc::crc32;
///
/// let whole = crc32(0, b"Hello, World!");
/// let split = crc32(crc32(0, b"Hello, "), b"World!");
/// assert_eq!(whole, 0xEC4AC3D0);
/// assert_eq!(whole, split);
/// ```
#[inline]
pub fn crc32(crc: u32, data: &[u8]) -> u32 {
    let mut c = crc ^ 0xFFFFFFFF;
    if data.len() >= 16 {
        crc32_slice8(&mut c, data);
    } else {
        crc32_sw(&mut c, data);
    }
    c ^ 0xFFFFFFFF
}

/// Incremental CRC-32 calculator.
///
/// ```
/// use zcodec_core::crc::Crc32;
///
/// let mut crc = Crc32::new();
/// crc.update(b"Hello, World!");
/// assert_eq!(crc.finalize(), 0xEC4AC3D0);
/// ```
#[derive(Debug, Clone)]
pub struct Crc32 {
    crc: u32,
}

impl Crc32 {
    /// Create a new CRC-32 calculator.
    pub fn new() -> Self {
        Self { crc: 0xFFFFFFFF }
    }

    /// Resume from a finished checksum value.
    pub fn from_value(value: u32) -> Self {
        Self {
            crc: value ^ 0xFFFFFFFF,
        }
    }

    /// Reset the CRC to its initial state.
    pub fn reset(&mut self) {
        self.crc = 0xFFFFFFFF;
    }

    /// Update the CRC with more data.
    #[inline]
    pub fn update(&mut self, data: &[u8]) {
        if data.len() >= 16 {
            crc32_slice8(&mut self.crc, data);
        } else {
            crc32_sw(&mut self.crc, data);
        }
    }

    /// Get the current CRC value (without finalizing).
    #[inline(always)]
    pub fn value(&self) -> u32 {
        self.crc ^ 0xFFFFFFFF
    }

    /// Finalize and return the CRC value.
    #[inline(always)]
    pub fn finalize(self) -> u32 {
        self.crc ^ 0xFFFFFFFF
    }

    /// Compute CRC-32 for a slice in one call.
    #[inline]
    pub fn compute(data: &[u8]) -> u32 {
        crc32(0, data)
    }
}

impl Default for Crc32 {
    fn default() -> Self {
        Self::new()
    }
}

/// Byte-at-a-time CRC-32 on the raw register.
#[inline]
fn crc32_sw(crc: &mut u32, data: &[u8]) {
    for &byte in data {
        let index = ((*crc ^ byte as u32) & 0xFF) as usize;
        *crc = CRC32_TABLE[index] ^ (*crc >> 8);
    }
}

/// Slicing-by-8 CRC-32 on the raw register.
#[inline]
fn crc32_slice8(crc: &mut u32, data: &[u8]) {
    let mut c = *crc;
    let mut chunks = data.chunks_exact(8);

    for bytes in &mut chunks {
        let crc_xor = c ^ u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
        let b0 = (crc_xor & 0xFF) as usize;
        let b1 = ((crc_xor >> 8) & 0xFF) as usize;
        let b2 = ((crc_xor >> 16) & 0xFF) as usize;
        let b3 = ((crc_xor >> 24) & 0xFF) as usize;

        c = CRC32_TABLE_SLICE[7][b0]
            ^ CRC32_TABLE_SLICE[6][b1]
            ^ CRC32_TABLE_SLICE[5][b2]
            ^ CRC32_TABLE_SLICE[4][b3]
            ^ CRC32_TABLE_SLICE[3][bytes[4] as usize]
            ^ CRC32_TABLE_SLICE[2][bytes[5] as usize]
            ^ CRC32_TABLE_SLICE[1][bytes[6] as usize]
            ^ CRC32_TABLE_SLICE[0][bytes[7] as usize];
    }

    for &byte in chunks.remainder() {
        c = CRC32_TABLE[((c ^ byte as u32) & 0xFF) as usize] ^ (c >> 8);
    }

    *crc = c;
}
