//! Adler-32 checksum (RFC 1950) used by the zlib wrapper.
//!
//! Two 16-bit sums are kept: `a` is the running byte sum plus one and `b` is
//! the running sum of `a`. Both are reduced modulo 65521 at least every
//! [`NMAX`] bytes, which is the largest run for which `b` cannot overflow
//! a `u32`.

/// Largest prime smaller than 65536.
const ADLER_MOD: u32 = 65521;

/// Largest n such that 255n(n+1)/2 + (n+1)(ADLER_MOD-1) <= 2^32-1.
const NMAX: usize = 5552;

/// Update a running Adler-32 with `data`.
///
/// Start with `1`; the returned value can be fed back in for the next chunk.
///
/// ```
/// use zcodec_core::adler32::adler32;
///
/// assert_eq!(adler32(1, b""), 1);
/// assert_eq!(adler32(1, b"Hello"), 0x058C01F5);
/// assert_eq!(adler32(adler32(1, b"Hel"), b"lo"), 0x058C01F5);
/// ```
pub fn adler32(adler: u32, data: &[u8]) -> u32 {
    let mut a = adler & 0xFFFF;
    let mut b = adler >> 16;

    let mut chunks = data.chunks_exact(NMAX);
    for chunk in &mut chunks {
        for &byte in chunk {
            a += byte as u32;
            b += a;
        }
        a %= ADLER_MOD;
        b %= ADLER_MOD;
    }

    for &byte in chunks.remainder() {
        a += byte as u32;
        b += a;
    }
    a %= ADLER_MOD;
    b %= ADLER_MOD;

    (b << 16) | a
}

/// Incremental Adler-32 calculator.
#[derive(Clone, Debug)]
pub struct Adler32 {
    value: u32,
}

impl Adler32 {
    /// Create a new Adler-32 calculator.
    pub fn new() -> Self {
        Self { value: 1 }
    }

    /// Resume from a finished checksum value.
    pub fn from_value(value: u32) -> Self {
        Self { value }
    }

    /// Update the checksum with more data.
    pub fn update(&mut self, data: &[u8]) {
        self.value = adler32(self.value, data);
    }

    /// Finalize and return the checksum.
    pub fn finish(&self) -> u32 {
        self.value
    }

    /// Compute Adler-32 checksum of data in one shot.
    pub fn checksum(data: &[u8]) -> u32 {
        adler32(1, data)
    }
}

impl Default for Adler32 {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_adler32_empty() {
        assert_eq!(Adler32::checksum(&[]), 1);
    }

    #[test]
    fn test_adler32_known_values() {
        assert_eq!(Adler32::checksum(b"Hello"), 0x058C01F5);
        assert_eq!(Adler32::checksum(b"Wikipedia"), 0x11E60398);
    }

    #[test]
    fn test_adler32_incremental() {
        let data = b"Hello, World!";
        let one_shot = Adler32::checksum(data);

        let mut adler = Adler32::new();
        adler.update(&data[..6]);
        adler.update(&data[6..]);
        assert_eq!(adler.finish(), one_shot);
    }

    #[test]
    fn test_adler32_large_runs_do_not_overflow() {
        // 0xFF bytes maximise both sums; cross several NMAX boundaries.
        let data = vec![0xFFu8; NMAX * 3 + 17];
        let whole = Adler32::checksum(&data);

        let mut a: u32 = 1;
        let mut b: u32 = 0;
        for &byte in &data {
            a = (a + byte as u32) % ADLER_MOD;
            b = (b + a) % ADLER_MOD;
        }
        assert_eq!(whole, (b << 16) | a);

        let (x, y) = data.split_at(NMAX + 1);
        assert_eq!(adler32(adler32(1, x), y), whole);
    }
}
