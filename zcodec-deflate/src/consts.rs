//! Public zlib constants and option limits.
//!
//! Numeric values match zlib so that options coming from compatibility
//! callers can be passed through unchanged.

/// Smallest accepted one-shot chunk size.
pub const Z_MIN_CHUNK: usize = 64;
/// Default one-shot chunk size (16 KiB).
pub const Z_DEFAULT_CHUNK: usize = 16 * 1024;

/// Smallest window size exponent.
pub const Z_MIN_WINDOWBITS: i32 = 8;
/// Largest window size exponent.
pub const Z_MAX_WINDOWBITS: i32 = 15;
/// Default window size exponent.
pub const Z_DEFAULT_WINDOWBITS: i32 = 15;

/// Smallest hash memory level.
pub const Z_MIN_MEMLEVEL: i32 = 1;
/// Largest hash memory level.
pub const Z_MAX_MEMLEVEL: i32 = 9;
/// Default hash memory level.
pub const Z_DEFAULT_MEMLEVEL: i32 = 8;

/// Smallest level, meaning "default".
pub const Z_MIN_LEVEL: i32 = -1;
/// Largest level.
pub const Z_MAX_LEVEL: i32 = 9;
/// Level selecting the default trade-off (6).
pub const Z_DEFAULT_COMPRESSION: i32 = -1;

/// The only compression method (DEFLATE).
pub const Z_DEFLATED: i32 = 8;
